//! Integration tests for the collection lifecycle.
//!
//! These tests cover the path a scheduler tick takes:
//! 1. Scheduler start-once behavior
//! 2. Fetch from the (fake) upstream and store a reading
//! 3. Failed ticks are survived and store nothing
//! 4. PostgreSQL storage round trip (ignored unless DATABASE_URL is set)
//!
//! Run the database tests with: cargo test --test daemon_lifecycle -- --ignored --test-threads=1

use airmon_service::daemon::{self, Collector};
use airmon_service::db::{self, PgReadingStore};
use airmon_service::error::AirQualityError;
use airmon_service::ingest::iqair::{IqAirClient, PollutionSource};
use airmon_service::model::{Location, PollutionReading, Reading};
use airmon_service::scheduler::{Scheduler, SchedulerState, StartOutcome};
use airmon_service::store::{MemoryReadingStore, ReadingStore};
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

const PARIS: Location = Location {
    latitude: 48.856613,
    longitude: 2.352222,
};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

/// Upstream that serves a fixed sequence of (status, body) pairs, then
/// repeats the last one.
fn start_upstream(responses: Vec<(u16, &'static str)>) -> String {
    let server = tiny_http::Server::http("127.0.0.1:0").expect("bind fake upstream");
    let addr = server.server_addr().to_ip().expect("fake upstream has an IP address");

    thread::spawn(move || {
        for (i, request) in server.incoming_requests().enumerate() {
            let (status, body) = responses[i.min(responses.len() - 1)];
            let _ = request.respond(tiny_http::Response::from_string(body).with_status_code(status));
        }
    });

    format!("http://{}/v2", addr)
}

fn success_body() -> &'static str {
    r#"{"status":"success","data":{"current":{"pollution":{"ts":"2025-08-07T10:00:00.000Z","aqius":50,"mainus":"p2","aqicn":20,"maincn":"p2"}}}}"#
}

fn client(base_url: &str) -> Arc<dyn PollutionSource> {
    Arc::new(IqAirClient::new(base_url, "test-key", PARIS).unwrap())
}

/// Source whose every fetch fails, counting attempts.
struct AlwaysFailing {
    calls: Arc<AtomicUsize>,
}

impl PollutionSource for AlwaysFailing {
    fn fetch_pollution(&self, _: f64, _: f64) -> Result<PollutionReading, AirQualityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AirQualityError::Network("connection refused".to_string()))
    }

    fn fixed_location(&self) -> Location {
        PARIS
    }
}

// ---------------------------------------------------------------------------
// 1. Scheduler start-once
// ---------------------------------------------------------------------------

#[test]
fn test_starting_collection_twice_runs_one_task() {
    let scheduler = Scheduler::new("lifecycle-start-once", Duration::from_millis(100));
    let store = MemoryReadingStore::new();
    let base = start_upstream(vec![(200, success_body())]);

    let first = daemon::start_collection(
        &scheduler,
        Collector::new(client(&base), Box::new(store.clone())),
    )
    .unwrap();
    let second = daemon::start_collection(
        &scheduler,
        Collector::new(client(&base), Box::new(store.clone())),
    )
    .unwrap();

    assert_eq!(first, StartOutcome::Started);
    assert_eq!(second, StartOutcome::AlreadyRunning);
    assert_eq!(scheduler.state(), SchedulerState::Running);

    // One task fires at most once per 100 ms boundary; two tasks would
    // double both the tick count and the stored readings.
    thread::sleep(Duration::from_millis(450));
    let ticks = scheduler.tick_count();
    assert!(ticks >= 1, "task should have ticked");
    assert!(ticks <= 6, "expected a single task, saw {} ticks", ticks);
    assert!(store.len() as u64 <= ticks);
}

// ---------------------------------------------------------------------------
// 2. Fetch and store
// ---------------------------------------------------------------------------

#[test]
fn test_collect_stores_reading_from_upstream() {
    let base = start_upstream(vec![(200, success_body())]);
    let store = MemoryReadingStore::new();
    let mut collector = Collector::new(client(&base), Box::new(store.clone()));

    let reading = collector.collect().unwrap();

    assert_eq!(store.len(), 1);
    assert_eq!(reading.location, PARIS);
    assert_eq!(reading.pollution.aqius, 50);
    assert_eq!(reading.pollution.ts, Utc.with_ymd_and_hms(2025, 8, 7, 10, 0, 0).unwrap());
    assert!(reading.recorded_at > reading.pollution.ts);
}

#[test]
fn test_each_collect_appends_without_deduplication() {
    let base = start_upstream(vec![(200, success_body())]);
    let store = MemoryReadingStore::new();
    let mut collector = Collector::new(client(&base), Box::new(store.clone()));

    collector.collect().unwrap();
    collector.collect().unwrap();

    let readings = store.readings();
    assert_eq!(readings.len(), 2);
    assert_eq!(readings[0].pollution, readings[1].pollution);
}

// ---------------------------------------------------------------------------
// 3. Failure handling
// ---------------------------------------------------------------------------

#[test]
fn test_upstream_failure_stores_nothing() {
    let base = start_upstream(vec![(
        200,
        r#"{"status":"fail","data":{"message":"call_limit_reached"}}"#,
    )]);
    let store = MemoryReadingStore::new();
    let mut collector = Collector::new(client(&base), Box::new(store.clone()));

    let err = collector.collect().unwrap_err();
    assert_eq!(err.to_string(), "API Error: call_limit_reached");
    assert!(store.is_empty());
}

#[test]
fn test_collection_recovers_after_failed_tick() {
    let base = start_upstream(vec![
        (500, r#"{"message":"internal"}"#),
        (200, success_body()),
    ]);
    let store = MemoryReadingStore::new();
    let mut collector = Collector::new(client(&base), Box::new(store.clone()));

    assert!(collector.collect().is_err());
    assert!(collector.collect().is_ok());
    assert_eq!(store.len(), 1);
}

#[test]
fn test_scheduler_survives_failing_ticks() {
    let calls = Arc::new(AtomicUsize::new(0));
    let source = Arc::new(AlwaysFailing {
        calls: Arc::clone(&calls),
    });
    let store = MemoryReadingStore::new();
    let scheduler = Scheduler::new("lifecycle-failing", Duration::from_millis(50));

    daemon::start_collection(&scheduler, Collector::new(source, Box::new(store.clone()))).unwrap();
    thread::sleep(Duration::from_millis(400));

    assert!(
        calls.load(Ordering::SeqCst) >= 2,
        "schedule should keep firing after failures"
    );
    assert!(store.is_empty());
    assert_eq!(scheduler.state(), SchedulerState::Running);
}

#[test]
fn test_scheduler_survives_panicking_tick() {
    let scheduler = Scheduler::new("lifecycle-panic", Duration::from_millis(50));
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);

    scheduler
        .start(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("first tick blows up");
            }
            Ok(())
        })
        .unwrap();

    thread::sleep(Duration::from_millis(400));
    assert!(runs.load(Ordering::SeqCst) >= 2, "ticks should continue after a panic");
}

// ---------------------------------------------------------------------------
// 4. PostgreSQL storage
// ---------------------------------------------------------------------------

/// A location no real deployment tracks, so test rows are easy to clean up.
const TEST_LOCATION: Location = Location {
    latitude: -89.123456,
    longitude: 179.654321,
};

fn setup_test_store() -> (PgReadingStore, postgres::Client) {
    let mut admin = db::connect_and_prepare().expect("DATABASE_URL must point at a reachable database");
    admin
        .execute(
            "DELETE FROM air_quality.readings WHERE latitude = $1 AND longitude = $2",
            &[&TEST_LOCATION.latitude, &TEST_LOCATION.longitude],
        )
        .expect("cleanup should succeed");
    (PgReadingStore::connect().unwrap(), admin)
}

fn test_reading(hour: u32, aqius: i32, recorded_minute: i64) -> Reading {
    Reading {
        location: TEST_LOCATION,
        pollution: PollutionReading {
            ts: Utc.with_ymd_and_hms(2025, 8, 7, hour, 0, 0).unwrap(),
            aqius,
            mainus: "p2".to_string(),
            aqicn: aqius / 2,
            maincn: "p1".to_string(),
        },
        recorded_at: Utc.with_ymd_and_hms(2025, 8, 7, 18, 0, 0).unwrap()
            + ChronoDuration::minutes(recorded_minute),
    }
}

#[test]
#[ignore] // Only run when database is available
fn test_pg_store_empty_location_is_none() {
    let (mut store, _admin) = setup_test_store();
    assert!(store.most_polluted(TEST_LOCATION).unwrap().is_none());
}

#[test]
#[ignore] // Only run when database is available
fn test_pg_store_most_polluted_round_trip() {
    let (mut store, _admin) = setup_test_store();

    store.insert(&test_reading(10, 50, 0)).unwrap();
    store.insert(&test_reading(15, 80, 1)).unwrap();

    let most = store.most_polluted(TEST_LOCATION).unwrap().unwrap();
    assert_eq!(most, test_reading(15, 80, 1));
}

#[test]
#[ignore] // Only run when database is available
fn test_pg_store_tie_break_prefers_latest_recorded() {
    let (mut store, _admin) = setup_test_store();

    store.insert(&test_reading(9, 70, 5)).unwrap();
    store.insert(&test_reading(12, 70, 9)).unwrap();
    store.insert(&test_reading(14, 70, 7)).unwrap();

    let most = store.most_polluted(TEST_LOCATION).unwrap().unwrap();
    assert_eq!(most.pollution.ts, Utc.with_ymd_and_hms(2025, 8, 7, 12, 0, 0).unwrap());
}
