//! Reading store: append-only persistence of air quality readings.
//!
//! Two implementations:
//! - `db::PgReadingStore` — PostgreSQL, used by the running service
//! - `MemoryReadingStore` — process-local, used by tests and `--memory` runs

use crate::error::AirQualityError;
use crate::model::{Location, Reading};
use std::cmp::Ordering;
use std::sync::{Arc, Mutex};

pub trait ReadingStore: Send {
    /// Appends one reading.
    fn insert(&mut self, reading: &Reading) -> Result<(), AirQualityError>;

    /// The reading with the highest `aqius` whose location matches exactly.
    ///
    /// Ties go to the most recent `recorded_at`, then the most recent
    /// observation time. `Ok(None)` when nothing matches.
    fn most_polluted(&mut self, location: Location) -> Result<Option<Reading>, AirQualityError>;
}

/// Total order used to pick the most polluted reading: the greatest
/// element under this ordering wins.
pub fn pollution_order(a: &Reading, b: &Reading) -> Ordering {
    a.pollution
        .aqius
        .cmp(&b.pollution.aqius)
        .then(a.recorded_at.cmp(&b.recorded_at))
        .then(a.pollution.ts.cmp(&b.pollution.ts))
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Vec-backed store. Clones share the same readings, so one clone can be
/// handed to the collector and another to the query service.
#[derive(Debug, Clone, Default)]
pub struct MemoryReadingStore {
    readings: Arc<Mutex<Vec<Reading>>>,
}

impl MemoryReadingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything stored so far, in insertion order.
    pub fn readings(&self) -> Vec<Reading> {
        self.readings
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.readings.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ReadingStore for MemoryReadingStore {
    fn insert(&mut self, reading: &Reading) -> Result<(), AirQualityError> {
        let mut readings = self
            .readings
            .lock()
            .map_err(|_| AirQualityError::Storage("reading store lock poisoned".to_string()))?;
        readings.push(reading.clone());
        Ok(())
    }

    fn most_polluted(&mut self, location: Location) -> Result<Option<Reading>, AirQualityError> {
        let readings = self
            .readings
            .lock()
            .map_err(|_| AirQualityError::Storage("reading store lock poisoned".to_string()))?;

        Ok(readings
            .iter()
            .filter(|r| r.location == location)
            .max_by(|a, b| pollution_order(a, b))
            .cloned())
    }
}
