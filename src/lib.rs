//! airmon_service: fixed-location air quality polling and query service.
//!
//! # Module structure
//!
//! ```text
//! airmon_service
//! ├── model      — shared data types (Location, PollutionReading, Reading, …)
//! ├── error      — AirQualityError taxonomy and its HTTP status mapping
//! ├── config     — airmon.toml + environment configuration
//! ├── logging    — tracing subscriber setup
//! ├── ingest
//! │   ├── iqair  — IQAir nearest_city client: URL construction + JSON parsing
//! │   └── fixtures (test only) — representative API response payloads
//! ├── store      — ReadingStore trait + in-memory implementation
//! ├── db         — PostgreSQL connection, schema bootstrap, PgReadingStore
//! ├── scheduler  — start-once recurring task runner
//! ├── daemon     — per-tick fetch-and-store collector
//! ├── service    — read-side query operations
//! └── endpoint   — HTTP routing and JSON responses
//! ```

pub mod config;
pub mod daemon;
pub mod db;
pub mod endpoint;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod scheduler;
pub mod service;
pub mod store;

pub use error::AirQualityError;
