//! Collection job: the work done on every scheduler tick.
//!
//! Each tick:
//! 1. Fetches current pollution for the fixed location from the source
//! 2. Stamps it into a `Reading` with the insertion time
//! 3. Appends it to the reading store
//!
//! A failed tick stores nothing. The scheduler logs the error and keeps
//! the schedule alive.

use crate::error::AirQualityError;
use crate::ingest::iqair::PollutionSource;
use crate::model::Reading;
use crate::scheduler::{Scheduler, StartOutcome};
use crate::store::ReadingStore;
use std::sync::Arc;

pub struct Collector {
    source: Arc<dyn PollutionSource>,
    store: Box<dyn ReadingStore>,
}

impl Collector {
    pub fn new(source: Arc<dyn PollutionSource>, store: Box<dyn ReadingStore>) -> Self {
        Self { source, store }
    }

    /// Runs one fetch-and-store cycle, returning the stored reading.
    pub fn collect(&mut self) -> Result<Reading, AirQualityError> {
        let pollution = self.source.fetch_for_fixed_location()?;
        let reading = Reading::new(self.source.fixed_location(), pollution);
        self.store.insert(&reading)?;

        tracing::info!(
            aqius = reading.pollution.aqius,
            mainus = %reading.pollution.mainus,
            observed_at = %reading.pollution.ts,
            "air quality reading saved"
        );

        Ok(reading)
    }
}

/// Hands the collector to the scheduler as its recurring job.
pub fn start_collection(
    scheduler: &Scheduler,
    mut collector: Collector,
) -> std::io::Result<StartOutcome> {
    scheduler.start(move || {
        tracing::debug!("checking air quality for fixed location");
        collector.collect().map(|_| ())
    })
}
