//! Projection processor for feeding ledger entries to projections.

use futures_util::StreamExt;
use ledger::{Ledger, LedgerEntry};
use tokio::sync::Mutex;

use crate::Result;
use crate::projection::Projection;

/// Processes entries from the tracking ledger and delivers them to
/// projections.
///
/// The processor supports:
/// - Catch-up: replays all entries from the ledger to bring projections up to date
/// - Single entry delivery: delivers a new entry to all projections
/// - Rebuild: resets all projections and replays from scratch
///
/// Catch-up and rebuild are serialized internally: position reads and
/// entry delivery span awaits, so overlapping passes would over-advance
/// positions and skip entries.
pub struct ProjectionProcessor<L: Ledger> {
    ledger: L,
    projections: Vec<Box<dyn Projection>>,
    catch_up_lock: Mutex<()>,
}

impl<L: Ledger> ProjectionProcessor<L> {
    /// Creates a new processor with the given ledger.
    pub fn new(ledger: L) -> Self {
        Self {
            ledger,
            projections: Vec::new(),
            catch_up_lock: Mutex::new(()),
        }
    }

    /// Registers a projection with this processor.
    pub fn register(&mut self, projection: Box<dyn Projection>) {
        self.projections.push(projection);
    }

    /// Returns the number of registered projections.
    pub fn projection_count(&self) -> usize {
        self.projections.len()
    }

    /// Runs catch-up processing: streams all entries from the ledger and
    /// delivers them to each projection that hasn't already seen them.
    ///
    /// Concurrent callers queue behind one another; each pass sees the
    /// positions the previous pass left behind.
    #[tracing::instrument(skip(self))]
    pub async fn run_catch_up(&self) -> Result<()> {
        let _guard = self.catch_up_lock.lock().await;
        self.catch_up_locked().await
    }

    async fn catch_up_locked(&self) -> Result<()> {
        let mut stream = self.ledger.stream_all_entries().await?;
        let mut entry_index: u64 = 0;

        while let Some(result) = stream.next().await {
            let entry = result?;
            entry_index += 1;

            for projection in &self.projections {
                let pos = projection.position().await;
                if pos.entries_processed < entry_index {
                    projection.handle(&entry).await?;
                    metrics::counter!("projections_entries_processed").increment(1);
                }
            }
        }

        tracing::info!(entries_processed = entry_index, "catch-up complete");

        Ok(())
    }

    /// Delivers a single entry to all registered projections.
    #[tracing::instrument(skip(self, entry), fields(entry_type = %entry.entry_type))]
    pub async fn process_entry(&self, entry: &LedgerEntry) -> Result<()> {
        for projection in &self.projections {
            projection.handle(entry).await?;
        }
        Ok(())
    }

    /// Resets all projections and replays all entries from the ledger.
    ///
    /// Holds the catch-up lock across the reset so a concurrent catch-up
    /// cannot observe half-reset positions.
    #[tracing::instrument(skip(self))]
    pub async fn rebuild_all(&self) -> Result<()> {
        let _guard = self.catch_up_lock.lock().await;
        for projection in &self.projections {
            projection.reset().await?;
        }
        self.catch_up_locked().await
    }
}
