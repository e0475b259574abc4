//! SLA scanner over the tracking ledger.

use chrono::{DateTime, Duration, Utc};
use ledger::Ledger;

use domain::returns::ReturnService;
use domain::shipment::ShipmentService;

use crate::Result;
use crate::alert::{AlertSink, SlaAlert};

/// Thresholds for the reconciliation scan.
#[derive(Debug, Clone)]
pub struct SlaConfig {
    /// How long a non-terminal stream may go without activity before it
    /// is flagged as stale.
    pub stale_after: Duration,
}

impl Default for SlaConfig {
    fn default() -> Self {
        Self {
            stale_after: Duration::hours(24),
        }
    }
}

/// Outcome of one reconciliation scan.
#[derive(Debug, Default)]
pub struct ReconciliationReport {
    /// Shipments with no tracking activity past the threshold.
    pub stale_shipments: Vec<SlaAlert>,

    /// Shipments past their estimated delivery without a terminal status.
    pub overdue_shipments: Vec<SlaAlert>,

    /// Returns with no status activity past the threshold.
    pub stale_returns: Vec<SlaAlert>,
}

impl ReconciliationReport {
    /// Total number of alerts across all categories.
    pub fn total_alerts(&self) -> usize {
        self.stale_shipments.len() + self.overdue_shipments.len() + self.stale_returns.len()
    }

    /// Returns true if the scan found nothing to flag.
    pub fn is_clean(&self) -> bool {
        self.total_alerts() == 0
    }

    /// Iterates over all alerts across the categories.
    pub fn alerts(&self) -> impl Iterator<Item = &SlaAlert> {
        self.stale_shipments
            .iter()
            .chain(&self.overdue_shipments)
            .chain(&self.stale_returns)
    }
}

/// Scans the ledger for shipments and returns that have fallen out of
/// their service-level window.
///
/// The scanner is read-only: it replays streams, compares their derived
/// state against the thresholds, and reports. Acting on the alerts is the
/// operator's job.
pub struct ReconciliationScanner<L: Ledger + Clone> {
    shipments: ShipmentService<L>,
    returns: ReturnService<L>,
    config: SlaConfig,
}

impl<L: Ledger + Clone> ReconciliationScanner<L> {
    /// Creates a new scanner over the given ledger.
    pub fn new(ledger: L, config: SlaConfig) -> Self {
        Self {
            shipments: ShipmentService::new(ledger.clone()),
            returns: ReturnService::new(ledger),
            config,
        }
    }

    /// Scans all streams and reports SLA breaches as of `now`.
    #[tracing::instrument(skip(self))]
    pub async fn scan(&self, now: DateTime<Utc>) -> Result<ReconciliationReport> {
        let mut report = ReconciliationReport::default();

        let created = self
            .shipments
            .handler()
            .ledger()
            .entries_by_type("ShipmentCreated")
            .await?;

        for entry in created {
            let Some(shipment) = self.shipments.get_shipment(entry.stream_id).await? else {
                continue;
            };
            if !shipment.is_active() {
                continue;
            }

            if let Some(eta) = shipment.estimated_delivery()
                && eta < now
            {
                report.overdue_shipments.push(SlaAlert::OverdueShipment {
                    shipment_id: entry.stream_id,
                    tracking_number: shipment.tracking_number().to_string(),
                    status: shipment.status(),
                    estimated_delivery: eta,
                });
            }

            if let Some(last_updated) = shipment.last_updated()
                && now - last_updated > self.config.stale_after
            {
                report.stale_shipments.push(SlaAlert::StaleShipment {
                    shipment_id: entry.stream_id,
                    tracking_number: shipment.tracking_number().to_string(),
                    status: shipment.status(),
                    last_updated,
                });
            }
        }

        let requested = self
            .returns
            .handler()
            .ledger()
            .entries_by_type("ReturnRequested")
            .await?;

        for entry in requested {
            let Some(ret) = self.returns.get_return(entry.stream_id).await? else {
                continue;
            };
            if !ret.is_open() {
                continue;
            }

            if let Some(last_updated) = ret.last_updated()
                && now - last_updated > self.config.stale_after
            {
                report.stale_returns.push(SlaAlert::StaleReturn {
                    return_id: entry.stream_id,
                    return_code: ret.return_code().to_string(),
                    status: ret.status(),
                    last_updated,
                });
            }
        }

        tracing::info!(
            stale_shipments = report.stale_shipments.len(),
            overdue_shipments = report.overdue_shipments.len(),
            stale_returns = report.stale_returns.len(),
            "reconciliation scan complete"
        );

        Ok(report)
    }

    /// Scans and delivers every alert to the sink.
    #[tracing::instrument(skip(self, sink))]
    pub async fn run(
        &self,
        sink: &dyn AlertSink,
        now: DateTime<Utc>,
    ) -> Result<ReconciliationReport> {
        let report = self.scan(now).await?;

        for alert in report.alerts() {
            metrics::counter!("reconciliation_alerts", "kind" => alert.kind()).increment(1);
            sink.send(alert.clone()).await?;
        }

        Ok(report)
    }
}
