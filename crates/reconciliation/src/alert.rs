//! Alert sink trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::StreamId;
use domain::returns::ReturnStatus;
use domain::shipment::ShipmentStatus;

use serde::Serialize;

use crate::error::ReconciliationError;

/// An alert raised by the reconciliation scanner.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SlaAlert {
    /// A shipment has had no tracking activity for too long.
    StaleShipment {
        shipment_id: StreamId,
        tracking_number: String,
        status: ShipmentStatus,
        last_updated: DateTime<Utc>,
    },

    /// A shipment is past its estimated delivery without a terminal status.
    OverdueShipment {
        shipment_id: StreamId,
        tracking_number: String,
        status: ShipmentStatus,
        estimated_delivery: DateTime<Utc>,
    },

    /// A return has had no status activity for too long.
    StaleReturn {
        return_id: StreamId,
        return_code: String,
        status: ReturnStatus,
        last_updated: DateTime<Utc>,
    },
}

impl SlaAlert {
    /// Returns the alert kind as a string, for logging and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            SlaAlert::StaleShipment { .. } => "stale_shipment",
            SlaAlert::OverdueShipment { .. } => "overdue_shipment",
            SlaAlert::StaleReturn { .. } => "stale_return",
        }
    }
}

/// Trait for delivering SLA alerts to an operations channel.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Delivers a single alert.
    async fn send(&self, alert: SlaAlert) -> Result<(), ReconciliationError>;
}

#[derive(Debug, Default)]
struct InMemoryAlertState {
    alerts: Vec<SlaAlert>,
    fail_on_send: bool,
}

/// In-memory alert sink for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAlertSink {
    state: Arc<RwLock<InMemoryAlertState>>,
}

impl InMemoryAlertSink {
    /// Creates a new in-memory alert sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the sink to fail on the next send call.
    pub fn set_fail_on_send(&self, fail: bool) {
        self.state.write().unwrap().fail_on_send = fail;
    }

    /// Returns the number of alerts received.
    pub fn alert_count(&self) -> usize {
        self.state.read().unwrap().alerts.len()
    }

    /// Returns a copy of all received alerts.
    pub fn alerts(&self) -> Vec<SlaAlert> {
        self.state.read().unwrap().alerts.clone()
    }
}

#[async_trait]
impl AlertSink for InMemoryAlertSink {
    async fn send(&self, alert: SlaAlert) -> Result<(), ReconciliationError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_send {
            return Err(ReconciliationError::AlertSink(
                "Alert channel unavailable".to_string(),
            ));
        }

        state.alerts.push(alert);
        Ok(())
    }
}
