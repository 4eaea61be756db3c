use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

/// One timed pipeline step, as handed to a metrics provider
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    /// `{bucket}{StepName}`, e.g. `swapPrepareTx`
    pub label: String,
    pub duration: Duration,
    /// The step's error message when it failed
    pub error: Option<String>,
}

impl MetricSample {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    StepSucceeded,
    StepFailed,
}

/// Telemetry event as the backend stores it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastEvent {
    pub time: DateTime<Utc>,
    pub session_id: Uuid,
    pub event_type: EventType,
    pub label: String,
    pub duration_ms: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BroadcastEvent {
    pub fn from_sample(session_id: Uuid, sample: &MetricSample) -> Self {
        Self {
            time: Utc::now(),
            session_id,
            event_type: if sample.succeeded() {
                EventType::StepSucceeded
            } else {
                EventType::StepFailed
            },
            label: sample.label.clone(),
            duration_ms: sample.duration.as_millis() as u64,
            error: sample.error.clone(),
        }
    }
}

/// Batch of telemetry events for sending
#[derive(Debug, Serialize, Deserialize)]
pub struct TelemetryBatch {
    pub events: Vec<BroadcastEvent>,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelStats {
    pub calls: u64,
    pub failures: u64,
    pub total_duration_ms: u64,
}

impl LabelStats {
    pub fn average_duration_ms(&self) -> u64 {
        if self.calls == 0 {
            0
        } else {
            self.total_duration_ms / self.calls
        }
    }
}

/// Running totals per label since the provider was created
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BroadcastStats {
    pub labels: BTreeMap<String, LabelStats>,
}
