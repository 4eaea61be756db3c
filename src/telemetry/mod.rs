//! Metrics around pipeline steps.
//!
//! [`send_and_record`] times a step and hands the outcome to a
//! [`MetricsProvider`]; the step's own result is returned untouched.
//! [`NoopMetrics`] turns it into a plain `.await`.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use uuid::Uuid;

pub mod collector;
pub mod reporter;
pub mod types;

use collector::TelemetryCollector;
use reporter::TelemetryReporter;
pub use types::{BroadcastEvent, BroadcastStats, LabelStats, MetricSample};

#[async_trait]
pub trait MetricsProvider: Send + Sync {
    /// Whether samples are wanted at all
    fn enabled(&self) -> bool {
        true
    }

    /// Take one sample. Must not fail and should return quickly.
    async fn record(&self, sample: MetricSample);
}

/// Records nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

#[async_trait]
impl MetricsProvider for NoopMetrics {
    fn enabled(&self) -> bool {
        false
    }

    async fn record(&self, _sample: MetricSample) {}
}

/// Await `operation`, recording its duration and outcome under `label`.
/// The result (value or error) is passed through as is.
pub async fn send_and_record<T, E, F>(metrics: &dyn MetricsProvider, label: &str, operation: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    if !metrics.enabled() {
        return operation.await;
    }

    let started = Instant::now();
    let result = operation.await;
    metrics
        .record(MetricSample {
            label: label.to_string(),
            duration: started.elapsed(),
            error: result.as_ref().err().map(|e| e.to_string()),
        })
        .await;
    result
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub batch_size: usize,
    pub flush_interval_secs: u64,
    pub timeout_secs: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "http://localhost:8080/api/telemetry".to_string(),
            batch_size: 100,
            flush_interval_secs: 30,
            timeout_secs: 10,
        }
    }
}

/// Metrics provider that keeps per-label totals and, when configured, ships
/// events to a telemetry backend in batches
pub struct TelemetryMetrics {
    session_id: Uuid,
    collector: Arc<TelemetryCollector>,
    reporter: Option<Arc<TelemetryReporter>>,
    config: TelemetryConfig,
}

impl TelemetryMetrics {
    pub fn new(config: TelemetryConfig) -> Result<Self> {
        let reporter = if config.enabled {
            Some(Arc::new(TelemetryReporter::new(
                config.endpoint.clone(),
                config.timeout_secs,
            )?))
        } else {
            None
        };

        Ok(Self {
            session_id: Uuid::new_v4(),
            collector: Arc::new(TelemetryCollector::new()),
            reporter,
            config,
        })
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Start the periodic batch reporter. Returns `None` when reporting is off.
    pub fn start(&self) -> Option<JoinHandle<()>> {
        let reporter = self.reporter.clone()?;
        tracing::info!("Starting telemetry reporting for session {}", self.session_id);

        let collector = self.collector.clone();
        let interval_secs = self.config.flush_interval_secs.max(1);
        let batch_size = self.config.batch_size;

        Some(tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(interval_secs));
            loop {
                interval.tick().await;
                let events = collector.get_pending_events(batch_size).await;
                if !events.is_empty() {
                    reporter.send_batch(events).await;
                }
            }
        }))
    }

    /// Send everything still pending
    pub async fn flush(&self) {
        let Some(reporter) = &self.reporter else {
            return;
        };
        loop {
            let events = self.collector.get_pending_events(self.config.batch_size.max(1)).await;
            if events.is_empty() || !reporter.send_batch(events).await {
                break;
            }
        }
    }

    pub async fn stats(&self) -> BroadcastStats {
        self.collector.get_current_stats().await
    }
}

#[async_trait]
impl MetricsProvider for TelemetryMetrics {
    async fn record(&self, sample: MetricSample) {
        tracing::debug!(
            "{} took {}ms ({})",
            sample.label,
            sample.duration.as_millis(),
            if sample.succeeded() { "ok" } else { "failed" }
        );
        self.collector
            .add_event(BroadcastEvent::from_sample(self.session_id, &sample))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BroadcastError;

    #[tokio::test]
    async fn test_decorator_is_transparent_for_values_and_errors() {
        let telemetry = TelemetryMetrics::new(TelemetryConfig::default()).unwrap();
        let providers: [&dyn MetricsProvider; 2] = [&NoopMetrics, &telemetry];

        for metrics in providers {
            let ok: Result<u32, BroadcastError> = send_and_record(metrics, "txPrepareTx", async { Ok(7) }).await;
            assert_eq!(ok, Ok(7));

            let err = BroadcastError::SigningRejected("user cancelled".to_string());
            let failed: Result<u32, BroadcastError> =
                send_and_record(metrics, "txSignTx", async { Err(err.clone()) }).await;
            assert_eq!(failed, Err(err));
        }
    }

    #[tokio::test]
    async fn test_telemetry_records_each_step() {
        let telemetry = TelemetryMetrics::new(TelemetryConfig::default()).unwrap();
        let _: Result<(), BroadcastError> = send_and_record(&telemetry, "swapPrepareTx", async { Ok(()) }).await;
        let _: Result<(), BroadcastError> = send_and_record(&telemetry, "swapSignTx", async {
            Err(BroadcastError::SigningRejected("no".to_string()))
        })
        .await;

        let stats = telemetry.stats().await;
        assert_eq!(stats.labels["swapPrepareTx"].calls, 1);
        assert_eq!(stats.labels["swapSignTx"].failures, 1);
    }

    #[test]
    fn test_disabled_reporting_does_not_start() {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        runtime.block_on(async {
            let telemetry = TelemetryMetrics::new(TelemetryConfig::default()).unwrap();
            assert!(telemetry.start().is_none());
        });
    }
}
