use anyhow::Result;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::{debug, warn};

use super::types::*;

/// Posts event batches to the telemetry backend
pub struct TelemetryReporter {
    client: Client,
    endpoint: String,
}

impl TelemetryReporter {
    pub fn new(endpoint: String, timeout_secs: u64) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self { client, endpoint })
    }

    /// Send a batch. Returns whether the backend accepted it; delivery problems
    /// are logged and never surface as errors.
    pub async fn send_batch(&self, events: Vec<BroadcastEvent>) -> bool {
        if events.is_empty() {
            return true;
        }

        debug!("Sending telemetry batch of {} events", events.len());

        let batch = TelemetryBatch {
            events,
            version: env!("CARGO_PKG_VERSION").to_string(),
        };

        match self.client.post(&self.endpoint).json(&batch).send().await {
            Ok(resp) if resp.status().is_success() => {
                debug!("Telemetry batch sent successfully");
                true
            }
            Ok(resp) => {
                warn!("Telemetry backend returned error: {}", resp.status());
                false
            }
            Err(e) => {
                warn!("Failed to send telemetry: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_unreachable_backend_is_not_an_error() {
        let reporter = TelemetryReporter::new("http://127.0.0.1:9/telemetry".to_string(), 1).unwrap();
        let sample = MetricSample {
            label: "txBroadcastTx".to_string(),
            duration: Duration::from_millis(5),
            error: None,
        };
        let sent = reporter
            .send_batch(vec![BroadcastEvent::from_sample(Uuid::new_v4(), &sample)])
            .await;
        assert!(!sent);
        assert!(reporter.send_batch(vec![]).await);
    }
}
