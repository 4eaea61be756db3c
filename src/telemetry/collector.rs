use std::collections::VecDeque;
use tokio::sync::RwLock;

use super::types::*;

/// Oldest events are dropped past this many pending
const MAX_PENDING_EVENTS: usize = 10_000;

/// Queues events for the reporter and keeps per-label totals
pub struct TelemetryCollector {
    events: RwLock<VecDeque<BroadcastEvent>>,
    stats: RwLock<BroadcastStats>,
}

impl TelemetryCollector {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(VecDeque::with_capacity(1024)),
            stats: RwLock::new(BroadcastStats::default()),
        }
    }

    pub async fn add_event(&self, event: BroadcastEvent) {
        {
            let mut stats = self.stats.write().await;
            let entry = stats.labels.entry(event.label.clone()).or_default();
            entry.calls += 1;
            entry.total_duration_ms += event.duration_ms;
            if event.event_type == EventType::StepFailed {
                entry.failures += 1;
            }
        }

        let mut events = self.events.write().await;
        if events.len() >= MAX_PENDING_EVENTS {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// Take up to `batch_size` of the oldest pending events
    pub async fn get_pending_events(&self, batch_size: usize) -> Vec<BroadcastEvent> {
        let mut events = self.events.write().await;
        let count = batch_size.min(events.len());
        events.drain(..count).collect()
    }

    pub async fn pending_count(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn get_current_stats(&self) -> BroadcastStats {
        self.stats.read().await.clone()
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use uuid::Uuid;

    fn event(label: &str, error: Option<&str>) -> BroadcastEvent {
        let sample = MetricSample {
            label: label.to_string(),
            duration: Duration::from_millis(40),
            error: error.map(str::to_string),
        };
        BroadcastEvent::from_sample(Uuid::new_v4(), &sample)
    }

    #[tokio::test]
    async fn test_stats_accumulate_per_label() {
        let collector = TelemetryCollector::new();
        collector.add_event(event("swapPrepareTx", None)).await;
        collector.add_event(event("swapPrepareTx", Some("boom"))).await;
        collector.add_event(event("swapSignTx", None)).await;

        let stats = collector.get_current_stats().await;
        let prepare = &stats.labels["swapPrepareTx"];
        assert_eq!(prepare.calls, 2);
        assert_eq!(prepare.failures, 1);
        assert_eq!(prepare.average_duration_ms(), 40);
        assert_eq!(stats.labels["swapSignTx"].failures, 0);
    }

    #[tokio::test]
    async fn test_pending_events_drain_in_order() {
        let collector = TelemetryCollector::new();
        for label in ["a", "b", "c"] {
            collector.add_event(event(label, None)).await;
        }

        let batch = collector.get_pending_events(2).await;
        assert_eq!(batch.iter().map(|e| e.label.as_str()).collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(collector.pending_count().await, 1);
        assert_eq!(collector.get_pending_events(10).await.len(), 1);
        assert!(collector.get_pending_events(10).await.is_empty());
    }
}
