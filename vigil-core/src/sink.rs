//! Metric sinks: where checks push gauges, service checks and warnings.

use crate::ServiceCheckStatus;
use parking_lot::RwLock;
use std::sync::Arc;

/// Destination for everything a check reports.
///
/// The agent's aggregator implements this trait; checks never talk to the
/// aggregator directly.
pub trait MetricSink: Send + Sync {
    /// Submit a gauge value
    fn emit_metric(&self, name: &str, value: f64, tags: &[String]);

    /// Submit a service check status
    fn emit_service_check(&self, name: &str, status: ServiceCheckStatus, tags: &[String]);

    /// Surface a warning for the current check run
    fn emit_warning(&self, message: &str);
}

/// A gauge recorded by [`InMemorySink`]
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub name: String,
    pub value: f64,
    pub tags: Vec<String>,
}

/// A service check recorded by [`InMemorySink`]
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceCheckSample {
    pub name: String,
    pub status: ServiceCheckStatus,
    pub tags: Vec<String>,
}

#[derive(Debug, Default)]
struct Recorded {
    metrics: Vec<MetricSample>,
    service_checks: Vec<ServiceCheckSample>,
    warnings: Vec<String>,
}

/// Sink that keeps every submission in memory.
///
/// Suitable for tests and for embedding a check where submissions are
/// drained and forwarded in batches. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct InMemorySink {
    recorded: Arc<RwLock<Recorded>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metrics(&self) -> Vec<MetricSample> {
        self.recorded.read().metrics.clone()
    }

    pub fn service_checks(&self) -> Vec<ServiceCheckSample> {
        self.recorded.read().service_checks.clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.recorded.read().warnings.clone()
    }

    /// All gauges submitted under `name`, in submission order
    pub fn metrics_named(&self, name: &str) -> Vec<MetricSample> {
        self.recorded
            .read()
            .metrics
            .iter()
            .filter(|sample| sample.name == name)
            .cloned()
            .collect()
    }

    /// All service checks submitted under `name`, in submission order
    pub fn service_checks_named(&self, name: &str) -> Vec<ServiceCheckSample> {
        self.recorded
            .read()
            .service_checks
            .iter()
            .filter(|sample| sample.name == name)
            .cloned()
            .collect()
    }

    /// Whether nothing at all was submitted
    pub fn is_empty(&self) -> bool {
        let recorded = self.recorded.read();
        recorded.metrics.is_empty()
            && recorded.service_checks.is_empty()
            && recorded.warnings.is_empty()
    }

    /// Drop everything recorded so far
    pub fn reset(&self) {
        *self.recorded.write() = Recorded::default();
    }
}

impl MetricSink for InMemorySink {
    fn emit_metric(&self, name: &str, value: f64, tags: &[String]) {
        self.recorded.write().metrics.push(MetricSample {
            name: name.to_string(),
            value,
            tags: tags.to_vec(),
        });
    }

    fn emit_service_check(&self, name: &str, status: ServiceCheckStatus, tags: &[String]) {
        self.recorded.write().service_checks.push(ServiceCheckSample {
            name: name.to_string(),
            status,
            tags: tags.to_vec(),
        });
    }

    fn emit_warning(&self, message: &str) {
        self.recorded.write().warnings.push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_sink_records_submissions() {
        let sink = InMemorySink::new();
        assert!(sink.is_empty());

        let tags = vec!["env:test".to_string()];
        sink.emit_metric("base.gauge", 4.0, &tags);
        sink.emit_service_check("base.status", ServiceCheckStatus::Ok, &tags);
        sink.emit_warning("something odd");

        assert_eq!(sink.metrics_named("base.gauge")[0].value, 4.0);
        assert_eq!(sink.metrics_named("base.gauge")[0].tags, tags);
        assert_eq!(
            sink.service_checks_named("base.status")[0].status,
            ServiceCheckStatus::Ok
        );
        assert_eq!(sink.warnings(), vec!["something odd".to_string()]);
    }

    #[test]
    fn test_clones_share_storage() {
        let sink = InMemorySink::new();
        let handle = sink.clone();

        handle.emit_warning("from clone");
        assert_eq!(sink.warnings().len(), 1);

        sink.reset();
        assert!(handle.is_empty());
    }
}
