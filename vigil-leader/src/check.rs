//! Leader election status check.
//!
//! Each cycle reads the election record, validates it and reports:
//! - `<namespace>.leader_election.transitions` (gauge)
//! - `<namespace>.leader_election.lease_duration` (gauge)
//! - `<namespace>.leader_election.status` (service check): `OK` when this
//!   instance holds the lock, `CRITICAL` otherwise
//!
//! A missing or invalid record produces a single warning and nothing else.

use crate::{ElectionRecord, LeaderCheckConfig, LeaderError, LeaderResult, RecordSource};
use async_trait::async_trait;
use tracing::{debug, warn};
use vigil_core::tags::{tag, with_custom_tags};
use vigil_core::{AgentCheck, MetricSink, ServiceCheckStatus};

/// What one cycle of the check ended up reporting
#[derive(Debug, Clone, PartialEq)]
pub enum ElectionOutcome {
    /// No record stored on the object; a warning was emitted
    MissingRecord,

    /// The record could not be used; a warning carrying `reason` was emitted
    InvalidRecord { reason: String },

    /// Metrics and the service check were emitted
    Reported {
        status: ServiceCheckStatus,
        leader: String,
    },
}

/// Reports leader election health for one record.
pub struct LeaderElectionCheck<S> {
    config: LeaderCheckConfig,
    source: S,
    identity: Option<String>,
    prefix: String,
}

impl<S: RecordSource> LeaderElectionCheck<S> {
    /// Create a check for a validated instance configuration
    pub fn new(config: LeaderCheckConfig, source: S) -> LeaderResult<Self> {
        config.validate()?;
        let identity = config.resolve_identity();
        let prefix = format!("{}.leader_election", config.namespace);

        Ok(Self {
            config,
            source,
            identity,
            prefix,
        })
    }

    pub fn config(&self) -> &LeaderCheckConfig {
        &self.config
    }

    /// Run one cycle: fetch, validate, report
    pub async fn check_election_status(
        &self,
        sink: &dyn MetricSink,
    ) -> LeaderResult<ElectionOutcome> {
        let kind = self.config.kind()?;
        let name = &self.config.record_name;
        let namespace = &self.config.record_namespace;

        let raw = match self.source.read_raw_record(kind, name, namespace).await? {
            Some(raw) => raw,
            None => {
                let message = format!(
                    "Cannot find the leader election record in {} {}/{}",
                    kind, namespace, name
                );
                warn!("{}", message);
                sink.emit_warning(&message);
                return Ok(ElectionOutcome::MissingRecord);
            }
        };

        let record = match ElectionRecord::parse(&raw) {
            Ok(record) => record,
            Err(e) => return Ok(self.reject(sink, e.to_string())),
        };
        if let Err(reason) = record.validate() {
            return Ok(self.reject(sink, reason.to_string()));
        }

        Ok(self.report(sink, &record))
    }

    fn reject(&self, sink: &dyn MetricSink, reason: String) -> ElectionOutcome {
        warn!(
            "Leader election record {}/{} is unusable: {}",
            self.config.record_namespace, self.config.record_name, reason
        );
        sink.emit_warning(&reason);
        ElectionOutcome::InvalidRecord { reason }
    }

    fn report(&self, sink: &dyn MetricSink, record: &ElectionRecord) -> ElectionOutcome {
        let tags = self.tags();
        let leader = record.leader_name().unwrap_or_default().to_string();

        sink.emit_metric(
            &format!("{}.transitions", self.prefix),
            record.transitions() as f64,
            &tags,
        );
        if let Some(lease) = record.lease_duration() {
            sink.emit_metric(&format!("{}.lease_duration", self.prefix), lease as f64, &tags);
        }

        let status = if self.identity.as_deref() == Some(leader.as_str()) {
            ServiceCheckStatus::Ok
        } else {
            ServiceCheckStatus::Critical
        };
        sink.emit_service_check(&format!("{}.status", self.prefix), status, &tags);

        debug!(
            "{} (seconds until renew: {:?}, status: {})",
            record.summary(),
            record.seconds_until_renew(),
            status
        );

        ElectionOutcome::Reported { status, leader }
    }

    fn tags(&self) -> Vec<String> {
        with_custom_tags(
            vec![
                tag("record_kind", &self.config.record_kind),
                tag("record_name", &self.config.record_name),
                tag("record_namespace", &self.config.record_namespace),
            ],
            &self.config.tags,
        )
    }
}

#[async_trait]
impl<S: RecordSource> AgentCheck for LeaderElectionCheck<S> {
    type Error = LeaderError;

    fn name(&self) -> &str {
        &self.prefix
    }

    async fn check(&self, sink: &dyn MetricSink) -> LeaderResult<()> {
        self.check_election_status(sink).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InMemoryRecordSource, RecordKind};
    use vigil_core::InMemorySink;

    const RAW_VALID_RECORD: &str = r#"{"holderIdentity":"leader-0","leaseDurationSeconds":15,"acquireTime":"2018-12-17T11:53:07Z","renewTime":"2018-12-18T12:32:22Z"}"#;

    fn check_for(identity: &str) -> (LeaderElectionCheck<InMemoryRecordSource>, InMemoryRecordSource) {
        let source = InMemoryRecordSource::new();
        let config = LeaderCheckConfig::new("base", "ep", "thisrecord", "myns")
            .with_identity(identity);
        let check = LeaderElectionCheck::new(config, source.clone()).unwrap();
        (check, source)
    }

    #[tokio::test]
    async fn test_holder_reports_ok() {
        let (check, source) = check_for("leader-0");
        source.insert_record(RecordKind::Endpoints, "thisrecord", "myns", RAW_VALID_RECORD);
        let sink = InMemorySink::new();

        let outcome = check.check_election_status(&sink).await.unwrap();

        assert_eq!(
            outcome,
            ElectionOutcome::Reported {
                status: ServiceCheckStatus::Ok,
                leader: "leader-0".into()
            }
        );
        assert_eq!(sink.metrics_named("base.leader_election.transitions")[0].value, 0.0);
        assert_eq!(sink.metrics_named("base.leader_election.lease_duration")[0].value, 15.0);
    }

    #[tokio::test]
    async fn test_other_holder_reports_critical_even_if_stale() {
        let (check, source) = check_for("follower-1");
        source.insert_record(RecordKind::Endpoints, "thisrecord", "myns", RAW_VALID_RECORD);
        let sink = InMemorySink::new();

        check.check_election_status(&sink).await.unwrap();

        let checks = sink.service_checks_named("base.leader_election.status");
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].status, ServiceCheckStatus::Critical);
    }

    #[tokio::test]
    async fn test_unparseable_record_warns() {
        let (check, source) = check_for("leader-0");
        source.insert_record(RecordKind::Endpoints, "thisrecord", "myns", "garbage");
        let sink = InMemorySink::new();

        let outcome = check.check_election_status(&sink).await.unwrap();

        assert!(matches!(outcome, ElectionOutcome::InvalidRecord { .. }));
        assert_eq!(sink.warnings().len(), 1);
        assert!(sink.metrics().is_empty());
    }

    #[tokio::test]
    async fn test_source_failure_propagates() {
        let (check, _source) = check_for("leader-0");
        let sink = InMemorySink::new();

        let result = check.check_election_status(&sink).await;
        assert!(matches!(result, Err(LeaderError::Source { .. })));
        assert!(sink.is_empty());
    }
}
