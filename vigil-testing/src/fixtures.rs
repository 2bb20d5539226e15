//! Fixture builders shared by the integration suites and benchmarks.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};
use std::fmt::Display;
use vigil_leader::{InMemoryRecordSource, LeaderCheckConfig, LeaderElectionCheck};

/// A record as written by a cluster agent that has been leader for a day
pub const RAW_VALID_RECORD: &str = concat!(
    r#"{"holderIdentity":"dd-cluster-agent-568f458dd6-kj6vt","#,
    r#""leaseDurationSeconds":60,"#,
    r#""acquireTime":"2018-12-17T11:53:07Z","#,
    r#""renewTime":"2018-12-18T12:32:22Z","#,
    r#""leaderTransitions":7}"#
);

/// Builds raw election annotations field by field.
///
/// Unset fields are left out of the JSON document entirely.
#[derive(Debug, Clone, Default)]
pub struct RecordBuilder {
    fields: Map<String, Value>,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn holder(mut self, holder: &str) -> Self {
        self.fields.insert("holderIdentity".into(), Value::from(holder));
        self
    }

    pub fn lease_duration(mut self, seconds: i64) -> Self {
        self.fields
            .insert("leaseDurationSeconds".into(), Value::from(seconds));
        self
    }

    pub fn transitions(mut self, transitions: i64) -> Self {
        self.fields
            .insert("leaderTransitions".into(), Value::from(transitions));
        self
    }

    /// Set `acquireTime` to a raw string, well formed or not
    pub fn acquire(mut self, raw: &str) -> Self {
        self.fields.insert("acquireTime".into(), Value::from(raw));
        self
    }

    /// Set `renewTime` to a raw string, well formed or not
    pub fn renew(mut self, raw: &str) -> Self {
        self.fields.insert("renewTime".into(), Value::from(raw));
        self
    }

    pub fn acquired_at(self, time: DateTime<Utc>) -> Self {
        self.acquire(&rfc3339(time))
    }

    pub fn renewed_at(self, time: DateTime<Utc>) -> Self {
        self.renew(&rfc3339(time))
    }

    pub fn build(&self) -> String {
        Value::Object(self.fields.clone()).to_string()
    }
}

fn rfc3339(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Install a warn-level subscriber once per test binary
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_test_writer()
        .try_init();
}

/// A leader check on `thisrecord` in `myns`, metric namespace `base`
pub fn leader_check(
    record_kind: &str,
    identity: &str,
    tags: &[&str],
    source: InMemoryRecordSource,
) -> LeaderElectionCheck<InMemoryRecordSource> {
    let config = LeaderCheckConfig::new("base", record_kind, "thisrecord", "myns")
        .with_identity(identity)
        .with_tags(tags.iter().map(|tag| tag.to_string()).collect());

    match LeaderElectionCheck::new(config, source) {
        Ok(check) => check,
        Err(e) => panic!("invalid fixture configuration: {}", e),
    }
}

/// A list response body holding `items` under `field`
pub fn page(field: &str, items: Vec<Value>) -> Value {
    json!({ field: items })
}

/// A list response body of objects that only carry an `id`
pub fn page_of_ids<I>(field: &str, ids: I) -> Value
where
    I: IntoIterator,
    I::Item: Display,
{
    page(
        field,
        ids.into_iter()
            .map(|id| json!({ "id": id.to_string() }))
            .collect(),
    )
}
