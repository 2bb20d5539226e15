//! Instance configuration of the leader election check.

use crate::{LeaderError, LeaderResult, RecordKind};
use serde::{Deserialize, Serialize};

/// Environment variable holding the pod name inside Kubernetes
pub const HOSTNAME_ENV: &str = "HOSTNAME";

/// Configuration for one leader election check instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderCheckConfig {
    /// Metric namespace, e.g. `datadog.cluster_agent`
    pub namespace: String,

    /// `ep`, `endpoints` or `configmap`
    pub record_kind: String,

    /// Name of the object holding the record
    pub record_name: String,

    /// Namespace of the object holding the record
    pub record_namespace: String,

    /// Extra tags appended to every submission
    #[serde(default)]
    pub tags: Vec<String>,

    /// Identity this instance runs as; compared with the record holder.
    /// Falls back to `$HOSTNAME`.
    #[serde(default)]
    pub identity: Option<String>,
}

impl LeaderCheckConfig {
    pub fn new(
        namespace: impl Into<String>,
        record_kind: impl Into<String>,
        record_name: impl Into<String>,
        record_namespace: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            record_kind: record_kind.into(),
            record_name: record_name.into(),
            record_namespace: record_namespace.into(),
            tags: Vec::new(),
            identity: None,
        }
    }

    /// Decode an instance document as found in the agent configuration
    pub fn from_value(value: serde_json::Value) -> LeaderResult<Self> {
        let config: Self = serde_json::from_value(value).map_err(|e| LeaderError::ConfigError {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    /// Parsed record kind
    pub fn kind(&self) -> LeaderResult<RecordKind> {
        self.record_kind.parse()
    }

    /// Identity to compare against the record holder
    pub fn resolve_identity(&self) -> Option<String> {
        self.identity
            .clone()
            .or_else(|| std::env::var(HOSTNAME_ENV).ok())
            .filter(|identity| !identity.is_empty())
    }

    pub fn validate(&self) -> LeaderResult<()> {
        for (field, value) in [
            ("namespace", &self.namespace),
            ("record_name", &self.record_name),
            ("record_namespace", &self.record_namespace),
        ] {
            if value.is_empty() {
                return Err(LeaderError::ConfigError {
                    reason: format!("{} must not be empty", field),
                });
            }
        }
        self.kind()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value() {
        let config = LeaderCheckConfig::from_value(json!({
            "namespace": "base",
            "record_kind": "ep",
            "record_name": "thisrecord",
            "record_namespace": "myns",
            "tags": ["custom:tag"],
        }))
        .unwrap();

        assert_eq!(config.kind().unwrap(), RecordKind::Endpoints);
        assert_eq!(config.tags, vec!["custom:tag".to_string()]);
        assert_eq!(config.identity, None);
    }

    #[test]
    fn test_rejects_unknown_kind() {
        let result = LeaderCheckConfig::from_value(json!({
            "namespace": "base",
            "record_kind": "lease",
            "record_name": "thisrecord",
            "record_namespace": "myns",
        }));
        assert!(matches!(result, Err(LeaderError::UnknownRecordKind { .. })));
    }

    #[test]
    fn test_rejects_missing_fields() {
        let result = LeaderCheckConfig::from_value(json!({ "namespace": "base" }));
        assert!(matches!(result, Err(LeaderError::ConfigError { .. })));

        let config = LeaderCheckConfig::new("base", "ep", "", "myns");
        assert!(matches!(
            config.validate(),
            Err(LeaderError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_explicit_identity_wins() {
        let config = LeaderCheckConfig::new("base", "configmap", "r", "ns").with_identity("me");
        assert_eq!(config.resolve_identity().as_deref(), Some("me"));
    }
}
