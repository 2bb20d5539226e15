//! Where leader election records come from.
//!
//! The check never talks to the Kubernetes API itself; it goes through a
//! [`RecordSource`], which returns the annotations of the Endpoints or
//! ConfigMap object holding the lock.

use crate::{LeaderError, LeaderResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Annotation key under which client-go stores the election record
pub const LEADER_ANNOTATION: &str = "control-plane.alpha.kubernetes.io/leader";

/// Object annotations, keyed by annotation name
pub type Annotations = BTreeMap<String, String>;

/// Kubernetes object kind holding the election record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Endpoints,
    ConfigMap,
}

impl FromStr for RecordKind {
    type Err = LeaderError;

    fn from_str(kind: &str) -> LeaderResult<Self> {
        match kind {
            "ep" | "endpoints" => Ok(RecordKind::Endpoints),
            "configmap" => Ok(RecordKind::ConfigMap),
            other => Err(LeaderError::UnknownRecordKind {
                kind: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Endpoints => f.write_str("endpoints"),
            RecordKind::ConfigMap => f.write_str("configmap"),
        }
    }
}

/// Reads the annotations of the object holding an election record.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch the annotations of `namespace/name`.
    ///
    /// # Returns
    /// * `Ok(Some(annotations))` if the object exists and carries annotations
    /// * `Ok(None)` if the object has no annotation map at all
    /// * `Err(LeaderError)` if the object could not be read
    async fn read_annotations(
        &self,
        kind: RecordKind,
        name: &str,
        namespace: &str,
    ) -> LeaderResult<Option<Annotations>>;

    /// Fetch the raw election record stored on `namespace/name`, if any
    async fn read_raw_record(
        &self,
        kind: RecordKind,
        name: &str,
        namespace: &str,
    ) -> LeaderResult<Option<String>> {
        let annotations = self.read_annotations(kind, name, namespace).await?;
        Ok(annotations.and_then(|mut annotations| annotations.remove(LEADER_ANNOTATION)))
    }
}

type ObjectKey = (RecordKind, String, String);

#[derive(Debug, Default)]
struct SourceState {
    objects: HashMap<ObjectKey, Option<Annotations>>,
    reads: Vec<ObjectKey>,
}

/// Record source backed by an in-memory object table.
///
/// Suitable for tests and for agents that receive objects through a watch
/// and only need the lookup. Every read is logged so callers can assert on
/// what was fetched. Clones share the same table.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordSource {
    state: Arc<RwLock<SourceState>>,
}

impl InMemoryRecordSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object carrying `raw` under the leader annotation
    pub fn insert_record(&self, kind: RecordKind, name: &str, namespace: &str, raw: &str) {
        let mut annotations = Annotations::new();
        annotations.insert(LEADER_ANNOTATION.to_string(), raw.to_string());
        self.insert_object(kind, name, namespace, Some(annotations));
    }

    /// Store an object with arbitrary annotations (or none)
    pub fn insert_object(
        &self,
        kind: RecordKind,
        name: &str,
        namespace: &str,
        annotations: Option<Annotations>,
    ) {
        self.state.write().objects.insert(
            (kind, name.to_string(), namespace.to_string()),
            annotations,
        );
    }

    /// Every `(kind, name, namespace)` read so far, in order
    pub fn reads(&self) -> Vec<(RecordKind, String, String)> {
        self.state.read().reads.clone()
    }
}

#[async_trait]
impl RecordSource for InMemoryRecordSource {
    async fn read_annotations(
        &self,
        kind: RecordKind,
        name: &str,
        namespace: &str,
    ) -> LeaderResult<Option<Annotations>> {
        let key = (kind, name.to_string(), namespace.to_string());
        let mut state = self.state.write();
        state.reads.push(key.clone());

        state
            .objects
            .get(&key)
            .cloned()
            .ok_or_else(|| LeaderError::Source {
                kind: kind.to_string(),
                namespace: namespace.to_string(),
                name: name.to_string(),
                reason: "object not found".to_string(),
            })
    }
}
