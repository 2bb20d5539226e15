//! # Vigil Leader
//!
//! Leader election monitoring for Kubernetes workloads that coordinate
//! through client-go leader election.
//!
//! This crate provides:
//! - [`ElectionRecord`], a decoder and validator for the election annotation
//! - [`RecordSource`], the seam to whatever reads Endpoints/ConfigMap objects
//! - [`LeaderElectionCheck`], which turns a record into gauges, a service
//!   check, or a warning
//!
//! ## Example
//!
//! ```rust
//! use vigil_core::{InMemorySink, ServiceCheckStatus};
//! use vigil_leader::{
//!     ElectionOutcome, InMemoryRecordSource, LeaderCheckConfig, LeaderElectionCheck, RecordKind,
//! };
//!
//! # tokio_test::block_on(async {
//! let source = InMemoryRecordSource::new();
//! source.insert_record(
//!     RecordKind::ConfigMap,
//!     "my-controller",
//!     "kube-system",
//!     r#"{"holderIdentity":"pod-a","leaseDurationSeconds":30,
//!         "acquireTime":"2018-12-18T12:32:22Z","renewTime":"2018-12-18T12:40:00Z"}"#,
//! );
//!
//! let config = LeaderCheckConfig::new("my_controller", "configmap", "my-controller", "kube-system")
//!     .with_identity("pod-a");
//! let check = LeaderElectionCheck::new(config, source).unwrap();
//!
//! let sink = InMemorySink::new();
//! let outcome = check.check_election_status(&sink).await.unwrap();
//! assert!(matches!(outcome, ElectionOutcome::Reported { status: ServiceCheckStatus::Ok, .. }));
//! # });
//! ```

pub mod check;
pub mod config;
pub mod errors;
pub mod record;
pub mod source;

pub use check::{ElectionOutcome, LeaderElectionCheck};
pub use config::LeaderCheckConfig;
pub use errors::{InvalidRecord, LeaderError, LeaderResult};
pub use record::{ElectionRecord, RecordTimestamp};
pub use source::{Annotations, InMemoryRecordSource, RecordKind, RecordSource, LEADER_ANNOTATION};
