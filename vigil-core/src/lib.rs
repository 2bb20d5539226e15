//! # Vigil Core
//!
//! Plumbing shared by every Vigil agent check.
//!
//! This crate provides:
//! - [`MetricSink`], the interface checks report through, and an
//!   [`InMemorySink`] aggregator
//! - [`ServiceCheckStatus`] for discrete health reporting
//! - [`AgentCheck`] and [`run_check`], which runs one cycle and turns a
//!   failure into a logged warning instead of crashing the host
//! - tag helpers and tracing bootstrap
//!
//! ## Example
//!
//! ```rust
//! use vigil_core::{InMemorySink, MetricSink, ServiceCheckStatus};
//!
//! let sink = InMemorySink::new();
//! sink.emit_metric("base.leader_election.transitions", 7.0, &["record_kind:ep".into()]);
//! sink.emit_service_check("base.leader_election.status", ServiceCheckStatus::Ok, &[]);
//! assert_eq!(sink.metrics().len(), 1);
//! ```

pub mod check;
pub mod error;
pub mod logging;
pub mod sink;
pub mod status;
pub mod tags;

pub use check::{run_check, AgentCheck, CheckOutcome};
pub use error::{CoreError, CoreResult};
pub use logging::{init_tracing, LogFormat};
pub use sink::{InMemorySink, MetricSample, MetricSink, ServiceCheckSample};
pub use status::ServiceCheckStatus;
