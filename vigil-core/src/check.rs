//! The check abstraction and the runner a scheduler calls on every cycle.

use crate::MetricSink;
use async_trait::async_trait;
use std::time::Instant;
use tracing::{debug, error};

/// A periodic monitoring check.
///
/// One invocation of [`check`](AgentCheck::check) runs to completion
/// sequentially; the scheduler decides when the next one starts.
#[async_trait]
pub trait AgentCheck: Send + Sync {
    /// Error returned by a failed invocation
    type Error: std::error::Error + Send + Sync + 'static;

    /// Name used in logs and warnings
    fn name(&self) -> &str;

    /// Run one check cycle, pushing results into `sink`
    async fn check(&self, sink: &dyn MetricSink) -> Result<(), Self::Error>;
}

/// Result of one [`run_check`] invocation
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    Completed,
    Failed(String),
}

impl CheckOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, CheckOutcome::Completed)
    }
}

/// Run a single check cycle without letting its failure escape.
///
/// A failed invocation is logged and forwarded to the sink as a warning so
/// the scheduler can keep calling future cycles.
pub async fn run_check<C>(check: &C, sink: &dyn MetricSink) -> CheckOutcome
where
    C: AgentCheck + ?Sized,
{
    let started = Instant::now();

    match check.check(sink).await {
        Ok(()) => {
            debug!(
                "Check {} completed in {:?}",
                check.name(),
                started.elapsed()
            );
            CheckOutcome::Completed
        }
        Err(e) => {
            let message = format!("Check {} failed: {}", check.name(), e);
            error!("{}", message);
            sink.emit_warning(&message);
            CheckOutcome::Failed(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CoreError, InMemorySink, ServiceCheckStatus};

    struct StaticCheck {
        fail: bool,
    }

    #[async_trait]
    impl AgentCheck for StaticCheck {
        type Error = CoreError;

        fn name(&self) -> &str {
            "static"
        }

        async fn check(&self, sink: &dyn MetricSink) -> Result<(), CoreError> {
            if self.fail {
                return Err(CoreError::internal("backend went away"));
            }
            sink.emit_service_check("static.up", ServiceCheckStatus::Ok, &[]);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_run_check_success() {
        let sink = InMemorySink::new();
        let outcome = run_check(&StaticCheck { fail: false }, &sink).await;

        assert!(outcome.is_completed());
        assert_eq!(sink.service_checks().len(), 1);
        assert!(sink.warnings().is_empty());
    }

    #[tokio::test]
    async fn test_run_check_failure_becomes_warning() {
        let sink = InMemorySink::new();
        let outcome = run_check(&StaticCheck { fail: true }, &sink).await;

        assert_eq!(
            outcome,
            CheckOutcome::Failed("Check static failed: Internal error: backend went away".into())
        );
        assert_eq!(sink.warnings().len(), 1);
        assert!(sink.service_checks().is_empty());
    }
}
