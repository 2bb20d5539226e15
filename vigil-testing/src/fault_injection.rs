//! Fault injection for API client tests.
//!
//! [`FaultyTransport`] wraps another transport and, for requests whose URL
//! contains a registered fragment, replaces the exchange with a failure.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;
use vigil_openstack::{HttpRequest, HttpResponse, HttpTransport, TransportError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultType {
    /// Fail as if the request timed out
    Timeout,
    /// Fail as if the peer refused the connection
    ConnectionRefused,
    /// Answer with an empty body and this status
    Status(u16),
    /// Delay, then forward to the wrapped transport
    Latency(Duration),
}

#[derive(Debug, Clone)]
struct Fault {
    url_fragment: String,
    fault: FaultType,
    skip: usize,
    remaining: usize,
}

/// Counters of a [`FaultyTransport`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FaultStats {
    pub injected: usize,
    pub passed_through: usize,
}

#[derive(Debug, Default)]
struct FaultState {
    faults: Vec<Fault>,
    stats: FaultStats,
}

/// Transport wrapper injecting scheduled faults.
///
/// Faults are consumed in registration order; clones share the schedule.
#[derive(Debug, Clone)]
pub struct FaultyTransport<T> {
    inner: T,
    state: Arc<Mutex<FaultState>>,
}

impl<T: HttpTransport> FaultyTransport<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            state: Arc::new(Mutex::new(FaultState::default())),
        }
    }

    /// Apply `fault` to the next `times` requests whose URL contains `url_fragment`
    pub fn inject(&self, url_fragment: &str, fault: FaultType, times: usize) -> &Self {
        self.inject_after(url_fragment, fault, 0, times)
    }

    /// Like [`inject`](Self::inject), letting the first `skip` matching requests through
    pub fn inject_after(&self, url_fragment: &str, fault: FaultType, skip: usize, times: usize) -> &Self {
        self.state.lock().faults.push(Fault {
            url_fragment: url_fragment.to_string(),
            fault,
            skip,
            remaining: times,
        });
        self
    }

    pub fn clear(&self) {
        self.state.lock().faults.clear();
    }

    pub fn stats(&self) -> FaultStats {
        self.state.lock().stats
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    fn take_fault(&self, url: &str) -> Option<FaultType> {
        let mut state = self.state.lock();
        let mut fault = None;
        for scheduled in state.faults.iter_mut() {
            if scheduled.remaining == 0 || !url.contains(&scheduled.url_fragment) {
                continue;
            }
            if scheduled.skip > 0 {
                scheduled.skip -= 1;
                continue;
            }
            scheduled.remaining -= 1;
            fault = Some(scheduled.fault.clone());
            break;
        }

        match fault {
            Some(_) => state.stats.injected += 1,
            None => state.stats.passed_through += 1,
        }
        fault
    }
}

#[async_trait]
impl<T: HttpTransport> HttpTransport for FaultyTransport<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let Some(fault) = self.take_fault(&request.url) else {
            return self.inner.send(request).await;
        };

        debug!("Injecting {:?} into {}", fault, request.url);
        match fault {
            FaultType::Timeout => Err(TransportError::Timeout { url: request.url }),
            FaultType::ConnectionRefused => Err(TransportError::Connect {
                url: request.url,
                reason: "connection refused".to_string(),
            }),
            FaultType::Status(status) => Ok(HttpResponse::new(status, "")),
            FaultType::Latency(delay) => {
                sleep(delay).await;
                self.inner.send(request).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vigil_openstack::InMemoryTransport;

    #[tokio::test]
    async fn test_faults_are_consumed_then_pass_through() {
        let backend = InMemoryTransport::new();
        backend.get_json("http://nova/servers", 200, json!({}));
        let transport = FaultyTransport::new(backend.clone());
        transport.inject("/servers", FaultType::Status(503), 2);

        for _ in 0..2 {
            let response = transport
                .send(HttpRequest::get("http://nova/servers"))
                .await
                .unwrap();
            assert_eq!(response.status, 503);
        }
        let response = transport
            .send(HttpRequest::get("http://nova/servers"))
            .await
            .unwrap();
        assert_eq!(response.status, 200);

        assert_eq!(
            transport.stats(),
            FaultStats {
                injected: 2,
                passed_through: 1
            }
        );
        assert_eq!(backend.request_count(), 1);
    }

    #[tokio::test]
    async fn test_skipped_requests_pass_through() {
        let backend = InMemoryTransport::new();
        backend.get_json("http://nova/servers", 200, json!({}));
        let transport = FaultyTransport::new(backend);
        transport.inject_after("/servers", FaultType::ConnectionRefused, 1, 1);

        let request = || HttpRequest::get("http://nova/servers");
        assert!(transport.send(request()).await.is_ok());
        assert!(matches!(
            transport.send(request()).await,
            Err(TransportError::Connect { .. })
        ));
        assert!(transport.send(request()).await.is_ok());
    }

    #[tokio::test]
    async fn test_unmatched_urls_are_untouched() {
        let backend = InMemoryTransport::new();
        backend.get_json("http://nova/flavors", 200, json!({}));
        let transport = FaultyTransport::new(backend);
        transport.inject("/servers", FaultType::Timeout, 1);

        assert!(transport
            .send(HttpRequest::get("http://nova/flavors"))
            .await
            .is_ok());
        assert!(matches!(
            transport.send(HttpRequest::get("http://nova/servers")).await,
            Err(TransportError::Timeout { .. })
        ));
    }
}
