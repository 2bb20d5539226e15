//! Service check status reported alongside numeric metrics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete health status of a monitored target.
///
/// The numeric values match the agent wire convention
/// (`OK = 0`, `WARNING = 1`, `CRITICAL = 2`, `UNKNOWN = 3`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServiceCheckStatus {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl ServiceCheckStatus {
    /// Wire value of the status
    pub fn code(self) -> u8 {
        match self {
            ServiceCheckStatus::Ok => 0,
            ServiceCheckStatus::Warning => 1,
            ServiceCheckStatus::Critical => 2,
            ServiceCheckStatus::Unknown => 3,
        }
    }

    pub fn is_ok(self) -> bool {
        matches!(self, ServiceCheckStatus::Ok)
    }
}

impl fmt::Display for ServiceCheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceCheckStatus::Ok => "OK",
            ServiceCheckStatus::Warning => "WARNING",
            ServiceCheckStatus::Critical => "CRITICAL",
            ServiceCheckStatus::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ServiceCheckStatus::Ok.code(), 0);
        assert_eq!(ServiceCheckStatus::Warning.code(), 1);
        assert_eq!(ServiceCheckStatus::Critical.code(), 2);
        assert_eq!(ServiceCheckStatus::Unknown.code(), 3);
    }

    #[test]
    fn test_status_serde_names() {
        let json = serde_json::to_string(&ServiceCheckStatus::Critical).unwrap();
        assert_eq!(json, "\"CRITICAL\"");

        let status: ServiceCheckStatus = serde_json::from_str("\"OK\"").unwrap();
        assert!(status.is_ok());
        assert_eq!(status.to_string(), "OK");
    }
}
