//! Leader election record decoding and validation.
//!
//! Kubernetes leader election stores its lock as a JSON annotation on an
//! Endpoints or ConfigMap object:
//!
//! ```json
//! {"holderIdentity":"agent-0","leaseDurationSeconds":60,
//!  "acquireTime":"2018-12-17T11:53:07Z","renewTime":"2018-12-18T12:32:22Z",
//!  "leaderTransitions":7}
//! ```
//!
//! Every field is optional when decoding. Whether the record can be trusted
//! is decided separately by [`ElectionRecord::validate`].

use crate::{InvalidRecord, LeaderError, LeaderResult};
use chrono::{DateTime, Datelike, TimeDelta, Utc};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// A timestamp field as found in the record.
///
/// Malformed values are kept verbatim so validation can report them
/// instead of failing the decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordTimestamp {
    Parsed(DateTime<Utc>),
    Malformed(String),
}

impl RecordTimestamp {
    fn parse(raw: &str) -> Self {
        match DateTime::parse_from_rfc3339(raw) {
            Ok(parsed) if (1..=9999).contains(&parsed.year()) => {
                RecordTimestamp::Parsed(parsed.with_timezone(&Utc))
            }
            _ => RecordTimestamp::Malformed(raw.to_string()),
        }
    }

    /// The parsed value, if the field was well formed
    pub fn parsed(&self) -> Option<DateTime<Utc>> {
        match self {
            RecordTimestamp::Parsed(time) => Some(*time),
            RecordTimestamp::Malformed(_) => None,
        }
    }
}

impl fmt::Display for RecordTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordTimestamp::Parsed(time) if time.timestamp_subsec_micros() != 0 => {
                write!(f, "{}", time.format("%Y-%m-%d %H:%M:%S%.6f%:z"))
            }
            RecordTimestamp::Parsed(time) => write!(f, "{}", time.format("%Y-%m-%d %H:%M:%S%:z")),
            RecordTimestamp::Malformed(raw) => f.write_str(raw),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecord {
    holder_identity: Option<String>,
    lease_duration_seconds: Option<i64>,
    acquire_time: Option<String>,
    renew_time: Option<String>,
    leader_transitions: Option<i64>,
}

/// Decoded leader election record.
///
/// Immutable once built; a fresh record is decoded on every check cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ElectionRecord {
    leader_name: Option<String>,
    lease_duration: Option<i64>,
    transitions: Option<i64>,
    acquire_time: Option<RecordTimestamp>,
    renew_time: Option<RecordTimestamp>,
}

impl ElectionRecord {
    /// Decode a record from the raw annotation value.
    ///
    /// Absent keys leave the matching attribute unset. Only a payload that
    /// is not a JSON object, or whose fields have the wrong JSON type, is
    /// rejected here.
    pub fn parse(raw: &str) -> LeaderResult<Self> {
        let raw: RawRecord =
            serde_json::from_str(raw).map_err(|e| LeaderError::MalformedRecord {
                reason: e.to_string(),
            })?;

        Ok(Self {
            leader_name: raw.holder_identity,
            lease_duration: raw.lease_duration_seconds,
            transitions: raw.leader_transitions,
            acquire_time: raw.acquire_time.as_deref().map(RecordTimestamp::parse),
            renew_time: raw.renew_time.as_deref().map(RecordTimestamp::parse),
        })
    }

    /// Check the record, stopping at the first problem.
    ///
    /// Presence of every required field is checked before the format of
    /// either timestamp.
    pub fn validate(&self) -> Result<(), InvalidRecord> {
        if self.leader_name.as_deref().map_or(true, str::is_empty) {
            return Err(InvalidRecord::NoLeader);
        }
        if self.lease_duration.is_none() {
            return Err(InvalidRecord::NoLeaseDuration);
        }
        let renew = self.renew_time.as_ref().ok_or(InvalidRecord::NoRenewTime)?;
        let acquire = self
            .acquire_time
            .as_ref()
            .ok_or(InvalidRecord::NoAcquireTime)?;

        if renew.parsed().is_none() {
            return Err(InvalidRecord::BadRenewTime);
        }
        if acquire.parsed().is_none() {
            return Err(InvalidRecord::BadAcquireTime);
        }

        Ok(())
    }

    /// Validation result as a `(valid, reason)` pair
    pub fn validation_status(&self) -> (bool, Option<String>) {
        match self.validate() {
            Ok(()) => (true, None),
            Err(reason) => (false, Some(reason.to_string())),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn leader_name(&self) -> Option<&str> {
        self.leader_name.as_deref()
    }

    pub fn lease_duration(&self) -> Option<i64> {
        self.lease_duration
    }

    /// Leader transitions, 0 when the record does not carry the field
    pub fn transitions(&self) -> i64 {
        self.transitions.unwrap_or(0)
    }

    pub fn acquire_time(&self) -> Option<DateTime<Utc>> {
        self.acquire_time.as_ref().and_then(RecordTimestamp::parsed)
    }

    pub fn renew_time(&self) -> Option<DateTime<Utc>> {
        self.renew_time.as_ref().and_then(RecordTimestamp::parsed)
    }

    /// Seconds left before the current lease must be renewed.
    ///
    /// Negative once the lease is overdue. `None` when the renew time or
    /// the lease duration is missing or unusable.
    pub fn seconds_until_renew(&self) -> Option<f64> {
        self.seconds_until_renew_at(Utc::now())
    }

    /// [`seconds_until_renew`](Self::seconds_until_renew) against a fixed clock
    pub fn seconds_until_renew_at(&self, now: DateTime<Utc>) -> Option<f64> {
        let lease = TimeDelta::try_seconds(self.lease_duration?)?;
        let expiry = self.renew_time()?.checked_add_signed(lease)?;
        Some(expiry.signed_duration_since(now).num_milliseconds() as f64 / 1000.0)
    }

    /// One-line human description of the record
    pub fn summary(&self) -> String {
        format!(
            "Leader: {} since {}, next renew {}",
            self.leader_name.as_deref().unwrap_or("<none>"),
            display_or_none(&self.acquire_time),
            display_or_none(&self.renew_time),
        )
    }
}

fn display_or_none(timestamp: &Option<RecordTimestamp>) -> String {
    timestamp
        .as_ref()
        .map_or_else(|| "<none>".to_string(), ToString::to_string)
}

impl FromStr for ElectionRecord {
    type Err = LeaderError;

    fn from_str(raw: &str) -> LeaderResult<Self> {
        Self::parse(raw)
    }
}
