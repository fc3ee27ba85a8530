//! Record model
//!
//! Two fixed shapes meet here:
//!
//! - [`DesiredRecord`]: the caller's record (relative name, type, value,
//!   TTL as a duration, optional priority)
//! - [`ProviderRecord`]: the provider's record (zone, host, type, raw data
//!   string, TTL in seconds, provider-assigned [`RecordId`])
//!
//! [`RecordDraft`] is a provider record that has not been created yet and so
//! has no identifier. [`ZoneRecord`] is the projection handed back to
//! callers after an operation.

pub mod codec;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::Error;

/// Provider-assigned record identifier
///
/// Opaque correlation token between the before/after states of an update and
/// between execution and rollback. Never changes for the lifetime of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(RecordId)
            .map_err(|_| Error::validation(format!("record id must be numeric, got '{}'", s)))
    }
}

/// Caller-supplied target record
///
/// Empty strings, a zero TTL and a missing priority are "unset" and act as
/// wildcards when compared against provider records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DesiredRecord {
    /// Host label relative to the zone (e.g. "www", "@")
    pub name: String,
    /// Record type, upper-case (A, AAAA, CNAME, MX, TXT, SRV, URI, ...)
    #[serde(rename = "type")]
    pub rtype: String,
    /// Record value without any priority prefix
    pub value: String,
    /// Time-to-live
    #[serde(default)]
    pub ttl: Duration,
    /// Priority for MX/SRV/URI records
    #[serde(default)]
    pub priority: Option<u16>,
}

impl DesiredRecord {
    /// Create a new desired record. The type is upper-cased.
    pub fn new(
        name: impl Into<String>,
        rtype: impl AsRef<str>,
        value: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            rtype: rtype.as_ref().to_ascii_uppercase(),
            value: value.into(),
            ttl,
            priority: None,
        }
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: u16) -> Self {
        self.priority = Some(priority);
        self
    }

    /// The data string as the provider stores it
    pub fn provider_data(&self) -> String {
        codec::encode_data(&self.rtype, &self.value, self.priority)
    }

    /// TTL in whole seconds, saturating
    pub fn ttl_secs(&self) -> u32 {
        u32::try_from(self.ttl.as_secs()).unwrap_or(u32::MAX)
    }

    /// Whether every comparable field is unset
    ///
    /// Such a record matches every provider record in a zone.
    pub fn is_unconstrained(&self) -> bool {
        self.name.is_empty() && self.rtype.is_empty() && self.value.is_empty() && self.ttl.is_zero()
    }

    /// Build the provider-side draft for creating this record in `zone`
    pub fn to_draft(&self, zone: &str) -> RecordDraft {
        RecordDraft {
            zone: zone.to_string(),
            host: self.name.clone(),
            rtype: self.rtype.to_ascii_uppercase(),
            data: self.provider_data(),
            ttl: self.ttl_secs(),
        }
    }
}

impl fmt::Display for DesiredRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} ttl={}s",
            self.name,
            self.rtype,
            self.provider_data(),
            self.ttl.as_secs()
        )
    }
}

/// Provider-side record before creation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordDraft {
    /// Zone (domain name) the record lives in
    pub zone: String,
    /// Host label
    pub host: String,
    /// Record type
    #[serde(rename = "type")]
    pub rtype: String,
    /// Raw data, priority-prefixed where applicable
    pub data: String,
    /// TTL in seconds
    pub ttl: u32,
}

impl fmt::Display for RecordDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} ttl={}", self.host, self.rtype, self.data, self.ttl)
    }
}

/// Provider-side record as returned by the provider API
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderRecord {
    /// Provider-assigned identifier
    pub id: RecordId,
    /// Zone (domain name) the record lives in
    pub zone: String,
    /// Host label
    pub host: String,
    /// Record type
    #[serde(rename = "type")]
    pub rtype: String,
    /// Raw data, priority-prefixed where applicable
    pub data: String,
    /// TTL in seconds
    pub ttl: u32,
}

impl ProviderRecord {
    /// The same record without its identifier, for re-creation
    pub fn draft(&self) -> RecordDraft {
        RecordDraft {
            zone: self.zone.clone(),
            host: self.host.clone(),
            rtype: self.rtype.to_ascii_uppercase(),
            data: self.data.clone(),
            ttl: self.ttl,
        }
    }

    /// Convert to the caller's record shape, splitting out any priority
    pub fn to_desired(&self) -> DesiredRecord {
        let (priority, value) = codec::decode_data(&self.rtype, &self.data);
        DesiredRecord {
            name: self.host.clone(),
            rtype: self.rtype.clone(),
            value,
            ttl: Duration::from_secs(u64::from(self.ttl)),
            priority,
        }
    }

    /// Host, type, data and TTL, ignoring the identifier
    pub fn content_key(&self) -> (String, String, String, u32) {
        (
            self.host.clone(),
            self.rtype.clone(),
            self.data.clone(),
            self.ttl,
        )
    }
}

impl fmt::Display for ProviderRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} {} {} ttl={}",
            self.id, self.host, self.rtype, self.data, self.ttl
        )
    }
}

/// A record in caller format together with its provider identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneRecord {
    /// Provider-assigned identifier
    pub id: RecordId,
    /// The record itself
    #[serde(flatten)]
    pub record: DesiredRecord,
}

impl From<&ProviderRecord> for ZoneRecord {
    fn from(r: &ProviderRecord) -> Self {
        Self {
            id: r.id,
            record: r.to_desired(),
        }
    }
}
