//! Proxy data models

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Proxy type tag used when a record carries none.
pub const DEFAULT_TYPE: &str = "http";

/// Anonymity tag used when a record carries none.
pub const DEFAULT_ANONYMITY: &str = "transparent";

/// Proxy model representing a single proxy endpoint.
///
/// Records come from two places: the scraper's JSON-lines output and the
/// previously published artifact downloaded from the remote store. The store
/// may contain descriptive fields this crate does not know about, so anything
/// unrecognized is kept in `extra` and written back out unchanged.
///
/// Two records describe the same proxy iff host, port and type match; every
/// other field is descriptive only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proxy {
    pub host: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub proxy_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anonymity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_address: Option<String>,
    /// Measured liveness probe time in seconds. Only ever present on records
    /// that passed validation in the current run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Proxy {
    /// Create a new proxy with just an address and type tag.
    pub fn new(host: String, port: u16, proxy_type: &str) -> Self {
        Self {
            host,
            port: Some(port),
            proxy_type: Some(proxy_type.to_string()),
            anonymity: None,
            export_address: None,
            response_time: None,
            extra: Map::new(),
        }
    }

    /// The proxy type tag, with the default applied.
    pub fn type_tag(&self) -> &str {
        self.proxy_type.as_deref().unwrap_or(DEFAULT_TYPE)
    }

    /// The anonymity tag, with the default applied.
    pub fn anonymity_tag(&self) -> &str {
        self.anonymity.as_deref().unwrap_or(DEFAULT_ANONYMITY)
    }

    /// Deduplication key: two records are the same proxy iff this matches.
    pub fn identity_key(&self) -> String {
        let port = self.port.map(|p| p.to_string()).unwrap_or_default();
        format!("{}:{}:{}", self.host, port, self.type_tag())
    }

    /// Byte length of the JSON serialization. The merge engine treats a
    /// longer serialization as "more complete" — a crude heuristic carried
    /// over deliberately, not a field-level union.
    pub fn serialized_len(&self) -> usize {
        serde_json::to_string(self).map_or(0, |s| s.len())
    }

    /// URL scheme used when dialing this proxy as a forward proxy.
    pub fn scheme(&self) -> &str {
        if self.type_tag().eq_ignore_ascii_case("https") {
            "https"
        } else {
            "http"
        }
    }

    /// `host:port` form, if the record has a port.
    pub fn host_port(&self) -> Option<String> {
        self.port.map(|p| format!("{}:{}", self.host, p))
    }

    /// Copy with `export_address` stripped, for the grouped artifact.
    pub fn without_export_address(&self) -> Self {
        let mut copy = self.clone();
        copy.export_address = None;
        copy
    }

    /// Copy enriched with a measured response time, rounded to 2 decimals.
    pub fn with_response_time(&self, secs: f64) -> Self {
        let mut copy = self.clone();
        copy.response_time = Some((secs * 100.0).round() / 100.0);
        copy
    }
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identity_key())
    }
}
