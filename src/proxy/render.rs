//! Artifact rendering for the canonical proxy collection
//!
//! Three independent representations are published per run:
//! - `proxyinfo.json`: one JSON record per line
//! - `proxyinfo.txt`: bare `host:port` pairs
//! - `db.json`: records grouped by `{type}_{anonymity}`

use crate::proxy::models::Proxy;
use crate::Result;
use serde_json::{Map, Value};

/// Renderers producing the published artifacts
pub struct ArtifactRenderer;

impl ArtifactRenderer {
    /// Render one JSON record per line, with a trailing newline.
    pub fn record_lines(proxies: &[Proxy]) -> Result<String> {
        let mut lines = Vec::with_capacity(proxies.len());
        for proxy in proxies {
            lines.push(serde_json::to_string(proxy)?);
        }
        Ok(lines.join("\n") + "\n")
    }

    /// Render `host:port` per line, with a trailing newline.
    ///
    /// Records without a port are silently omitted.
    pub fn host_port_lines(proxies: &[Proxy]) -> String {
        let lines: Vec<String> = proxies.iter().filter_map(Proxy::host_port).collect();
        lines.join("\n") + "\n"
    }

    /// Render the grouped artifact: a JSON object keyed by
    /// `{type}_{anonymity}` mapping to the matching records in encounter
    /// order, each with `export_address` stripped. 2-space indentation.
    pub fn grouped_json(proxies: &[Proxy]) -> Result<String> {
        let mut groups: Map<String, Value> = Map::new();

        for proxy in proxies {
            let key = format!("{}_{}", proxy.type_tag(), proxy.anonymity_tag());
            let entry = serde_json::to_value(proxy.without_export_address())?;
            match groups.get_mut(&key) {
                Some(Value::Array(list)) => list.push(entry),
                _ => {
                    groups.insert(key, Value::Array(vec![entry]));
                }
            }
        }

        Ok(serde_json::to_string_pretty(&Value::Object(groups))?)
    }
}
