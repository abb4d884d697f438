//! Proxy parser module for the two raw text formats
//!
//! The scraping pipeline and the published artifacts use two line formats:
//! - JSON lines: one self-describing record per line
//! - address pairs: `HOST:PORT` per line
//!
//! Malformed lines are tolerated in both modes and silently skipped; raw
//! input is never a fatal error.

use crate::proxy::models::Proxy;
use once_cell::sync::Lazy;
use regex::Regex;

/// Matches `HOST:PORT` on the last colon, so IPv6-style hosts with embedded
/// colons keep everything before the final numeric port.
static HOST_PORT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+):(\d+)$").expect("Invalid HOST:PORT regex"));

/// Ports that imply an https proxy when inferring a type for bare pairs.
const HTTPS_PORTS: [u16; 2] = [443, 8443];

/// Proxy parser for raw candidate text
pub struct ProxyParser;

impl ProxyParser {
    /// Parse JSON-lines content into proxy records.
    ///
    /// Blank lines and lines that fail to deserialize are skipped.
    pub fn parse_record_lines(content: &str) -> Vec<Proxy> {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    /// Parse `HOST:PORT` content into proxy records.
    ///
    /// The type is inferred from the port: 443 and 8443 become `https`,
    /// everything else `http`. Lines without a colon or with a non-numeric
    /// port are skipped.
    pub fn parse_host_port_lines(content: &str) -> Vec<Proxy> {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter_map(Self::parse_host_port_line)
            .collect()
    }

    fn parse_host_port_line(line: &str) -> Option<Proxy> {
        let caps = HOST_PORT_REGEX.captures(line)?;
        let host = caps.get(1)?.as_str().to_string();
        let port: u16 = caps.get(2)?.as_str().parse().ok()?;

        let proxy_type = if HTTPS_PORTS.contains(&port) {
            "https"
        } else {
            "http"
        };

        Some(Proxy::new(host, port, proxy_type))
    }
}
