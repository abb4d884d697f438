//! Run configuration
//!
//! Everything the pipeline needs is resolved once at startup and passed in
//! as one explicit struct; nothing reads the environment after this point.

use crate::proxy::CheckerConfig;
use anyhow::{anyhow, Result};
use std::env;
use std::path::PathBuf;

/// Environment variables checked for the store token, in precedence order.
pub const TOKEN_ENV_VARS: [&str; 2] = ["GTOKEN", "GITHUB_TOKEN"];

/// Default owner of the data-store repository
pub const DEFAULT_OWNER: &str = "parserpp";

/// Default data-store repository
pub const DEFAULT_REPO: &str = "ip_ports";

/// Scraper output consumed by a sync run
pub const DEFAULT_INPUT_FILE: &str = "proxy.list.out";

/// Raw scraper candidate list, uploaded verbatim in pass-through mode
pub const DEFAULT_RAW_FILE: &str = "proxy.list";

/// Configuration for one pipeline run
#[derive(Debug, Clone)]
pub struct Config {
    /// Bearer token for the remote store
    pub token: String,
    /// Owner of the data-store repository
    pub owner: String,
    /// Name of the data-store repository
    pub repo: String,
    /// Local file with the freshly scraped batch (JSON lines)
    pub input_file: PathBuf,
    /// Local raw pass-through file
    pub raw_file: PathBuf,
    /// Whether the validation stage runs between merge and render
    pub validate: bool,
    /// Liveness checker settings
    pub checker: CheckerConfig,
}

impl Config {
    pub fn new(token: String) -> Self {
        Self {
            token,
            owner: DEFAULT_OWNER.to_string(),
            repo: DEFAULT_REPO.to_string(),
            input_file: PathBuf::from(DEFAULT_INPUT_FILE),
            raw_file: PathBuf::from(DEFAULT_RAW_FILE),
            validate: false,
            checker: CheckerConfig::default(),
        }
    }

    /// Resolve the store token from the environment, first match wins.
    ///
    /// Missing credentials are a fatal startup error: the run must fail
    /// before any network activity.
    pub fn token_from_env() -> Result<String> {
        TOKEN_ENV_VARS
            .iter()
            .find_map(|name| env::var(name).ok().filter(|v| !v.is_empty()))
            .ok_or_else(|| {
                anyhow!(
                    "no store token found: set one of {}",
                    TOKEN_ENV_VARS.join(" or ")
                )
            })
    }
}
