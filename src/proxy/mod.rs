//! Proxy module for parsing, merging, checking and rendering proxy lists
//!
//! This module provides functionality for:
//! - Parsing proxies from raw text (JSON lines and HOST:PORT pairs)
//! - Merging a scraped batch into the previously published canonical set
//! - Checking proxy liveness with bounded concurrency
//! - Rendering the canonical set into the published artifacts

pub mod checker;
pub mod merge;
pub mod models;
pub mod parser;
pub mod render;

pub use checker::{CheckerConfig, ProxyChecker};
pub use merge::merge;
pub use models::Proxy;
pub use parser::ProxyParser;
pub use render::ArtifactRenderer;
