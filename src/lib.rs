//! Proxy Sync - merge, validate and publish proxy lists
//!
//! This crate keeps a deduplicated, periodically revalidated proxy list in a
//! remote repository used as a plain data store. Each run reconciles a
//! freshly scraped batch against the previously published canonical set,
//! optionally probes every candidate's liveness, and publishes three derived
//! artifacts.

pub mod config;
pub mod pipeline;
pub mod proxy;
pub mod store;

pub use config::Config;
pub use pipeline::Pipeline;
pub use proxy::*;

/// Application result type
pub type Result<T> = anyhow::Result<T>;
