//! Pipeline orchestration
//!
//! One code path covers both publishing modes: merge-and-publish and
//! validate-merge-and-publish differ only in whether the liveness stage runs,
//! selected by [`Config::validate`]. A third, much smaller mode uploads the
//! raw scraper files verbatim. Every mode ends with a best-effort cleanup of
//! the local input files, whatever happened before.

use crate::config::Config;
use crate::proxy::{merge, ArtifactRenderer, ProxyChecker, ProxyParser};
use crate::store::{GithubStore, StoreError};
use crate::Result;
use anyhow::{ensure, Context};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Remote path of the line-record artifact
pub const RECORD_ARTIFACT: &str = "proxyinfo.json";

/// Remote path of the address-pair artifact
pub const PAIR_ARTIFACT: &str = "proxyinfo.txt";

/// Remote path of the grouped artifact
pub const GROUPED_ARTIFACT: &str = "db.json";

/// Orchestrator for one run against one remote store
pub struct Pipeline {
    config: Config,
    store: GithubStore,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self> {
        let store = GithubStore::new(&config.owner, &config.repo, &config.token)?;
        Ok(Self { config, store })
    }

    /// Override the remote store client. Used by tests.
    pub fn with_store(mut self, store: GithubStore) -> Self {
        self.store = store;
        self
    }

    /// Merge the scraped batch into the published set, optionally validate,
    /// and publish all three artifacts.
    pub async fn sync(&self) -> Result<()> {
        let result = self.sync_inner().await;
        self.cleanup();
        result
    }

    /// Upload the raw scraper files verbatim, without parsing or merging.
    pub async fn passthrough(&self) -> Result<()> {
        let result = self.passthrough_inner().await;
        self.cleanup();
        result
    }

    async fn sync_inner(&self) -> Result<()> {
        info!("Starting merge and publish run");

        // A failed download degrades to an empty published set; the run can
        // still rebuild everything from the scraped batch.
        let existing_text = match self.store.get(RECORD_ARTIFACT).await {
            Ok(text) => text,
            Err(StoreError::NotFound) => {
                info!("No published {RECORD_ARTIFACT} yet, starting from scratch");
                String::new()
            }
            Err(e) => {
                warn!("Could not download published data ({e}), starting from scratch");
                String::new()
            }
        };
        let existing = ProxyParser::parse_record_lines(&existing_text);
        info!("Found {} published proxies", existing.len());

        let input_text = fs::read_to_string(&self.config.input_file)
            .with_context(|| format!("missing input file {:?}", self.config.input_file))?;
        let incoming = ProxyParser::parse_record_lines(&input_text);
        info!("Found {} scraped proxies", incoming.len());

        let canonical = merge(existing, incoming);
        info!("Merged to {} unique proxies", canonical.len());

        let (canonical, message) = if self.config.validate {
            let checker = ProxyChecker::with_config(self.config.checker.clone());
            let valid = checker.validate(canonical).await;
            ensure!(
                !valid.is_empty(),
                "no proxies survived validation, nothing to publish"
            );
            (valid, "Update validated proxy list")
        } else {
            (canonical, "Merge and update proxy list")
        };

        let record_lines = ArtifactRenderer::record_lines(&canonical)?;
        let pair_lines = ArtifactRenderer::host_port_lines(&canonical);
        let grouped = ArtifactRenderer::grouped_json(&canonical)?;

        self.publish(RECORD_ARTIFACT, &record_lines, message).await?;
        self.publish(PAIR_ARTIFACT, &pair_lines, message).await?;
        self.publish(GROUPED_ARTIFACT, &grouped, message).await?;

        info!("Published {} proxies", canonical.len());
        Ok(())
    }

    async fn passthrough_inner(&self) -> Result<()> {
        info!("Starting raw upload run");

        let uploads = [
            (&self.config.raw_file, "proxy.list", "Update proxy list"),
            (
                &self.config.input_file,
                "proxy.list.out",
                "Update proxy list output",
            ),
        ];

        for (local, remote, message) in uploads {
            if !local.exists() {
                continue;
            }
            let content = fs::read_to_string(local)
                .with_context(|| format!("could not read {local:?}"))?;
            self.publish(remote, &content, message).await?;
        }

        Ok(())
    }

    async fn publish(&self, path: &str, content: &str, message: &str) -> Result<()> {
        info!("Publishing {path}...");
        let outcome = self
            .store
            .publish(path, content, message)
            .await
            .with_context(|| format!("failed to publish {path}"))?;
        info!("{outcome} {path}");
        Ok(())
    }

    /// Delete the local input files. Best effort only: the scraper rewrites
    /// them next run, so a failed delete is logged and ignored.
    fn cleanup(&self) {
        for path in [&self.config.raw_file, &self.config.input_file] {
            remove_if_present(path);
        }
    }
}

fn remove_if_present(path: &Path) {
    if !path.exists() {
        return;
    }
    match fs::remove_file(path) {
        Ok(()) => info!("Deleted {path:?}"),
        Err(e) => warn!("Could not delete {path:?}: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_paths() {
        assert_eq!(RECORD_ARTIFACT, "proxyinfo.json");
        assert_eq!(PAIR_ARTIFACT, "proxyinfo.txt");
        assert_eq!(GROUPED_ARTIFACT, "db.json");
    }

    #[test]
    fn test_remove_if_present_ignores_missing() {
        remove_if_present(Path::new("definitely-not-here.list"));
    }
}
