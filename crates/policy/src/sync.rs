use tracing::{debug, info, warn};

use crate::{
    engine::{refresh, OfflineCachePolicy},
    error::{Error, ResultContext},
    host::{Cache, Host},
    request::Request,
};

impl<H: Host> OfflineCachePolicy<H> {
    /// Sync handler
    ///
    /// On the configured tag, re-fetches every entry in the shell store. Failed
    /// entries are logged and skipped. Returns how many entries were refreshed.
    pub async fn background_sync(&self, tag: &str) -> Result<usize, Error> {
        if tag != self.config.sync_tag {
            debug!("Ignoring sync tag {tag}");
            return Ok(0);
        }
        info!("Background sync triggered");

        let cache = self
            .host
            .open_cache(&self.config.shell_cache)
            .await
            .with_context(|| format!("cache::open({})", self.config.shell_cache))?;
        let keys = cache.keys().await.context("cache::keys")?;

        let mut refreshed = 0;
        for key in keys {
            let source = Request::get(key.clone());
            match refresh(&self.host, &cache, &source, std::slice::from_ref(&key)).await {
                Ok(()) => {
                    debug!("Background sync updated: {key}");
                    refreshed += 1;
                }
                Err(e) => warn!("Background sync failed for {key}: {e}"),
            }
        }

        Ok(refreshed)
    }
}
