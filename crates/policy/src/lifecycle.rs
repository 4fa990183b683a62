use tracing::{error, info, warn};

use crate::{
    engine::OfflineCachePolicy,
    error::{Error, ResultContext},
    host::{Cache, Host},
};

impl<H: Host> OfflineCachePolicy<H> {
    /// Install handler
    ///
    /// Pre-caches the shell when configured to. A failed pre-cache is logged and
    /// doesn't stop the worker activating straight away.
    pub async fn install(&self) -> Result<(), Error> {
        info!("Installing {}", self.config.version);

        if self.config.precache_on_install {
            match self.precache_shell().await {
                Ok(count) => info!("Pre-cached {count} static assets"),
                Err(e) => error!("Error caching static assets: {e}"),
            }
        }

        self.host.skip_waiting().await.context("sw::skip_waiting")
    }

    /// Fetches every shell asset and only stores them once all have arrived
    async fn precache_shell(&self) -> Result<usize, Error> {
        let cache = self
            .host
            .open_cache(&self.config.shell_cache)
            .await
            .with_context(|| format!("cache::open({})", self.config.shell_cache))?;

        let mut fetched = Vec::with_capacity(self.config.shell_assets.len());
        for url in self.config.shell_asset_urls()? {
            let response = self.fetch_ok(&url).await?;
            fetched.push((url, response));
        }

        let count = fetched.len();
        for (url, response) in fetched {
            cache
                .put(&url, response)
                .await
                .with_context(|| format!("cache::put({url})"))?;
        }

        Ok(count)
    }

    /// Activate handler
    ///
    /// Deletes every store that doesn't belong to this version, then takes
    /// control of the open pages. Returns the names of the deleted stores.
    pub async fn activate(&self) -> Result<Vec<String>, Error> {
        info!("Activating {}", self.config.version);

        let names = match self.host.cache_names().await {
            Ok(names) => names,
            Err(e) => {
                error!("caches::keys: {e}");
                Vec::new()
            }
        };

        let mut deleted = Vec::new();
        for name in names.into_iter().filter(|n| !self.config.is_current_cache(n)) {
            match self.host.delete_cache(&name).await {
                Ok(true) => {
                    info!("Deleted old cache: {name}");
                    deleted.push(name);
                }
                Ok(false) => warn!("Old cache {name} was already gone"),
                Err(e) => error!("caches::delete({name}): {e}"),
            }
        }
        info!("Cache cleanup completed");

        self.host.claim_clients().await.context("sw::clients::claim")?;

        Ok(deleted)
    }
}
