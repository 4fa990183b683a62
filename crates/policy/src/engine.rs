use std::rc::Rc;

use tracing::{debug, error, info, warn};
use url::Url;

use crate::{
    config::WorkerConfig,
    error::{Error, ResultContext},
    host::{Cache, Host, HttpResponse},
    request::Request,
    response::SyntheticResponse,
    route::{classify, Route, Strategy},
};

/// The offline caching policy bound to a host
///
/// Cheap to clone, the configuration is shared and hosts are handles.
#[derive(Debug, Clone)]
pub struct OfflineCachePolicy<H: Host> {
    pub(crate) config: Rc<WorkerConfig>,
    pub(crate) host: H,
}

impl<H: Host> OfflineCachePolicy<H> {
    pub fn new<C: Into<Rc<WorkerConfig>>>(config: C, host: H) -> Self {
        Self {
            config: config.into(),
            host,
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Decides synchronously whether the request is intercepted at all
    pub fn route(&self, request: &Request) -> Route {
        classify(&self.config, request)
    }

    pub async fn respond(&self, request: &Request, strategy: Strategy) -> Result<H::Response, Error> {
        match strategy {
            Strategy::CacheFirst => self.respond_content(request).await,
            Strategy::StaleWhileRevalidate => self.respond_static_asset(request).await,
            Strategy::AppShell => self.respond_app_shell(request).await,
        }
    }

    /// Classifies and answers a request. `None` means the request should go to
    /// the network untouched.
    pub async fn handle_fetch(&self, request: &Request) -> Result<Option<H::Response>, Error> {
        let route = self.route(request);
        debug!("fetch: {} {} -> {route:?}", request.method, request.url);

        match route.strategy() {
            Some(strategy) => Ok(Some(self.respond(request, strategy).await?)),
            None => Ok(None),
        }
    }

    /// Opens a store, logging and returning `None` on failure so the caller can
    /// carry on as if it were a miss
    pub(crate) async fn open_store(&self, name: &str) -> Option<H::Cache> {
        match self.host.open_cache(name).await {
            Ok(cache) => Some(cache),
            Err(e) => {
                error!("cache::open({name}): {e}");
                None
            }
        }
    }

    pub(crate) async fn lookup(&self, cache: Option<&H::Cache>, key: &Url) -> Option<H::Response> {
        let cache = cache?;
        match cache.lookup(key).await {
            Ok(Some(response)) => {
                debug!("HIT: {key}");
                Some(response)
            }
            Ok(None) => {
                debug!("MISS: {key}");
                None
            }
            Err(e) => {
                error!("cache::match({key}): {e}");
                None
            }
        }
    }

    /// Stores a copy of `response`. Failures only affect the cache, never the
    /// response being returned.
    pub(crate) async fn store_copy(&self, cache: Option<&H::Cache>, key: &Url, response: &H::Response) {
        let Some(cache) = cache else {
            return;
        };

        let stored = match response.try_clone() {
            Ok(copy) => cache.put(key, copy).await,
            Err(e) => Err(e),
        };

        match stored {
            Ok(()) => debug!("Cached: {key}"),
            Err(e) => error!("cache::put({key}): {e}"),
        }
    }

    pub(crate) async fn fetch_ok(&self, url: &Url) -> Result<H::Response, Error> {
        fetch_ok(&self.host, url).await
    }

    /// Fetches `source` after the current request has been answered and stores
    /// the result under every key in `keys`
    pub(crate) fn spawn_refresh(&self, cache: H::Cache, source: Request, keys: Vec<Url>) {
        let host = self.host.clone();
        self.host.spawn(Box::pin(async move {
            match refresh(&host, &cache, &source, &keys).await {
                Ok(()) => info!("Background update successful: {}", source.url),
                Err(e) if e.is_network() => {
                    warn!("Background update failed, continuing with cached version: {e}")
                }
                Err(e) => error!("Background update couldn't be stored: {e}"),
            }
        }));
    }

    pub(crate) fn synthesize(&self, response: SyntheticResponse) -> Result<H::Response, Error> {
        <H::Response as HttpResponse>::synthesize(response).context("Building synthetic response")
    }
}

/// Fetches `url`, treating anything but a 2xx as an error
pub(crate) async fn fetch_ok<H: Host>(host: &H, url: &Url) -> Result<H::Response, Error> {
    ensure_ok(url, host.fetch(url).await?)
}

/// Treats anything but a 2xx as an error
fn ensure_ok<R: HttpResponse>(url: &Url, response: R) -> Result<R, Error> {
    if response.ok() {
        Ok(response)
    } else {
        Err(Error::Status {
            url: url.to_string(),
            status: response.status(),
        })
    }
}

/// Forwards `source` and stores the response under each of `keys`
pub(crate) async fn refresh<H: Host>(
    host: &H,
    cache: &H::Cache,
    source: &Request,
    keys: &[Url],
) -> Result<(), Error> {
    let response = ensure_ok(&source.url, host.fetch_request(source).await?)?;
    for key in keys {
        cache
            .put(key, response.try_clone()?)
            .await
            .with_context(|| format!("cache::put({key})"))?;
    }
    Ok(())
}
