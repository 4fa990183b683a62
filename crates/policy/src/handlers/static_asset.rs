use tracing::{debug, warn};

use crate::{
    engine::OfflineCachePolicy,
    error::Error,
    host::{Host, HttpResponse},
    request::Request,
    response::SyntheticResponse,
};

impl<H: Host> OfflineCachePolicy<H> {
    /// Stale-while-revalidate for the shell assets
    pub(crate) async fn respond_static_asset(&self, request: &Request) -> Result<H::Response, Error> {
        let cache = self.open_store(&self.config.shell_cache).await;

        if let Some(cached) = self.lookup(cache.as_ref(), &request.url).await {
            debug!("Serving static asset from cache: {}", request.url);

            if let Some(cache) = cache.filter(|_| self.config.is_refresh_eligible(request.path())) {
                self.spawn_refresh(cache, request.clone(), vec![request.url.clone()]);
            }

            return Ok(cached);
        }

        debug!("Static asset not in cache, fetching from network: {}", request.url);
        match self.host.fetch_request(request).await {
            Ok(response) => {
                if response.ok() {
                    self.store_copy(cache.as_ref(), &request.url, &response).await;
                }
                Ok(response)
            }
            Err(e) => {
                warn!("Static asset request failed: {e}");

                // Another request may have filled the cache in the meantime
                if let Some(cached) = self.lookup(cache.as_ref(), &request.url).await {
                    return Ok(cached);
                }

                if self.config.expects_document(request) {
                    self.synthesize(SyntheticResponse::offline_page())
                } else {
                    self.synthesize(SyntheticResponse::asset_unavailable())
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use futures::executor::block_on;
    use http::{header::CACHE_CONTROL, StatusCode};

    use crate::{
        memory::{MemoryHost, MemoryResponse},
        test_support::policy,
        Request,
    };

    #[test]
    fn test_hit_is_served_before_refresh_completes() {
        let host = MemoryHost::new();
        let policy = policy(&host, "/service-worker.js");
        let shell = policy.config().shell_cache.clone();
        let url = policy.config().resolve("/index.html").unwrap();

        host.seed(&shell, &url, MemoryResponse::with_body("old shell"));
        host.serve(&url, MemoryResponse::with_body("new shell"));

        let response = block_on(policy.handle_fetch(&Request::get(url.clone())))
            .unwrap()
            .unwrap();

        // Answered from the cache, the refresh hasn't run yet
        assert_eq!(response.text(), "old shell");
        assert_eq!(host.pending_tasks(), 1);
        assert!(host.fetches().is_empty());
        assert_eq!(host.entry(&shell, &url).unwrap().text(), "old shell");

        block_on(host.run_background());

        // Only the next request sees the refreshed copy
        assert_eq!(host.entry(&shell, &url).unwrap().text(), "new shell");
        let next = block_on(policy.handle_fetch(&Request::get(url.clone())))
            .unwrap()
            .unwrap();
        assert_eq!(next.text(), "new shell");
    }

    #[test]
    fn test_non_root_assets_are_not_refreshed() {
        let host = MemoryHost::new();
        let policy = policy(&host, "/service-worker.js");
        let shell = policy.config().shell_cache.clone();
        let url = policy.config().resolve("/manifest.json").unwrap();

        host.seed(&shell, &url, MemoryResponse::with_body("{}"));

        block_on(policy.handle_fetch(&Request::get(url))).unwrap();

        assert_eq!(host.pending_tasks(), 0);
        assert!(host.fetches().is_empty());
    }

    #[test]
    fn test_failed_refresh_keeps_cached_copy() {
        let host = MemoryHost::new();
        let policy = policy(&host, "/hub/service-worker.js");
        let shell = policy.config().shell_cache.clone();
        let url = policy.config().resolve("/hub/").unwrap();

        host.seed(&shell, &url, MemoryResponse::with_body("cached root"));
        host.serve(&url, MemoryResponse::with_status(StatusCode::BAD_GATEWAY));

        let response = block_on(policy.handle_fetch(&Request::get(url.clone())))
            .unwrap()
            .unwrap();
        assert_eq!(response.text(), "cached root");

        block_on(host.run_background());
        assert_eq!(host.entry(&shell, &url).unwrap().text(), "cached root");
    }

    #[test]
    fn test_miss_fetches_and_stores() {
        let host = MemoryHost::new();
        let policy = policy(&host, "/service-worker.js");
        let shell = policy.config().shell_cache.clone();
        let url = policy.config().resolve("/documents.json").unwrap();
        host.serve(&url, MemoryResponse::with_body("[]"));

        let response = block_on(policy.handle_fetch(&Request::get(url.clone())))
            .unwrap()
            .unwrap();

        assert_eq!(response.text(), "[]");
        assert_eq!(host.entry(&shell, &url).unwrap().text(), "[]");
    }

    #[test]
    fn test_offline_document_gets_offline_page() {
        let host = MemoryHost::new();
        let policy = policy(&host, "/service-worker.js");
        let url = policy.config().resolve("/index.html").unwrap();

        let response = block_on(policy.handle_fetch(&Request::get(url)))
            .unwrap()
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.headers[CACHE_CONTROL], "no-cache");
        assert!(response.text().contains("location.reload()"));
    }

    #[test]
    fn test_offline_asset_gets_503() {
        let host = MemoryHost::new();
        let policy = policy(&host, "/service-worker.js");
        let url = policy.config().resolve("/icons/icon-192x192.png").unwrap();

        let response = block_on(policy.handle_fetch(&Request::get(url)))
            .unwrap()
            .unwrap();

        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.text(), "Resource not available offline");
    }

    #[test]
    fn test_failed_fetch_rechecks_cache() {
        let host = MemoryHost::new();
        let policy = policy(&host, "/service-worker.js");
        let shell = policy.config().shell_cache.clone();
        let url = policy.config().resolve("/manifest.json").unwrap();

        // Filled by another request while this one was on the network
        host.fill_on_fetch(&url, &shell, MemoryResponse::with_body("{\"name\":\"hub\"}"));

        let response = block_on(policy.handle_fetch(&Request::get(url.clone())))
            .unwrap()
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.text(), "{\"name\":\"hub\"}");
        assert_eq!(host.lookups(), [url.to_string(), url.to_string()]);
    }

    #[test]
    fn test_failed_open_is_a_miss() {
        let host = MemoryHost::new();
        let policy = policy(&host, "/service-worker.js");
        let url = policy.config().resolve("/documents.json").unwrap();
        host.serve(&url, MemoryResponse::with_body("[]"));
        host.set_open_failing(true);

        let response = block_on(policy.handle_fetch(&Request::get(url.clone())))
            .unwrap()
            .unwrap();
        assert_eq!(response.text(), "[]");
        assert!(host.lookups().is_empty());

        // Offline too, the page still gets an answer
        host.unserve(&url);
        let response = block_on(policy.handle_fetch(&Request::get(url)))
            .unwrap()
            .unwrap();
        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
