use tracing::{debug, warn};

use crate::{
    engine::OfflineCachePolicy,
    error::Error,
    host::{Host, HttpResponse},
    request::Request,
    response::SyntheticResponse,
};

impl<H: Host> OfflineCachePolicy<H> {
    /// Answers any other same-origin request with the cached app shell, which
    /// does its own client side routing
    pub(crate) async fn respond_app_shell(&self, request: &Request) -> Result<H::Response, Error> {
        let cache = self.open_store(&self.config.shell_cache).await;
        let document_keys = self.config.shell_document_keys()?;

        for key in self.config.app_shell_lookup_keys()? {
            if let Some(cached) = self.lookup(cache.as_ref(), &key).await {
                debug!("Serving app from cache ({key}) for {}", request.url);
                if let Some(cache) = cache {
                    self.spawn_refresh(cache, request.clone(), document_keys);
                }
                return Ok(cached);
            }
        }

        debug!("App not in cache, fetching from network: {}", request.url);
        match self.host.fetch_request(request).await {
            Ok(response) => {
                if response.ok() {
                    for key in &document_keys {
                        self.store_copy(cache.as_ref(), key, &response).await;
                    }
                }
                Ok(response)
            }
            Err(e) => {
                warn!("App request failed: {e}");
                self.synthesize(SyntheticResponse::offline_page())
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
        test_support::{policy, HUB},
        Request,
    };

    #[test]
    fn test_lookup_order_under_base_path() {
        let host = MemoryHost::new();
        let policy = policy(&host, "/app/service-worker.js");
        let url = policy.config().resolve("/app/lessons/3").unwrap();

        block_on(policy.handle_fetch(&Request::navigate(url))).unwrap();

        assert_eq!(
            host.lookups(),
            [
                format!("{HUB}/app/index.html"),
                format!("{HUB}/app/"),
                format!("{HUB}/index.html"),
                format!("{HUB}/"),
            ]
        );
    }

    #[test]
    fn test_prefers_versioned_document_over_root() {
        let host = MemoryHost::new();
        let policy = policy(&host, "/app/service-worker.js");
        let shell = policy.config().shell_cache.clone();

        host.seed(
            &shell,
            &policy.config().resolve("/app/").unwrap(),
            MemoryResponse::with_body("root"),
        );
        host.seed(
            &shell,
            &policy.config().resolve("/app/index.html").unwrap(),
            MemoryResponse::with_body("document"),
        );

        let url = policy.config().resolve("/app/settings").unwrap();
        let response = block_on(policy.handle_fetch(&Request::navigate(url)))
            .unwrap()
            .unwrap();

        assert_eq!(response.text(), "document");
        assert_eq!(host.lookups().len(), 1);
    }

    #[test]
    fn test_falls_back_to_unprefixed_root() {
        let host = MemoryHost::new();
        let policy = policy(&host, "/app/service-worker.js");
        let shell = policy.config().shell_cache.clone();

        host.seed(
            &shell,
            &policy.config().resolve("/").unwrap(),
            MemoryResponse::with_body("unprefixed"),
        );

        let url = policy.config().resolve("/app/settings").unwrap();
        let response = block_on(policy.handle_fetch(&Request::navigate(url)))
            .unwrap()
            .unwrap();

        assert_eq!(response.text(), "unprefixed");
    }

    #[test]
    fn test_hit_refreshes_both_document_keys() {
        let host = MemoryHost::new();
        let policy = policy(&host, "/app/service-worker.js");
        let shell = policy.config().shell_cache.clone();
        let document = policy.config().resolve("/app/index.html").unwrap();
        let root = policy.config().resolve("/app/").unwrap();
        let url = policy.config().resolve("/app/lessons/3").unwrap();

        host.seed(&shell, &document, MemoryResponse::with_body("old"));
        host.serve(&url, MemoryResponse::with_body("new"));

        let response = block_on(policy.handle_fetch(&Request::navigate(url)))
            .unwrap()
            .unwrap();
        assert_eq!(response.text(), "old");

        block_on(host.run_background());

        assert_eq!(host.entry(&shell, &document).unwrap().text(), "new");
        assert_eq!(host.entry(&shell, &root).unwrap().text(), "new");
    }

    #[test]
    fn test_miss_stores_under_both_keys() {
        let host = MemoryHost::new();
        let policy = policy(&host, "/service-worker.js");
        let shell = policy.config().shell_cache.clone();
        let url = policy.config().resolve("/course/9").unwrap();
        host.serve(&url, MemoryResponse::with_body("shell"));

        let response = block_on(policy.handle_fetch(&Request::navigate(url)))
            .unwrap()
            .unwrap();
        assert_eq!(response.text(), "shell");

        for path in ["/index.html", "/"] {
            let key = policy.config().resolve(path).unwrap();
            assert_eq!(host.entry(&shell, &key).unwrap().text(), "shell");
        }
    }

    #[test]
    fn test_no_network_no_cache_is_offline_page() {
        let host = MemoryHost::new();
        let policy = policy(&host, "/service-worker.js");
        let url = policy.config().resolve("/course/9").unwrap();

        let response = block_on(policy.handle_fetch(&Request::navigate(url)))
            .unwrap()
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.headers[CACHE_CONTROL], "no-cache");
        assert!(response.text().contains("<button onclick=\"location.reload()\">"));
        assert_eq!(host.pending_tasks(), 0);
    }

    #[test]
    fn test_forwards_the_intercepted_request() {
        let host = MemoryHost::new();
        let policy = policy(&host, "/service-worker.js");
        let url = policy.config().resolve("/course/9").unwrap();
        host.serve(&url, MemoryResponse::with_body("shell"));
        let request = Request::navigate(url);

        block_on(policy.handle_fetch(&request)).unwrap();
        assert_eq!(host.forwarded(), [request.clone()]);

        // The background refresh after a hit forwards it again
        block_on(policy.handle_fetch(&request)).unwrap();
        block_on(host.run_background());
        assert_eq!(host.forwarded(), [request.clone(), request]);
    }
}
