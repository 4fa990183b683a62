use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{
    engine::OfflineCachePolicy,
    error::{Error, ResultContext},
    host::{Cache, Host},
};

/// Commands a controlled page can post to the worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerMessage {
    /// Activate now instead of waiting for the old worker's pages to close
    SkipWaiting,
    /// Store the urls in the content cache
    CacheUrls { urls: Vec<String> },
}

impl WorkerMessage {
    pub fn from_json(value: serde_json::Value) -> Result<Self, Error> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Posted back on the message's reply port after `CACHE_URLS`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheUrlsReply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CacheUrlsReply {
    pub fn success() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failure(error: &Error) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
        }
    }
}

impl<H: Host> OfflineCachePolicy<H> {
    /// Message handler. Returns the reply to post back, if the message has one.
    pub async fn handle_message(&self, message: WorkerMessage) -> Option<CacheUrlsReply> {
        match message {
            WorkerMessage::SkipWaiting => {
                info!("worker_message got SKIP_WAITING");
                if let Err(e) = self.host.skip_waiting().await {
                    error!("sw::skip_waiting: {e}");
                }
                None
            }
            WorkerMessage::CacheUrls { urls } => {
                let reply = match self.cache_urls(&urls).await {
                    Ok(()) => CacheUrlsReply::success(),
                    Err(e) => {
                        error!("Error caching URLs: {e}");
                        CacheUrlsReply::failure(&e)
                    }
                };
                Some(reply)
            }
        }
    }

    /// Fetches and stores each url in order, stopping at the first failure
    async fn cache_urls(&self, urls: &[String]) -> Result<(), Error> {
        let cache = self
            .host
            .open_cache(&self.config.content_cache)
            .await
            .with_context(|| format!("cache::open({})", self.config.content_cache))?;

        for url in urls {
            let url = self.config.resolve_relative(url)?;
            let response = self.fetch_ok(&url).await?;
            cache
                .put(&url, response)
                .await
                .with_context(|| format!("cache::put({url})"))?;
            debug!("Successfully cached: {url}");
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use futures::executor::block_on;
    use http::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::{
        memory::{MemoryHost, MemoryResponse, WorkerState},
        test_support::policy,
    };

    #[test]
    fn test_message_wire_format() {
        assert_eq!(
            WorkerMessage::from_json(json!({ "type": "SKIP_WAITING" })).unwrap(),
            WorkerMessage::SkipWaiting
        );
        assert_eq!(
            WorkerMessage::from_json(json!({ "type": "CACHE_URLS", "urls": ["/documents/a.pdf"] }))
                .unwrap(),
            WorkerMessage::CacheUrls {
                urls: vec!["/documents/a.pdf".to_string()]
            }
        );
        assert!(WorkerMessage::from_json(json!({ "type": "CLEAR_EVERYTHING" })).is_err());
        assert!(WorkerMessage::from_json(json!("SKIP")).is_err());
    }

    #[test]
    fn test_reply_wire_format() {
        assert_eq!(
            serde_json::to_value(CacheUrlsReply::success()).unwrap(),
            json!({ "success": true })
        );
        assert_eq!(
            serde_json::to_value(CacheUrlsReply::failure(&Error::host("boom"))).unwrap(),
            json!({ "success": false, "error": "Host error: boom" })
        );
    }

    #[test]
    fn test_skip_waiting_activates_waiting_worker() {
        let host = MemoryHost::new();
        host.set_state(WorkerState::Waiting);
        let policy = policy(&host, "/service-worker.js");

        let reply = block_on(policy.handle_message(WorkerMessage::SkipWaiting));

        assert_eq!(reply, None);
        assert_eq!(host.state(), WorkerState::Active);
    }

    #[test]
    fn test_cache_urls_stores_in_content_cache() {
        let host = MemoryHost::new();
        let policy = policy(&host, "/hub/service-worker.js");
        let urls = ["/hub/documents/a.pdf", "/hub/videos/b.mp4"];
        for url in urls {
            host.serve(&policy.config().resolve(url).unwrap(), MemoryResponse::with_body(url));
        }

        let reply = block_on(policy.handle_message(WorkerMessage::CacheUrls {
            urls: urls.iter().map(|u| u.to_string()).collect(),
        }));

        assert_eq!(reply, Some(CacheUrlsReply::success()));
        for url in urls {
            let key = policy.config().resolve(url).unwrap();
            let stored = host.entry(&policy.config().content_cache, &key).unwrap();
            assert_eq!(stored.text(), url);
        }
    }

    #[test]
    fn test_relative_cache_urls_land_under_base_path() {
        let host = MemoryHost::new();
        let policy = policy(&host, "/hub/service-worker.js");
        let url = policy.config().resolve("/hub/documents/a.pdf").unwrap();
        host.serve(&url, MemoryResponse::with_body("handbook"));

        let reply = block_on(policy.handle_message(WorkerMessage::CacheUrls {
            urls: vec!["documents/a.pdf".to_string()],
        }));
        assert_eq!(reply, Some(CacheUrlsReply::success()));

        // Offline, the content handler finds what the message stored
        host.unserve(&url);
        let response = block_on(policy.handle_fetch(&crate::Request::get(url)))
            .unwrap()
            .unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.text(), "handbook");
    }

    #[test]
    fn test_cache_urls_fails_batch_on_404() {
        let host = MemoryHost::new();
        let policy = policy(&host, "/service-worker.js");
        let urls = ["/documents/1.pdf", "/documents/2.pdf", "/documents/3.pdf"];
        host.serve(
            &policy.config().resolve(urls[0]).unwrap(),
            MemoryResponse::with_body("one"),
        );
        host.serve(
            &policy.config().resolve(urls[1]).unwrap(),
            MemoryResponse::with_status(StatusCode::NOT_FOUND),
        );
        host.serve(
            &policy.config().resolve(urls[2]).unwrap(),
            MemoryResponse::with_body("three"),
        );

        let reply = block_on(policy.handle_message(WorkerMessage::CacheUrls {
            urls: urls.iter().map(|u| u.to_string()).collect(),
        }))
        .unwrap();

        assert!(!reply.success);
        assert_eq!(reply.error.as_deref(), Some("HTTP 404: Not Found"));

        // The batch stops at the failure
        let third = policy.config().resolve(urls[2]).unwrap();
        assert!(host.entry(&policy.config().content_cache, &third).is_none());
        assert_eq!(host.fetches().len(), 2);
    }

    #[test]
    fn test_cache_urls_offline() {
        let host = MemoryHost::new();
        let policy = policy(&host, "/service-worker.js");

        let reply = block_on(policy.handle_message(WorkerMessage::CacheUrls {
            urls: vec!["/videos/x.mp4".to_string()],
        }))
        .unwrap();

        assert!(!reply.success);
        assert!(reply.error.unwrap().starts_with("Network error fetching"));
    }
}
