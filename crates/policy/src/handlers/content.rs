use tracing::{debug, warn};

use crate::{
    engine::OfflineCachePolicy,
    error::Error,
    host::{Host, HttpResponse},
    request::Request,
    response::SyntheticResponse,
};

impl<H: Host> OfflineCachePolicy<H> {
    /// Cache first. Published documents and videos don't change so a stored
    /// entry is served forever without asking the network.
    pub(crate) async fn respond_content(&self, request: &Request) -> Result<H::Response, Error> {
        let cache = self.open_store(&self.config.content_cache).await;

        if let Some(cached) = self.lookup(cache.as_ref(), &request.url).await {
            debug!("Serving content from cache: {}", request.url);
            return Ok(cached);
        }

        debug!("Content not in cache, attempting network fetch: {}", request.url);
        match self.host.fetch_request(request).await {
            Ok(response) => {
                if response.ok() {
                    self.store_copy(cache.as_ref(), &request.url, &response).await;
                }
                Ok(response)
            }
            Err(e) => {
                warn!("Content request failed: {e}");
                self.synthesize(SyntheticResponse::content_unavailable(&request.url)?)
            }
        }
    }
}
