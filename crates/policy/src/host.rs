//! The seam between the policy and the runtime it runs in
//!
//! In the browser these are backed by `CacheStorage`, `fetch` and `Clients`.
//! Everything is `?Send`: a worker is single threaded and its handles can't
//! leave the thread.

use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use http::StatusCode;
use url::Url;

use crate::{error::Error, request::Request, response::SyntheticResponse};

pub trait HttpResponse: Sized + 'static {
    fn status(&self) -> StatusCode;

    fn ok(&self) -> bool {
        self.status().is_success()
    }

    /// Copies the response so one copy can be stored and the other returned.
    /// The body can only be read once per copy.
    fn try_clone(&self) -> Result<Self, Error>;

    fn synthesize(response: SyntheticResponse) -> Result<Self, Error>;
}

/// One named cache store
#[async_trait(?Send)]
pub trait Cache: Clone + 'static {
    type Response: HttpResponse;

    async fn lookup(&self, key: &Url) -> Result<Option<Self::Response>, Error>;

    /// Replaces any existing entry for `key`
    async fn put(&self, key: &Url, response: Self::Response) -> Result<(), Error>;

    async fn keys(&self) -> Result<Vec<Url>, Error>;
}

#[async_trait(?Send)]
pub trait Host: Clone + 'static {
    type Response: HttpResponse;
    type Cache: Cache<Response = Self::Response>;

    /// Opens a store, creating it if it doesn't exist
    async fn open_cache(&self, name: &str) -> Result<Self::Cache, Error>;

    async fn cache_names(&self) -> Result<Vec<String>, Error>;

    /// Returns false if there was no store with that name
    async fn delete_cache(&self, name: &str) -> Result<bool, Error>;

    /// Fetches from the network. An `Err` means no response at all, a non-2xx
    /// response is still `Ok`.
    async fn fetch(&self, url: &Url) -> Result<Self::Response, Error>;

    /// Forwards an intercepted request to the network. Hosts that hold the
    /// page's own request send it as is, keeping its headers, credentials and
    /// redirect mode. The default fetches by url.
    async fn fetch_request(&self, request: &Request) -> Result<Self::Response, Error> {
        self.fetch(&request.url).await
    }

    /// Activates this worker without waiting for the old one's pages to close
    async fn skip_waiting(&self) -> Result<(), Error>;

    /// Takes control of every open page
    async fn claim_clients(&self) -> Result<(), Error>;

    /// Focuses an open page or opens a new one at `url`
    async fn focus_or_open_client(&self, url: &Url) -> Result<(), Error>;

    /// Runs `task` after the current handler returns. The task handles its own
    /// errors.
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);
}
