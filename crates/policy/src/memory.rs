//! A [`Host`] that keeps everything in memory
//!
//! The network is a table of canned responses; any url without one behaves as
//! if the device were offline. Spawned tasks are queued rather than run so a
//! test decides exactly when background work happens with
//! [`MemoryHost::run_background`].

use std::{
    cell::{Cell, RefCell},
    collections::{BTreeMap, HashMap},
    rc::Rc,
};

use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use http::{HeaderMap, HeaderName, StatusCode};
use url::Url;

use crate::{
    error::Error,
    host::{Cache, Host, HttpResponse},
    request::Request,
    response::SyntheticResponse,
};

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl MemoryResponse {
    pub fn new<B: Into<Vec<u8>>>(status: StatusCode, body: B) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// A 200 with `body`
    pub fn with_body<B: Into<Vec<u8>>>(body: B) -> Self {
        Self::new(StatusCode::OK, body)
    }

    pub fn with_status(status: StatusCode) -> Self {
        Self::new(status, status.canonical_reason().unwrap_or_default())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn header(&self, name: HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl HttpResponse for MemoryResponse {
    fn status(&self) -> StatusCode {
        self.status
    }

    fn try_clone(&self) -> Result<Self, Error> {
        Ok(self.clone())
    }

    fn synthesize(response: SyntheticResponse) -> Result<Self, Error> {
        Ok(Self {
            status: response.status,
            headers: response.headers,
            body: response.body.into_bytes(),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WorkerState {
    #[default]
    Installing,
    /// Installed but another worker still controls the pages
    Waiting,
    Active,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    entries: Rc<RefCell<BTreeMap<String, MemoryResponse>>>,
    lookups: Rc<RefCell<Vec<String>>>,
    storage_failing: Rc<Cell<bool>>,
}

#[async_trait(?Send)]
impl Cache for MemoryCache {
    type Response = MemoryResponse;

    async fn lookup(&self, key: &Url) -> Result<Option<MemoryResponse>, Error> {
        self.lookups.borrow_mut().push(key.to_string());
        Ok(self.entries.borrow().get(key.as_str()).cloned())
    }

    async fn put(&self, key: &Url, response: MemoryResponse) -> Result<(), Error> {
        if self.storage_failing.get() {
            return Err(Error::storage("QuotaExceededError"));
        }
        self.entries.borrow_mut().insert(key.to_string(), response);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<Url>, Error> {
        self.entries
            .borrow()
            .keys()
            .map(|k| Url::parse(k).map_err(Error::from))
            .collect()
    }
}

#[derive(Default)]
struct Inner {
    caches: RefCell<BTreeMap<String, MemoryCache>>,
    network: RefCell<HashMap<String, MemoryResponse>>,
    fetches: RefCell<Vec<String>>,
    forwarded: RefCell<Vec<Request>>,
    /// url -> (store, entry) written when that url is fetched
    fill_on_fetch: RefCell<HashMap<String, (String, MemoryResponse)>>,
    open_failing: Cell<bool>,
    lookups: Rc<RefCell<Vec<String>>>,
    storage_failing: Rc<Cell<bool>>,
    state: Cell<WorkerState>,
    clients_claimed: Cell<bool>,
    windows: RefCell<Vec<String>>,
    focused: RefCell<Option<String>>,
    tasks: RefCell<Vec<LocalBoxFuture<'static, ()>>>,
}

#[derive(Clone, Default)]
pub struct MemoryHost {
    inner: Rc<Inner>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the network answer `url` with `response` from now on
    pub fn serve(&self, url: &Url, response: MemoryResponse) {
        self.inner.network.borrow_mut().insert(url.to_string(), response);
    }

    /// Makes `url` unreachable again
    pub fn unserve(&self, url: &Url) {
        self.inner.network.borrow_mut().remove(url.as_str());
    }

    /// Urls passed to `fetch`, including the ones that failed
    pub fn fetches(&self) -> Vec<String> {
        self.inner.fetches.borrow().clone()
    }

    /// Intercepted requests forwarded with `fetch_request`, in order
    pub fn forwarded(&self) -> Vec<Request> {
        self.inner.forwarded.borrow().clone()
    }

    /// Stores `response` under `url` in `cache_name` when `url` is next
    /// fetched, as if another request filled the cache in the meantime
    pub fn fill_on_fetch(&self, url: &Url, cache_name: &str, response: MemoryResponse) {
        self.inner
            .fill_on_fetch
            .borrow_mut()
            .insert(url.to_string(), (cache_name.to_string(), response));
    }

    /// Keys looked up in any cache, in order
    pub fn lookups(&self) -> Vec<String> {
        self.inner.lookups.borrow().clone()
    }

    /// Stores an entry directly, creating the cache if needed
    pub fn seed(&self, cache_name: &str, url: &Url, response: MemoryResponse) {
        self.cache(cache_name)
            .entries
            .borrow_mut()
            .insert(url.to_string(), response);
    }

    pub fn entry(&self, cache_name: &str, url: &Url) -> Option<MemoryResponse> {
        let caches = self.inner.caches.borrow();
        let cache = caches.get(cache_name)?;
        let entry = cache.entries.borrow().get(url.as_str()).cloned();
        entry
    }

    pub fn cache_names_now(&self) -> Vec<String> {
        self.inner.caches.borrow().keys().cloned().collect()
    }

    /// Makes every `put` fail
    pub fn set_storage_failing(&self, failing: bool) {
        self.inner.storage_failing.set(failing);
    }

    /// Makes every `open_cache` fail
    pub fn set_open_failing(&self, failing: bool) {
        self.inner.open_failing.set(failing);
    }

    pub fn state(&self) -> WorkerState {
        self.inner.state.get()
    }

    pub fn set_state(&self, state: WorkerState) {
        self.inner.state.set(state);
    }

    pub fn clients_claimed(&self) -> bool {
        self.inner.clients_claimed.get()
    }

    pub fn add_window(&self, url: &str) {
        self.inner.windows.borrow_mut().push(url.to_string());
    }

    pub fn windows(&self) -> Vec<String> {
        self.inner.windows.borrow().clone()
    }

    pub fn focused(&self) -> Option<String> {
        self.inner.focused.borrow().clone()
    }

    pub fn pending_tasks(&self) -> usize {
        self.inner.tasks.borrow().len()
    }

    /// Runs queued background tasks, including any they spawn, until none are
    /// left. Returns how many ran.
    pub async fn run_background(&self) -> usize {
        let mut ran = 0;
        loop {
            let pending: Vec<_> = self.inner.tasks.borrow_mut().drain(..).collect();
            if pending.is_empty() {
                return ran;
            }
            for task in pending {
                task.await;
                ran += 1;
            }
        }
    }

    fn cache(&self, name: &str) -> MemoryCache {
        self.inner
            .caches
            .borrow_mut()
            .entry(name.to_string())
            .or_insert_with(|| MemoryCache {
                entries: Default::default(),
                lookups: self.inner.lookups.clone(),
                storage_failing: self.inner.storage_failing.clone(),
            })
            .clone()
    }
}

#[async_trait(?Send)]
impl Host for MemoryHost {
    type Response = MemoryResponse;
    type Cache = MemoryCache;

    async fn open_cache(&self, name: &str) -> Result<MemoryCache, Error> {
        if self.inner.open_failing.get() {
            return Err(Error::storage(format!("SecurityError opening {name}")));
        }
        Ok(self.cache(name))
    }

    async fn cache_names(&self) -> Result<Vec<String>, Error> {
        Ok(self.cache_names_now())
    }

    async fn delete_cache(&self, name: &str) -> Result<bool, Error> {
        Ok(self.inner.caches.borrow_mut().remove(name).is_some())
    }

    async fn fetch(&self, url: &Url) -> Result<MemoryResponse, Error> {
        self.inner.fetches.borrow_mut().push(url.to_string());

        let fill = self.inner.fill_on_fetch.borrow_mut().remove(url.as_str());
        if let Some((cache_name, response)) = fill {
            self.seed(&cache_name, url, response);
        }

        self.inner
            .network
            .borrow()
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| Error::Network {
                url: url.to_string(),
                message: "offline".to_string(),
            })
    }

    async fn fetch_request(&self, request: &Request) -> Result<MemoryResponse, Error> {
        self.inner.forwarded.borrow_mut().push(request.clone());
        self.fetch(&request.url).await
    }

    async fn skip_waiting(&self) -> Result<(), Error> {
        self.inner.state.set(WorkerState::Active);
        Ok(())
    }

    async fn claim_clients(&self) -> Result<(), Error> {
        self.inner.clients_claimed.set(true);
        Ok(())
    }

    async fn focus_or_open_client(&self, url: &Url) -> Result<(), Error> {
        let mut windows = self.inner.windows.borrow_mut();
        if windows.is_empty() {
            windows.push(url.to_string());
        }
        *self.inner.focused.borrow_mut() = windows.first().cloned();
        Ok(())
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        self.inner.tasks.borrow_mut().push(task);
    }
}
