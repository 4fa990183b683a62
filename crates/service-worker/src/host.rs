use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use http::StatusCode;
use offline_policy::{
    host::{Cache as PolicyCache, Host, HttpResponse},
    response::SyntheticResponse,
    Error, Request as PolicyRequest,
};
use tracing::debug;
use url::Url;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{future_to_promise, JsFuture};
use web_sys::{
    js_sys::{Array, Promise}, Cache, CacheStorage, ExtendableEvent, Headers, Request, Response, ResponseInit,
    ServiceWorkerGlobalScope, WindowClient,
};

use crate::error::{JsError, JsResultExt};

#[derive(Debug, Clone)]
pub struct WebResponse(pub Response);

impl HttpResponse for WebResponse {
    fn status(&self) -> StatusCode {
        // Opaque responses report 0
        StatusCode::from_u16(self.0.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn ok(&self) -> bool {
        self.0.ok()
    }

    fn try_clone(&self) -> Result<Self, Error> {
        self.0.clone().map(Self).js_context("Response::clone")
    }

    fn synthesize(response: SyntheticResponse) -> Result<Self, Error> {
        let headers = Headers::new().js_context("Headers::new")?;
        for (name, value) in response.headers.iter() {
            let value = value
                .to_str()
                .map_err(|e| Error::host(format!("Header {name}: {e}")))?;
            headers
                .append(name.as_str(), value)
                .js_context("Headers::append")?;
        }

        let mut r_init = ResponseInit::new();
        r_init
            .status(response.status.as_u16())
            .status_text(response.status_text())
            .headers(&headers);

        Response::new_with_opt_str_and_init(Some(&response.body), &r_init)
            .map(Self)
            .js_context("Response::new")
    }
}

#[derive(Debug, Clone)]
pub struct WebCache(Cache);

#[async_trait(?Send)]
impl PolicyCache for WebCache {
    type Response = WebResponse;

    async fn lookup(&self, key: &Url) -> Result<Option<WebResponse>, Error> {
        let cached = JsFuture::from(self.0.match_with_str(key.as_str()))
            .await
            .js_storage("cache::match")?;

        if cached.is_instance_of::<Response>() {
            Ok(Some(WebResponse(cached.into())))
        } else if cached.is_undefined() {
            Ok(None)
        } else {
            Err(Error::storage(format!(
                "cache::match returned something other than Response or undefined: {:?}",
                cached
            )))
        }
    }

    async fn put(&self, key: &Url, response: WebResponse) -> Result<(), Error> {
        JsFuture::from(self.0.put_with_str(key.as_str(), &response.0))
            .await
            .js_storage("cache::put")?;
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<Url>, Error> {
        let keys: Array = JsFuture::from(self.0.keys())
            .await
            .js_storage("cache::keys")?
            .into();

        keys.iter()
            .map(|k| Url::parse(&Request::from(k).url()).map_err(Error::from))
            .collect()
    }
}

/// The browser's service worker scope
///
/// When built for an event, background work extends that event's lifetime so
/// the browser doesn't stop the worker before it finishes. When built for a
/// fetch event, the page's own request is what goes to the network.
#[derive(Debug, Clone)]
pub struct WebHost {
    sw: ServiceWorkerGlobalScope,
    event: Option<ExtendableEvent>,
    request: Option<Request>,
}

impl WebHost {
    pub fn new(sw: ServiceWorkerGlobalScope) -> Self {
        Self {
            sw,
            event: None,
            request: None,
        }
    }

    pub fn with_event(mut self, event: ExtendableEvent) -> Self {
        self.event = Some(event);
        self
    }

    pub fn with_request(mut self, request: Request) -> Self {
        self.request = Some(request);
        self
    }

    async fn send(&self, promise: Promise, url: &Url) -> Result<WebResponse, Error> {
        let response = JsFuture::from(promise).await.map_err(|e| Error::Network {
            url: url.to_string(),
            message: JsError::from(e).to_string(),
        })?;

        if response.is_instance_of::<Response>() {
            Ok(WebResponse(response.into()))
        } else {
            Err(Error::host(format!(
                "Fetch returned something other than a Response: {:?}",
                response
            )))
        }
    }

    fn caches(&self) -> Result<CacheStorage, Error> {
        self.sw.caches().js_storage("sw::caches")
    }
}

#[async_trait(?Send)]
impl Host for WebHost {
    type Response = WebResponse;
    type Cache = WebCache;

    async fn open_cache(&self, name: &str) -> Result<WebCache, Error> {
        let cache: Cache = JsFuture::from(self.caches()?.open(name))
            .await
            .js_storage("caches::open")?
            .into();
        Ok(WebCache(cache))
    }

    async fn cache_names(&self) -> Result<Vec<String>, Error> {
        let names: Array = JsFuture::from(self.caches()?.keys())
            .await
            .js_storage("caches::keys")?
            .into();
        Ok(names.iter().filter_map(|n| n.as_string()).collect())
    }

    async fn delete_cache(&self, name: &str) -> Result<bool, Error> {
        let deleted = JsFuture::from(self.caches()?.delete(name))
            .await
            .js_storage("caches::delete")?;
        Ok(deleted.as_bool().unwrap_or(false))
    }

    async fn fetch(&self, url: &Url) -> Result<WebResponse, Error> {
        self.send(self.sw.fetch_with_str(url.as_str()), url).await
    }

    async fn fetch_request(&self, request: &PolicyRequest) -> Result<WebResponse, Error> {
        match &self.request {
            Some(raw) if raw.url() == request.url.as_str() => {
                self.send(self.sw.fetch_with_request(raw), &request.url).await
            }
            _ => self.fetch(&request.url).await,
        }
    }

    async fn skip_waiting(&self) -> Result<(), Error> {
        let promise = self.sw.skip_waiting().js_context("sw::skip_waiting")?;
        JsFuture::from(promise)
            .await
            .js_context("sw::skip_waiting")?;
        Ok(())
    }

    async fn claim_clients(&self) -> Result<(), Error> {
        JsFuture::from(self.sw.clients().claim())
            .await
            .js_context("sw::clients::claim")?;
        Ok(())
    }

    async fn focus_or_open_client(&self, url: &Url) -> Result<(), Error> {
        let clients: Array = JsFuture::from(self.sw.clients().match_all())
            .await
            .js_context("sw::clients::match_all")?
            .into();

        if clients.length() == 0 {
            debug!("Opening {url}");
            // A newly opened window already has focus
            JsFuture::from(self.sw.clients().open_window(url.as_str()))
                .await
                .js_context("sw::clients::open_window")?;
            return Ok(());
        }

        debug!("Focusing tab");
        let client: WindowClient = clients.get(0).into();
        JsFuture::from(client.focus().js_context("sw::clients[0]::focus")?)
            .await
            .js_context("sw::clients[0]::focus")?;
        Ok(())
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        let promise = future_to_promise(async move {
            task.await;
            Ok::<_, JsValue>(JsValue::UNDEFINED)
        });

        if let Some(event) = &self.event {
            if let Err(e) = event.wait_until(&promise) {
                // Too late to extend the event, the task still runs
                debug!("event::wait_until: {}", JsError::from(e));
            }
        }
    }
}
