//! wasm entry points for the service worker
//!
//! `register_listeners.js` binds each worker event to one of the `worker_*`
//! functions below and passes the deployment version along.

use std::{cell::OnceCell, rc::Rc};

use console_error_panic_hook::set_once as set_panic_hook;
use gloo::utils::format::JsValueSerdeExt;
use offline_policy::{
    Error as PolicyError, OfflineCachePolicy, Request as PolicyRequest, RequestMode,
    Strategy, WorkerConfig, WorkerMessage,
};
use tracing::{debug, info, warn};
use wasm_bindgen::{prelude::wasm_bindgen, JsCast, JsValue};
use wasm_bindgen_futures::future_to_promise;
use web_sys::{
    js_sys::Promise, ExtendableEvent, ExtendableMessageEvent, FetchEvent, MessagePort,
    NotificationEvent, Request, RequestMode as FetchMode, ServiceWorkerGlobalScope,
};

mod error;
mod host;
mod utils;

use crate::{
    error::{to_js, JsResultExt},
    host::WebHost,
    utils::tracing::configure_tracing_once as configure_tracing,
};

thread_local! {
    static CONFIG: OnceCell<Rc<WorkerConfig>> = const { OnceCell::new() };
}

/// The configuration is worked out from the worker's own url the first time
/// it's needed and reused for every later event
fn worker_config(sw: &ServiceWorkerGlobalScope, version: &str) -> Result<Rc<WorkerConfig>, JsValue> {
    CONFIG
        .with(|cell| {
            if let Some(config) = cell.get() {
                return Ok(config.clone());
            }

            let config = Rc::new(WorkerConfig::new(version, &sw.location().href())?);
            info!(
                "Base path detected: {:?}, caches: {}, {}",
                config.base_path, config.shell_cache, config.content_cache
            );
            Ok::<_, PolicyError>(cell.get_or_init(|| config).clone())
        })
        .map_err(to_js)
}

fn policy(
    sw: &ServiceWorkerGlobalScope,
    version: &str,
) -> Result<OfflineCachePolicy<WebHost>, JsValue> {
    policy_with(sw, version, WebHost::new(sw.clone()))
}

fn policy_with(
    sw: &ServiceWorkerGlobalScope,
    version: &str,
    host: WebHost,
) -> Result<OfflineCachePolicy<WebHost>, JsValue> {
    Ok(OfflineCachePolicy::new(worker_config(sw, version)?, host))
}

fn to_policy_request(request: &Request) -> Result<PolicyRequest, PolicyError> {
    let mode = match request.mode() {
        FetchMode::Navigate => RequestMode::Navigate,
        _ => RequestMode::Other,
    };
    PolicyRequest::parse(&request.method(), &request.url(), mode)
}

async fn install(policy: OfflineCachePolicy<WebHost>) -> Result<JsValue, JsValue> {
    policy.install().await.map_err(to_js)?;
    Ok(JsValue::undefined())
}

#[wasm_bindgen]
pub fn worker_install(sw: ServiceWorkerGlobalScope, version: String) -> Result<Promise, JsValue> {
    set_panic_hook();
    configure_tracing();

    Ok(future_to_promise(install(policy(&sw, &version)?)))
}

async fn activate(policy: OfflineCachePolicy<WebHost>) -> Result<JsValue, JsValue> {
    policy.activate().await.map_err(to_js)?;
    Ok(JsValue::undefined())
}

#[wasm_bindgen]
pub fn worker_activate(sw: ServiceWorkerGlobalScope, version: String) -> Result<Promise, JsValue> {
    set_panic_hook();
    configure_tracing();

    Ok(future_to_promise(activate(policy(&sw, &version)?)))
}

async fn fetch(
    policy: OfflineCachePolicy<WebHost>,
    request: PolicyRequest,
    strategy: Strategy,
) -> Result<JsValue, JsValue> {
    let response = policy.respond(&request, strategy).await.map_err(to_js)?;
    Ok(JsValue::from(response.0))
}

/// Calls `respondWith` for the requests the policy intercepts. Anything else is
/// left alone so the browser handles it as if there were no worker.
#[wasm_bindgen]
pub fn worker_fetch(
    sw: ServiceWorkerGlobalScope,
    version: String,
    event: FetchEvent,
) -> Result<(), JsValue> {
    set_panic_hook();
    configure_tracing();

    let raw_request = event.request();
    let request = match to_policy_request(&raw_request) {
        Ok(request) => request,
        Err(e) => {
            warn!("worker_fetch: {e}");
            return Ok(());
        }
    };

    let host = WebHost::new(sw.clone())
        .with_event(ExtendableEvent::from(event.clone()))
        .with_request(raw_request);
    let policy = policy_with(&sw, &version, host)?;

    // respondWith has to be called before this returns
    let Some(strategy) = policy.route(&request).strategy() else {
        debug!("Passing through {} {}", request.method, request.url);
        return Ok(());
    };

    event.respond_with(&future_to_promise(fetch(policy, request, strategy)))?;
    Ok(())
}

async fn message(
    policy: OfflineCachePolicy<WebHost>,
    event: ExtendableMessageEvent,
) -> Result<JsValue, JsValue> {
    let message: WorkerMessage = match JsValueSerdeExt::into_serde(&event.data()) {
        Ok(message) => message,
        Err(e) => {
            info!("worker_message got unexpected message: {:?} ({e})", event.data());
            return Ok(JsValue::undefined());
        }
    };

    let Some(reply) = policy.handle_message(message).await else {
        return Ok(JsValue::undefined());
    };

    match event.ports().get(0).dyn_into::<MessagePort>() {
        Ok(port) => {
            let reply =
                <JsValue as JsValueSerdeExt>::from_serde(&reply).map_err(|e| to_js(e.into()))?;
            port.post_message(&reply)
                .js_context("MessagePort::post_message")
                .map_err(to_js)?;
        }
        Err(_) => warn!("worker_message: no port to reply on"),
    }

    Ok(JsValue::undefined())
}

#[wasm_bindgen]
pub fn worker_message(
    sw: ServiceWorkerGlobalScope,
    version: String,
    event: ExtendableMessageEvent,
) -> Result<Promise, JsValue> {
    set_panic_hook();
    configure_tracing();

    Ok(future_to_promise(message(policy(&sw, &version)?, event)))
}

async fn sync(policy: OfflineCachePolicy<WebHost>, tag: String) -> Result<JsValue, JsValue> {
    let refreshed = policy.background_sync(&tag).await.map_err(to_js)?;
    debug!("Background sync refreshed {refreshed} entries");
    Ok(JsValue::undefined())
}

/// `tag` is the tag of the `sync` event
#[wasm_bindgen]
pub fn worker_sync(
    sw: ServiceWorkerGlobalScope,
    version: String,
    tag: String,
) -> Result<Promise, JsValue> {
    set_panic_hook();
    configure_tracing();

    Ok(future_to_promise(sync(policy(&sw, &version)?, tag)))
}

async fn notification_click(policy: OfflineCachePolicy<WebHost>) -> Result<JsValue, JsValue> {
    policy.notification_click().await.map_err(to_js)?;
    Ok(JsValue::undefined())
}

#[wasm_bindgen]
pub fn worker_notification_click(
    sw: ServiceWorkerGlobalScope,
    version: String,
    event: NotificationEvent,
) -> Result<Promise, JsValue> {
    set_panic_hook();
    configure_tracing();

    // Close the notification (chrome doesn't do this by itself)
    event.notification().close();

    Ok(future_to_promise(notification_click(policy(&sw, &version)?)))
}
