//! Offline caching policy for the training hub's service worker
//!
//! Requests are classified by [`route::classify`] and answered by the strategy
//! the route maps to. The browser side lives behind the [`host::Host`] trait so
//! the whole policy runs natively against [`memory::MemoryHost`] in tests.

pub mod base_path;
pub mod config;
pub mod engine;
pub mod error;
mod handlers;
pub mod host;
mod lifecycle;
pub mod message;
mod notification;
pub mod request;
pub mod response;
pub mod route;
mod sync;

#[cfg(any(test, feature = "memory-host"))]
pub mod memory;

pub use config::WorkerConfig;
pub use engine::OfflineCachePolicy;
pub use error::Error;
pub use message::{CacheUrlsReply, WorkerMessage};
pub use request::{Request, RequestMode};
pub use route::{Route, Strategy};

#[cfg(test)]
mod test_support {
    use crate::{memory::MemoryHost, OfflineCachePolicy, WorkerConfig};

    pub const HUB: &str = "https://hub.test";

    /// A policy for a worker served from `script_path` on [`HUB`]
    pub fn policy(host: &MemoryHost, script_path: &str) -> OfflineCachePolicy<MemoryHost> {
        let config = WorkerConfig::new("v1", &format!("{HUB}{script_path}")).unwrap();
        OfflineCachePolicy::new(config, host.clone())
    }
}
