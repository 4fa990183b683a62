use url::Url;

use crate::{base_path::detect_base_path, error::Error, request::Request, request::RequestMode};

/// Prefix of the store holding the app shell and static assets
pub const SHELL_CACHE_PREFIX: &str = "training-hub";

/// Prefix of the store holding documents and videos
pub const CONTENT_CACHE_PREFIX: &str = "content-cache";

/// Path segments that mark a request as bulky content
pub const CONTENT_MARKERS: &[&str] = &["/documents/", "/videos/"];

/// Shell assets relative to the base path
pub const SHELL_ASSETS: &[&str] = &[
    "/",
    "/index.html",
    "/manifest.json",
    "/documents.json",
    "/icons/icon-192x192.png",
    "/icons/icon-512x512.png",
];

/// Shell assets that are refreshed in the background after a cache hit
pub const REFRESH_ASSETS: &[&str] = &["/", "/index.html"];

/// Sync tag that triggers a refresh of the shell store
pub const SYNC_TAG: &str = "background-sync";

/// Used when the loader doesn't supply a version
pub const DEFAULT_VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));

/// Everything the policy needs to know about the deployment
///
/// Built once when the worker starts and shared by every handler.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerConfig {
    pub version: String,
    pub shell_cache: String,
    pub content_cache: String,
    /// Root url of the worker's origin
    pub origin: Url,
    /// The url the worker script was loaded from
    pub script_url: Url,
    /// Deployment sub-path without a trailing slash, empty at the root
    pub base_path: String,
    /// Shell asset paths including the base path
    pub shell_assets: Vec<String>,
    pub content_markers: Vec<String>,
    /// Paths including the base path
    pub refresh_paths: Vec<String>,
    pub sync_tag: String,
    pub precache_on_install: bool,
}

impl WorkerConfig {
    /// `script_url` is the absolute url the worker script was loaded from
    pub fn new(version: &str, script_url: &str) -> Result<Self, Error> {
        let script_url = Url::parse(script_url).map_err(|e| Error::Url {
            url: script_url.to_string(),
            message: e.to_string(),
        })?;
        let origin = script_url.join("/")?;
        let base_path = detect_base_path(script_url.path());

        let version = match version.trim() {
            "" => DEFAULT_VERSION,
            v => v,
        };

        let prefixed = |paths: &[&str]| -> Vec<String> {
            paths.iter().map(|p| format!("{base_path}{p}")).collect()
        };

        Ok(Self {
            version: version.to_string(),
            shell_cache: format!("{SHELL_CACHE_PREFIX}-{version}"),
            content_cache: format!("{CONTENT_CACHE_PREFIX}-{version}"),
            shell_assets: prefixed(SHELL_ASSETS),
            refresh_paths: prefixed(REFRESH_ASSETS),
            content_markers: CONTENT_MARKERS.iter().map(|m| m.to_string()).collect(),
            sync_tag: SYNC_TAG.to_string(),
            precache_on_install: true,
            origin,
            script_url,
            base_path,
        })
    }

    pub fn with_precache_on_install(mut self, precache: bool) -> Self {
        self.precache_on_install = precache;
        self
    }

    /// Resolves a path or url against the worker's origin
    pub fn resolve(&self, path: &str) -> Result<Url, Error> {
        self.origin.join(path).map_err(|e| Error::Url {
            url: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Resolves a url the way the browser does for the worker's own `fetch`,
    /// so relative urls land under the base path
    pub fn resolve_relative(&self, url: &str) -> Result<Url, Error> {
        self.script_url.join(url).map_err(|e| Error::Url {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// True for the two stores the current version owns
    pub fn is_current_cache(&self, name: &str) -> bool {
        name == self.shell_cache || name == self.content_cache
    }

    pub fn is_same_origin(&self, url: &Url) -> bool {
        url.origin() == self.origin.origin()
    }

    pub fn is_content_path(&self, path: &str) -> bool {
        self.content_markers.iter().any(|m| path.contains(m.as_str()))
    }

    pub fn is_shell_asset(&self, path: &str) -> bool {
        self.shell_assets.iter().any(|a| a == path)
    }

    pub fn is_refresh_eligible(&self, path: &str) -> bool {
        self.refresh_paths.iter().any(|p| p == path)
    }

    /// The app root, `<base>/`
    pub fn root_path(&self) -> String {
        format!("{}/", self.base_path)
    }

    /// True if a failed request should be answered with the offline page
    /// rather than a bare 503
    pub fn expects_document(&self, request: &Request) -> bool {
        let path = request.path();
        request.mode == RequestMode::Navigate
            || path.ends_with(".html")
            || path == self.root_path()
    }

    pub fn shell_asset_urls(&self) -> Result<Vec<Url>, Error> {
        self.shell_assets.iter().map(|a| self.resolve(a)).collect()
    }

    /// Keys the app shell document is stored under, `<base>/index.html` then `<base>/`
    pub fn shell_document_keys(&self) -> Result<Vec<Url>, Error> {
        Ok(vec![
            self.resolve(&format!("{}/index.html", self.base_path))?,
            self.resolve(&self.root_path())?,
        ])
    }

    /// Keys tried in order when looking for a cached app shell
    ///
    /// The unprefixed root keys are only added when deployed under a sub-path.
    pub fn app_shell_lookup_keys(&self) -> Result<Vec<Url>, Error> {
        let mut keys = self.shell_document_keys()?;
        if !self.base_path.is_empty() {
            keys.push(self.resolve("/index.html")?);
            keys.push(self.resolve("/")?);
        }
        Ok(keys)
    }
}
