use http::Method;

use crate::{config::WorkerConfig, request::Request};

/// What kind of resource an intercepted request is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Documents and videos
    ContentAsset,
    /// One of the shell assets
    StaticAsset,
    /// Any other same-origin GET, answered with the app shell
    AppShell,
    /// Left to the browser's default network handling
    PassThrough,
}

/// How a route is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Serve from the content store, fetch and store on a miss, never refresh
    CacheFirst,
    /// Serve from the shell store and refresh the root document in the background
    StaleWhileRevalidate,
    /// Serve the cached app shell for any path, refreshing it in the background
    AppShell,
}

impl Route {
    pub fn strategy(self) -> Option<Strategy> {
        match self {
            Route::ContentAsset => Some(Strategy::CacheFirst),
            Route::StaticAsset => Some(Strategy::StaleWhileRevalidate),
            Route::AppShell => Some(Strategy::AppShell),
            Route::PassThrough => None,
        }
    }
}

/// Classifies a request. Only same-origin GETs are ever intercepted.
pub fn classify(config: &WorkerConfig, request: &Request) -> Route {
    if request.method != Method::GET || !config.is_same_origin(&request.url) {
        return Route::PassThrough;
    }

    let path = request.path();
    if config.is_content_path(path) {
        Route::ContentAsset
    } else if config.is_shell_asset(path) {
        Route::StaticAsset
    } else {
        Route::AppShell
    }
}

#[cfg(test)]
mod test {
    use url::Url;

    use super::*;
    use crate::request::RequestMode;

    fn config() -> WorkerConfig {
        WorkerConfig::new("v1", "https://hub.test/app/service-worker.js").unwrap()
    }

    fn get(url: &str) -> Request {
        Request::get(Url::parse(url).unwrap())
    }

    #[test]
    fn test_content_paths() {
        let config = config();
        assert_eq!(
            classify(&config, &get("https://hub.test/app/documents/intro.pdf")),
            Route::ContentAsset
        );
        assert_eq!(
            classify(&config, &get("https://hub.test/app/videos/week1/lesson.mp4")),
            Route::ContentAsset
        );
    }

    #[test]
    fn test_static_assets_need_the_base_path() {
        let config = config();
        assert_eq!(
            classify(&config, &get("https://hub.test/app/manifest.json")),
            Route::StaticAsset
        );
        assert_eq!(classify(&config, &get("https://hub.test/app/")), Route::StaticAsset);
        assert_eq!(
            classify(&config, &get("https://hub.test/manifest.json")),
            Route::AppShell
        );
    }

    #[test]
    fn test_other_same_origin_is_app_shell() {
        let config = config();
        assert_eq!(
            classify(&config, &get("https://hub.test/app/course/42")),
            Route::AppShell
        );
    }

    #[test]
    fn test_pass_through() {
        let config = config();
        assert_eq!(
            classify(&config, &get("https://cdn.test/app/documents/a.pdf")),
            Route::PassThrough
        );
        assert_eq!(
            classify(&config, &get("http://hub.test/app/index.html")),
            Route::PassThrough
        );

        let post = Request::new(
            Method::POST,
            Url::parse("https://hub.test/app/documents/a.pdf").unwrap(),
            RequestMode::Other,
        );
        assert_eq!(classify(&config, &post), Route::PassThrough);
    }

    #[test]
    fn test_strategy_table() {
        assert_eq!(Route::ContentAsset.strategy(), Some(Strategy::CacheFirst));
        assert_eq!(Route::StaticAsset.strategy(), Some(Strategy::StaleWhileRevalidate));
        assert_eq!(Route::AppShell.strategy(), Some(Strategy::AppShell));
        assert_eq!(Route::PassThrough.strategy(), None);
    }
}
