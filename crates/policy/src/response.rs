use headers::{CacheControl, ContentType, HeaderMapExt};
use http::{HeaderMap, StatusCode};
use serde::Serialize;
use url::Url;

use crate::error::Error;

/// A response built by the worker itself rather than fetched or cached
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

#[derive(Serialize)]
struct ContentUnavailable<'a> {
    error: &'a str,
    message: &'a str,
    url: &'a str,
}

impl SyntheticResponse {
    pub fn status_text(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("")
    }

    /// Served for navigations when neither the network nor the cache can help.
    /// Marked `no-cache` so it never stands in for the real page once online.
    pub fn offline_page() -> Self {
        let mut headers = HeaderMap::new();
        headers.typed_insert(ContentType::from(mime::TEXT_HTML_UTF_8));
        headers.typed_insert(CacheControl::new().with_no_cache());

        Self {
            status: StatusCode::OK,
            headers,
            body: OFFLINE_PAGE.to_string(),
        }
    }

    /// Served for documents and videos that were never cached while offline
    pub fn content_unavailable(url: &Url) -> Result<Self, Error> {
        let body = serde_json::to_string(&ContentUnavailable {
            error: "Content not available offline",
            message: "This content has not been cached and you are currently offline.",
            url: url.as_str(),
        })?;

        let mut headers = HeaderMap::new();
        headers.typed_insert(ContentType::json());

        Ok(Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            headers,
            body,
        })
    }

    /// Served for shell assets that aren't documents
    pub fn asset_unavailable() -> Self {
        let mut headers = HeaderMap::new();
        headers.typed_insert(ContentType::from(mime::TEXT_PLAIN));

        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            headers,
            body: "Resource not available offline".to_string(),
        }
    }
}

const OFFLINE_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Offline - Training Hub</title>
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: linear-gradient(135deg, #2563eb, #667eea);
            color: white;
            display: flex;
            align-items: center;
            justify-content: center;
            min-height: 100vh;
            margin: 0;
            padding: 1rem;
            text-align: center;
        }
        .container {
            max-width: 400px;
            background: rgba(255, 255, 255, 0.1);
            border-radius: 1rem;
            padding: 2rem;
            box-shadow: 0 8px 32px rgba(0, 0, 0, 0.1);
        }
        h1 { font-size: 2rem; margin-bottom: 1rem; }
        p { margin-bottom: 1.5rem; line-height: 1.6; }
        button {
            background: white;
            color: #2563eb;
            border: none;
            padding: 0.75rem 1.5rem;
            border-radius: 0.5rem;
            font-weight: 600;
            cursor: pointer;
        }
    </style>
</head>
<body>
    <div class="container">
        <h1>&#128218; Training Hub</h1>
        <p>You're currently offline. The app will work normally once your connection is restored.</p>
        <p>Content you've already opened is still available from the main app.</p>
        <button onclick="location.reload()">Try Again</button>
    </div>
</body>
</html>
"#;
