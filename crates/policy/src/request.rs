use http::Method;
use url::Url;

use crate::error::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RequestMode {
    /// A top level document load
    Navigate,
    #[default]
    Other,
}

/// The parts of an intercepted request the policy looks at
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub mode: RequestMode,
}

impl Request {
    pub fn new(method: Method, url: Url, mode: RequestMode) -> Self {
        Self { method, url, mode }
    }

    /// Builds a request from the strings a host hands over
    pub fn parse(method: &str, url: &str, mode: RequestMode) -> Result<Self, Error> {
        let method = Method::from_bytes(method.as_bytes()).map_err(|e| Error::Message {
            message: format!("Invalid method {method}: {e}"),
        })?;
        let url = Url::parse(url).map_err(|e| Error::Url {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self::new(method, url, mode))
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url, RequestMode::Other)
    }

    pub fn navigate(url: Url) -> Self {
        Self::new(Method::GET, url, RequestMode::Navigate)
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }
}
