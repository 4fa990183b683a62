use http::StatusCode;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The network could not be reached, or the host rejected the fetch
    #[error("Network error fetching {url}: {message}")]
    Network { url: String, message: String },

    /// The network answered but not with a 2xx
    #[error("HTTP {}: {}", .status.as_u16(), .status.canonical_reason().unwrap_or("Unknown"))]
    Status { url: String, status: StatusCode },

    #[error("Cache storage error: {message}")]
    Storage { message: String },

    #[error("Invalid url {url}: {message}")]
    Url { url: String, message: String },

    #[error("Invalid message: {message}")]
    Message { message: String },

    #[error("Host error: {message}")]
    Host { message: String },

    #[error("{context}: {inner}")]
    WithContext { context: String, inner: Box<Self> },
}

impl Error {
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn host<S: Into<String>>(message: S) -> Self {
        Self::Host {
            message: message.into(),
        }
    }

    /// The error with all context layers removed
    pub fn root(&self) -> &Self {
        match self {
            Self::WithContext { inner, .. } => inner.root(),
            e => e,
        }
    }

    /// True when the failure came from the network rather than from storage or the host
    pub fn is_network(&self) -> bool {
        matches!(self.root(), Self::Network { .. } | Self::Status { .. })
    }
}

impl From<url::ParseError> for Error {
    fn from(value: url::ParseError) -> Self {
        Self::Url {
            url: String::new(),
            message: value.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::Message {
            message: value.to_string(),
        }
    }
}

pub trait ErrorContext<E>: Sized {
    /// Add helpful context to errors
    ///
    /// `context` is provided as a closure to avoid potential formatting cost if
    /// the result isn't an error
    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, context: F) -> E;
    /// Add helpful context to errors
    fn context<S: Into<String>>(self, context: S) -> E;
}

pub trait ResultContext<T, E: ErrorContext<E>> {
    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, context: F) -> Result<T, E>;
    fn context<S: Into<String>>(self, context: S) -> Result<T, E>;
}

impl<E: Into<Error>> ErrorContext<Error> for E {
    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, context: F) -> Error {
        self.context(context())
    }
    fn context<S: Into<String>>(self, context: S) -> Error {
        Error::WithContext {
            context: context.into(),
            inner: Box::new(self.into()),
        }
    }
}

impl<T, E: ErrorContext<E>> ResultContext<T, E> for Result<T, E> {
    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, context: F) -> Result<T, E> {
        self.map_err(|e| e.with_context(context))
    }
    fn context<S: Into<String>>(self, context: S) -> Result<T, E> {
        self.map_err(|e| e.context(context))
    }
}
