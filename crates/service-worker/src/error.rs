use js_sys::{
    Error as GenericJsError, RangeError as JsRangeError, ReferenceError as JsReferenceError,
    SyntaxError as JsSyntaxError, TypeError as JsTypeError,
};
use offline_policy::Error as PolicyError;
use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};

/// A thrown JS value, sorted by the kind of error it is
#[derive(Debug, Clone, Error)]
pub enum JsError {
    #[error("GenericJs Error: {0}")]
    GenericJs(String),
    #[error("JsRange Error: {0}")]
    JsRange(String),
    #[error("JsReference Error: {0}")]
    JsReference(String),
    #[error("JsSyntax Error: {0}")]
    JsSyntax(String),
    // fetch() rejects with a TypeError when the network is unreachable
    #[error("JsType Error: {0}")]
    JsType(String),
    #[error("UnknownJsValue Error: {0}")]
    UnknownJsValue(String),
}

fn message(err: &JsValue) -> String {
    err.dyn_ref::<GenericJsError>()
        .map(|e| String::from(e.message()))
        .unwrap_or_else(|| format!("{:?}", err))
}

impl From<JsValue> for JsError {
    fn from(err: JsValue) -> JsError {
        let message = message(&err);
        if err.is_instance_of::<JsRangeError>() {
            return JsError::JsRange(message);
        }
        if err.is_instance_of::<JsReferenceError>() {
            return JsError::JsReference(message);
        }
        if err.is_instance_of::<JsSyntaxError>() {
            return JsError::JsSyntax(message);
        }
        if err.is_instance_of::<JsTypeError>() {
            return JsError::JsType(message);
        }
        if err.is_instance_of::<GenericJsError>() {
            return JsError::GenericJs(message);
        }
        JsError::UnknownJsValue(message)
    }
}

pub trait JsResultExt<T> {
    /// Converts a rejected promise or thrown value into a host error, prefixed
    /// with the browser call that failed
    fn js_context(self, context: &str) -> Result<T, PolicyError>;

    /// As [`JsResultExt::js_context`] for failures of the cache storage
    fn js_storage(self, context: &str) -> Result<T, PolicyError>;
}

impl<T> JsResultExt<T> for Result<T, JsValue> {
    fn js_context(self, context: &str) -> Result<T, PolicyError> {
        self.map_err(|e| PolicyError::host(format!("{context}: {}", JsError::from(e))))
    }

    fn js_storage(self, context: &str) -> Result<T, PolicyError> {
        self.map_err(|e| PolicyError::storage(format!("{context}: {}", JsError::from(e))))
    }
}

/// Turns a policy error back into something a promise can reject with
pub fn to_js(err: PolicyError) -> JsValue {
    GenericJsError::new(&err.to_string()).into()
}
