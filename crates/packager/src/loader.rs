use base64::{display::Base64Display, engine::general_purpose::STANDARD};

/// Event listeners appended to the bindgen glue
pub const REGISTER_LISTENERS_JS: &str = include_str!("../../service-worker/register_listeners.js");

pub const VERSION_PLACEHOLDER: &str = "SERVICE_WORKER_VERSION";
pub const WASM_PLACEHOLDER: &str = "SERVICE_WORKER_BASE64";

/// Fills in the listeners template. The wasm is embedded as base64 so the
/// installed worker never has to fetch (or cache) it separately.
pub fn render_listeners(template: &str, version: &str, wasm: &[u8]) -> String {
    let wasm_base64 = Base64Display::new(wasm, &STANDARD).to_string();

    template
        .replace(WASM_PLACEHOLDER, &wasm_base64)
        // The version names the caches, a new one replaces the old stores
        .replace(VERSION_PLACEHOLDER, version)
}

/// The packaged worker: bindgen glue followed by the listeners
pub fn render_worker(glue_js: &str, version: &str, wasm: &[u8]) -> String {
    let mut script = glue_js.to_string();
    if !script.ends_with('\n') {
        script.push('\n');
    }
    script.push_str(&render_listeners(REGISTER_LISTENERS_JS, version, wasm));
    script
}
