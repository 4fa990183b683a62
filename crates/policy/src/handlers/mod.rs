//! One module per caching strategy, see [`crate::route::Strategy`]

mod app_shell;
mod content;
mod static_asset;
