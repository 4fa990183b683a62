//! Builds the service worker and packages it as a single classic script
//!
//! The wasm is compiled, run through bindgen (no-modules) and wasm-opt, then
//! embedded as base64 in `service-worker.js` next to the event listeners.

use std::{
    fs::{create_dir_all, read, read_to_string, write},
    path::PathBuf,
};

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::fmt::format::FmtSpan;

mod loader;
mod wasm;

use crate::{
    loader::render_worker,
    wasm::{build_wasm, generate_bindings, optimize_wasm, wasm_out_path},
};

const WORKER_PACKAGE: &str = "training-hub-worker";
const WORKER_LIB: &str = "training_hub_worker";

/// Filename the worker is served under, one the worker recognises when working
/// out its base path
const WORKER_SCRIPT: &str = "service-worker.js";

#[derive(Debug, Parser)]
#[clap(name = "package-worker")]
struct Cli {
    /// Where `service-worker.js` is written
    #[clap(long, env, default_value = "dist")]
    out_dir: PathBuf,
    #[clap(long, env, default_value = "target/worker")]
    target_dir: PathBuf,
    /// Version the caches are named after. Defaults to the crate version plus
    /// a timestamp so every build replaces the previous stores.
    #[clap(long, env)]
    worker_version: Option<String>,
    #[clap(long, env, default_value = "false")]
    release: bool,
}

fn configure_tracing() -> Result<(), anyhow::Error> {
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(tracing::Level::TRACE)
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_span_events(FmtSpan::CLOSE)
            .finish(),
    )
    .context("Failed to set default tracing subscriber")
}

fn main() -> Result<(), anyhow::Error> {
    configure_tracing()?;

    let args = Cli::parse();
    debug!(?args);

    let version = args.worker_version.clone().unwrap_or_else(|| {
        format!(
            "v{}-{}",
            env!("CARGO_PKG_VERSION"),
            Utc::now().format("%Y%m%d%H%M%S")
        )
    });

    build_wasm(WORKER_PACKAGE, &args.target_dir, args.release).context("build_wasm[worker]")?;

    let wasm_file = wasm_out_path(WORKER_LIB, &args.target_dir, args.release);
    let (bg_file, js_file) =
        generate_bindings(WORKER_PACKAGE, &wasm_file, args.release).context("generate_bindings")?;
    let opt_file = optimize_wasm(&bg_file).context("optimize_wasm")?;

    let wasm_bytes = read(&opt_file).with_context(|| format!("Reading {:?}", opt_file))?;
    let glue_js = read_to_string(&js_file).with_context(|| format!("Reading {:?}", js_file))?;

    create_dir_all(&args.out_dir).context("create_dir_all[out_dir]")?;
    let worker_out = args.out_dir.join(WORKER_SCRIPT);
    write(&worker_out, render_worker(&glue_js, &version, &wasm_bytes))
        .with_context(|| format!("Writing {:?}", worker_out))?;

    info!(
        "Packaged worker {version} ({} KiB wasm) to {:?}",
        wasm_bytes.len() / 1024,
        worker_out
    );

    Ok(())
}
