use std::{
    path::{Path, PathBuf},
    process::Command,
    time::Instant,
};

use anyhow::{bail, Context};
use tracing::info;
use wasm_opt::OptimizationOptions;

/// Cargo profile used for release builds of the worker
pub const WASM_RELEASE_PROFILE: &str = "wasm-release";

fn file_stem(path: &Path) -> Result<&str, anyhow::Error> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("Path {:?} doesn't have a utf8 file name", path))
}

// Runs cargo rustc to build the wasm lib
pub fn build_wasm(package: &str, target_dir: &Path, release: bool) -> Result<(), anyhow::Error> {
    let mut cargo_cmd = Command::new(std::env::var("CARGO").unwrap_or_else(|_| "cargo".into()));
    cargo_cmd
        .args([
            "rustc",
            "--package",
            package,
            "--lib",
            "--crate-type",
            "cdylib",
            "--target",
            "wasm32-unknown-unknown",
            "--target-dir",
        ])
        .arg(target_dir);

    if release {
        cargo_cmd.args(["--profile", WASM_RELEASE_PROFILE]);
    }

    let start = Instant::now();
    info!("Building {package} wasm");
    let status = cargo_cmd.status().context("Running cargo")?;
    if !status.success() {
        bail!("Building {package} wasm failed: {status}");
    }
    info!(
        "Building {package} wasm took {:.2}s",
        start.elapsed().as_secs_f32()
    );

    Ok(())
}

// Works out where the wasm is output to
pub fn wasm_out_path(lib_file_name: &str, target_dir: &Path, release: bool) -> PathBuf {
    let profile = if release { WASM_RELEASE_PROFILE } else { "debug" };
    target_dir
        .join("wasm32-unknown-unknown")
        .join(profile)
        .join(format!("{lib_file_name}.wasm"))
}

/// Runs bindgen on the wasm lib to create the bg wasm and the js glue
///
/// Service workers are classic scripts so the glue is always no-modules.
pub fn generate_bindings(
    package: &str,
    input: &Path,
    release: bool,
) -> Result<(PathBuf, PathBuf), anyhow::Error> {
    if !input.exists() {
        bail!(
            "Wasm file doesn't exist after running cargo build for {package}. Should be at {:?}",
            input
        );
    }
    let out_dir = input
        .parent()
        .with_context(|| format!("Wasm path {:?} has no parent", input))?;

    let start = Instant::now();
    info!("Generating bindings for {package} wasm");
    let mut bg = wasm_bindgen_cli_support::Bindgen::new();
    bg.no_modules(true)?;
    bg.input_path(input)
        .remove_name_section(release)
        .remove_producers_section(release)
        .keep_debug(!release)
        .omit_default_module_path(false)
        .generate(out_dir)?;

    info!(
        "Generating bindings for {package} wasm took: {:.2}s",
        start.elapsed().as_secs_f32()
    );

    let js_file = input.with_extension("js");
    let bg_file = input.with_file_name(format!("{}_bg.wasm", file_stem(input)?));

    if !js_file.exists() {
        bail!(
            "Bindgen js file doesn't exist after running wasm-bindgen. Should be at {:?}",
            js_file
        );
    }
    if !bg_file.exists() {
        bail!(
            "Bindgen lib file doesn't exist after running wasm-bindgen. Should be at {:?}",
            bg_file
        );
    }

    Ok((bg_file, js_file))
}

// Run wasm-opt on the wasm
pub fn optimize_wasm(input: &Path) -> Result<PathBuf, anyhow::Error> {
    let wasm_opt_out = input.with_file_name(format!("{}_opt.wasm", file_stem(input)?));

    OptimizationOptions::new_optimize_for_size_aggressively().run(input, &wasm_opt_out)?;

    if !wasm_opt_out.exists() {
        bail!(
            "Optimized bg file doesn't exist after running wasm-opt. Should be at {:?}",
            wasm_opt_out
        );
    }

    Ok(wasm_opt_out)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_wasm_out_path_follows_profile() {
        let target = Path::new("target/worker");
        assert_eq!(
            wasm_out_path("training_hub_worker", target, true),
            Path::new("target/worker/wasm32-unknown-unknown/wasm-release/training_hub_worker.wasm")
        );
        assert_eq!(
            wasm_out_path("training_hub_worker", target, false),
            Path::new("target/worker/wasm32-unknown-unknown/debug/training_hub_worker.wasm")
        );
    }
}
