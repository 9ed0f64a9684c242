use anyhow::{Context, Result, bail};
use chrono::{TimeZone, Utc};
use std::env;
use std::fs;
use std::process::Command;
use vergen_gitcl::{Emitter, GitclBuilder};

const LIB_MANIFEST: &str = "seekflate/Cargo.toml";

fn main() -> Result<()> {
    emit_git_describe()?;

    // Reproducible builds pin the timestamp through SOURCE_DATE_EPOCH.
    let built = match env::var("SOURCE_DATE_EPOCH") {
        Ok(val) => {
            let secs = val
                .parse::<i64>()
                .context("SOURCE_DATE_EPOCH is not an integer")?;
            Utc.timestamp_opt(secs, 0)
                .single()
                .context("SOURCE_DATE_EPOCH is out of range")?
        }
        Err(_) => Utc::now(),
    };
    println!(
        "cargo:rustc-env=BUILD_TIMESTAMP={}",
        built.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");

    let version = lib_version_from_metadata()
        .or_else(|_| lib_version_from_manifest())
        .unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=SEEKFLATE_VERSION={version}");
    println!("cargo:rerun-if-changed={LIB_MANIFEST}");

    Ok(())
}

/// Emits VERGEN_GIT_DESCRIBE, with placeholder output outside a git checkout.
fn emit_git_describe() -> Result<()> {
    let gitcl = GitclBuilder::default()
        .describe(true, true, Some("[0-9]*"))
        .build()?;

    let emitted = Emitter::default()
        .idempotent()
        .fail_on_error()
        .add_instructions(&gitcl)
        .and_then(|emitter| emitter.emit());

    if let Err(e) = emitted {
        eprintln!("git describe unavailable: {e:?}");
        Emitter::default()
            .idempotent()
            .add_instructions(&gitcl)?
            .emit()?;
    }

    Ok(())
}

/// Version of the library package as resolved by cargo.
fn lib_version_from_metadata() -> Result<String> {
    let cargo = env::var("CARGO").unwrap_or_else(|_| "cargo".to_string());
    let output = Command::new(cargo)
        .args(["metadata", "--format-version", "1", "--no-deps"])
        .output()?;

    if !output.status.success() {
        bail!("cargo metadata failed");
    }

    let metadata: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    let packages = metadata["packages"]
        .as_array()
        .context("metadata without packages")?;

    packages
        .iter()
        .find(|package| package["name"] == "seekflate")
        .and_then(|package| package["version"].as_str())
        .map(str::to_string)
        .context("seekflate package not found in metadata")
}

fn lib_version_from_manifest() -> Result<String> {
    let manifest = fs::read_to_string(LIB_MANIFEST)?;

    manifest
        .lines()
        .map(str::trim)
        .find_map(|line| {
            let (key, value) = line.split_once('=')?;
            (key.trim() == "version").then(|| value.trim().trim_matches('"').to_string())
        })
        .context("no version in seekflate/Cargo.toml")
}
