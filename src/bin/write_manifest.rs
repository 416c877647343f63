//! Artifact manifest utility.
//!
//! Hashes the four exported artifacts (two scalers, two forests) and writes
//! `manifest.json` next to them, so the application can verify them at
//! startup.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin write_manifest -- <artifact_dir>
//! ```

use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use glycosense::adapters::artifacts::MANIFEST_FILE;
use glycosense::adapters::ArtifactManifest;

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn usage() -> String {
    "Usage: write_manifest <artifact_dir>".to_string()
}

fn parse_args() -> Result<PathBuf, String> {
    let mut args = env::args().skip(1);
    let dir = match args.next().as_deref() {
        None | Some("-h") | Some("--help") => return Err(usage()),
        Some(arg) => PathBuf::from(arg),
    };
    if args.next().is_some() {
        return Err(usage());
    }
    Ok(dir)
}

fn main() -> Result<(), String> {
    let dir = parse_args()?;

    if !dir.is_dir() {
        return Err(format!("Artifact directory not found: {dir:?}"));
    }

    let manifest = ArtifactManifest::build(&dir, Some(unix_now())).map_err(|e| e.to_string())?;

    let json = serde_json::to_vec_pretty(&manifest)
        .map_err(|e| format!("Failed to serialize manifest: {e}"))?;
    let out = dir.join(MANIFEST_FILE);
    fs::write(&out, json).map_err(|e| format!("Failed to write {out:?}: {e}"))?;

    println!("Wrote: {out:?}");
    for (name, digest) in &manifest.files {
        println!("  {name}  {digest}");
    }
    Ok(())
}
