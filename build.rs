//! Build script for asset manifest validation
//!
//! Runs at compile time against `assets/manifest.json`, which the crate
//! embeds with `include_str!`, so a broken manifest fails the build instead
//! of failing a fetch in the browser.

use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct Entry {
    key: String,
    #[serde(default)]
    file: Option<String>,
    #[serde(default)]
    family: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    base: Entry,
    animations: Vec<Entry>,
}

/// Keys the default configuration relies on
const REQUIRED_KEYS: [&str; 3] = ["talking 1", "talking 2", "rest"];

fn file_name(entry: &Entry) -> String {
    entry
        .file
        .clone()
        .unwrap_or_else(|| format!("{}.glb", entry.key))
}

fn validate(manifest: &Manifest) -> Vec<String> {
    let mut errors = Vec::new();
    let mut keys = HashSet::new();

    for entry in std::iter::once(&manifest.base).chain(&manifest.animations) {
        if entry.key.trim().is_empty() {
            errors.push("  empty key".to_string());
        }
        if !keys.insert(entry.key.as_str()) {
            errors.push(format!("  duplicate key `{}`", entry.key));
        }
        let file = file_name(entry);
        if !file.ends_with(".glb") {
            errors.push(format!("  `{}` maps to `{}`, expected a .glb file", entry.key, file));
        }
        if file.contains('/') {
            errors.push(format!("  `{}` maps to a path, expected a file name", entry.key));
        }
        if entry.family.as_deref().is_some_and(|f| f.trim().is_empty()) {
            errors.push(format!("  `{}` has an empty family", entry.key));
        }
    }

    for required in REQUIRED_KEYS {
        if !keys.contains(required) {
            errors.push(format!("  missing required key `{}`", required));
        }
    }

    errors
}

fn main() {
    let path = Path::new("assets/manifest.json");
    println!("cargo:rerun-if-changed={}", path.display());

    let contents = fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
    let manifest: Manifest = serde_json::from_str(&contents)
        .unwrap_or_else(|e| panic!("Failed to parse {}: {}", path.display(), e));

    let errors = validate(&manifest);
    if !errors.is_empty() {
        panic!("Asset manifest is invalid:\n{}", errors.join("\n"));
    }
}
