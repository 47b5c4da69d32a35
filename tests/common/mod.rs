// tests/common/mod.rs

//! Shared fixtures for integration tests.

use std::fs;
use tempfile::TempDir;

/// A complete terrarium-theme manifest matching the fixture tree.
pub const SAMPLE_MANIFEST: &str = r#"{
    "name": "terrarium-theme",
    "displayName": "Terrarium Theme",
    "description": "A lush, plant-filled color theme",
    "version": "1.2.0",
    "publisher": "acme",
    "keywords": ["dark", "theme"],
    "categories": ["Themes"],
    "engines": { "vscode": "^1.75.0" },
    "icon": "icon.png"
}"#;

/// Create a complete extension source tree: manifest, readme, license,
/// icon, two theme definitions, and a nested assets directory.
///
/// Returns the TempDir - keep it alive for the duration of the test.
pub fn fixture_extension() -> TempDir {
    let root = tempfile::tempdir().unwrap();
    fs::write(root.path().join("package.json"), SAMPLE_MANIFEST).unwrap();
    fs::write(root.path().join("README.md"), "# Terrarium Theme\n").unwrap();
    fs::write(root.path().join("LICENSE"), "MIT\n").unwrap();
    fs::write(root.path().join("icon.png"), [0x89, 0x50, 0x4e, 0x47]).unwrap();

    fs::create_dir(root.path().join("themes")).unwrap();
    fs::write(
        root.path().join("themes/terrarium-dark.json"),
        r#"{"name": "Terrarium Dark", "type": "dark", "colors": {}}"#,
    )
    .unwrap();
    fs::write(
        root.path().join("themes/terrarium-light.json"),
        r#"{"name": "Terrarium Light", "type": "light", "colors": {}}"#,
    )
    .unwrap();

    fs::create_dir_all(root.path().join("assets/screenshots")).unwrap();
    fs::write(
        root.path().join("assets/screenshots/preview.png"),
        [0xff, 0xd8],
    )
    .unwrap();

    root
}

/// Every entry the packaged fixture archive must contain.
#[allow(dead_code)]
pub fn expected_fixture_entries() -> Vec<&'static str> {
    vec![
        "extension.vsixmanifest",
        "package.json",
        "README.md",
        "LICENSE",
        "icon.png",
        "themes/terrarium-dark.json",
        "themes/terrarium-light.json",
        "assets/screenshots/preview.png",
    ]
}

/// Count staging directories currently present in the system temp dir.
#[allow(dead_code)]
pub fn staging_dir_names() -> Vec<String> {
    let mut names = Vec::new();
    if let Ok(entries) = fs::read_dir(std::env::temp_dir()) {
        for entry in entries.flatten() {
            if let Some(name) = entry.file_name().to_str() {
                if name.starts_with("vsixpack-") && entry.path().is_dir() {
                    names.push(name.to_string());
                }
            }
        }
    }
    names
}
