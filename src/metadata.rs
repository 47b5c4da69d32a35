// src/metadata.rs

//! Extension metadata (package.json) loading and validation.
//!
//! The manifest is read once per run and is immutable afterwards. Required
//! fields are `name`, `version`, and `publisher`; their absence fails the
//! pipeline before any staging or archive I/O happens. Everything else has
//! a defined default so a sparse manifest still packages.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Engine constraint applied when package.json does not pin one.
pub const DEFAULT_ENGINE: &str = "^1.60.0";

/// Icon path applied when package.json does not name one.
pub const DEFAULT_ICON: &str = "icon.png";

/// Extension metadata as declared in package.json
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionMetadata {
    /// Extension identifier (marketplace Id)
    #[serde(default)]
    pub name: String,
    /// Semantic version string
    #[serde(default)]
    pub version: String,
    /// Marketplace publisher identifier
    #[serde(default)]
    pub publisher: String,
    /// Human-readable name shown in the gallery
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Gallery search tags
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Gallery categories (themes land in "Themes")
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub engines: Engines,
    /// Icon path relative to the extension root
    #[serde(default)]
    pub icon: Option<String>,
}

/// Engine compatibility constraints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Engines {
    #[serde(default)]
    pub vscode: Option<String>,
}

impl ExtensionMetadata {
    /// Load metadata from a package.json file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|err| {
            Error::Config(format!("cannot read {}: {}", path.display(), err))
        })?;
        Self::parse(&content)
    }

    /// Parse metadata from a JSON string
    pub fn parse(content: &str) -> Result<Self> {
        let metadata: ExtensionMetadata = serde_json::from_str(content)
            .map_err(|err| Error::Config(format!("malformed package.json: {}", err)))?;
        metadata.validate()?;
        Ok(metadata)
    }

    /// Validate required fields and version syntax
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("name", &self.name),
            ("version", &self.version),
            ("publisher", &self.publisher),
        ] {
            if value.is_empty() {
                return Err(Error::Config(format!("missing required field: {}", field)));
            }
        }
        semver::Version::parse(&self.version).map_err(|err| {
            Error::Config(format!("invalid version '{}': {}", self.version, err))
        })?;
        Ok(())
    }

    /// Gallery display name, falling back to the identifier
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Description, empty when not declared
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    /// Engine constraint, defaulting to [`DEFAULT_ENGINE`]
    pub fn engine(&self) -> &str {
        self.engines.vscode.as_deref().unwrap_or(DEFAULT_ENGINE)
    }

    /// Icon path, defaulting to [`DEFAULT_ICON`]
    pub fn icon(&self) -> &str {
        self.icon.as_deref().unwrap_or(DEFAULT_ICON)
    }

    /// Deterministic output archive name: `{name}-{version}.vsix`
    pub fn output_name(&self) -> String {
        format!("{}-{}.vsix", self.name, self.version)
    }
}
