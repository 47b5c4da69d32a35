// src/commands.rs

//! Pipeline entry point wiring the components together.

use crate::error::Result;
use crate::metadata::ExtensionMetadata;
use crate::staging;
use crate::strategy::{PackageContext, Selector};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Package the extension rooted at `root` into a VSIX archive.
///
/// Loads and validates metadata first (invalid metadata aborts before any
/// file I/O), clears leftovers from earlier runs, then walks the strategy
/// chain. Returns the path of the finished archive.
pub fn package(root: &Path) -> Result<PathBuf> {
    staging::sweep_stale_staging();

    let metadata = ExtensionMetadata::load(&root.join("package.json"))?;
    info!(
        "packaging {} v{} for publisher {}",
        metadata.name, metadata.version, metadata.publisher
    );

    let ctx = PackageContext::new(root.to_path_buf(), metadata);

    // The archive is created fresh each run; a stale one would satisfy
    // the per-strategy existence checks.
    let output = ctx.output_path();
    if output.exists() {
        fs::remove_file(&output)?;
        debug!("removed stale output {}", output.display());
    }

    Selector::standard().run(&ctx)
}
