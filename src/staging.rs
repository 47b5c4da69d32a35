// src/staging.rs

//! Staging tree assembly for the manual packaging strategy.
//!
//! The staging directory mirrors the archive's internal layout exactly:
//! whatever lands here is what the archive builder compresses, and the
//! descriptor's asset paths resolve against it. The directory is uniquely
//! named and scoped to one run; dropping [`Staging`] removes it on both
//! success and failure paths.

use crate::error::{Error, Result};
use crate::manifest::{self, MANIFEST_ENTRY};
use crate::metadata::ExtensionMetadata;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Prefix for staging directories in the system temp directory. The
/// startup sweep removes leftovers matching this prefix.
pub const STAGING_PREFIX: &str = "vsixpack-";

/// Mandatory directory of theme definition files.
pub const THEMES_DIR: &str = "themes";

/// Optional directory of auxiliary assets (screenshots, nested images).
pub const ASSETS_DIR: &str = "assets";

/// Top-level files staged when present: the extension manifest itself,
/// the gallery details page, the license, and (separately) the icon.
const TOP_LEVEL_FILES: [&str; 3] = ["package.json", "README.md", "LICENSE"];

/// An ordered plan of what goes into the staging tree.
#[derive(Debug)]
pub struct StagingPlan {
    root: PathBuf,
    files: Vec<FileCopy>,
    dirs: Vec<DirCopy>,
    descriptor: String,
}

#[derive(Debug)]
struct FileCopy {
    source: PathBuf,
    dest: String,
}

#[derive(Debug)]
struct DirCopy {
    source: PathBuf,
    dest: String,
}

/// A materialized staging directory. Removal is the drop guard.
pub struct Staging {
    dir: TempDir,
}

impl Staging {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

impl StagingPlan {
    /// Build the copy plan for an extension rooted at `root`.
    ///
    /// Fails with [`Error::AssetMissing`] when the mandatory theme
    /// directory is absent, before any staging directory exists.
    pub fn assemble(root: &Path, metadata: &ExtensionMetadata) -> Result<Self> {
        let themes = root.join(THEMES_DIR);
        if !themes.is_dir() {
            return Err(Error::AssetMissing(themes));
        }

        let mut files: Vec<FileCopy> = TOP_LEVEL_FILES
            .iter()
            .map(|name| FileCopy {
                source: root.join(name),
                dest: (*name).to_string(),
            })
            .collect();

        // Icons under assets/ arrive with the recursive assets copy;
        // copying them here as well would shadow that entry.
        let icon = metadata.icon();
        if !Path::new(icon).starts_with(ASSETS_DIR) {
            files.push(FileCopy {
                source: root.join(icon),
                dest: icon.to_string(),
            });
        }

        let mut dirs = vec![DirCopy {
            source: themes,
            dest: THEMES_DIR.to_string(),
        }];

        let assets = root.join(ASSETS_DIR);
        if assets.is_dir() {
            dirs.push(DirCopy {
                source: assets,
                dest: ASSETS_DIR.to_string(),
            });
        }

        Ok(Self {
            root: root.to_path_buf(),
            files,
            dirs,
            descriptor: manifest::render(metadata),
        })
    }

    /// Create the staging directory and populate it.
    ///
    /// Optional files that are absent are skipped with a warning; the
    /// synthesized descriptor is written last, at the staging root.
    pub fn materialize(&self) -> Result<Staging> {
        let dir = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir()?;
        debug!("staging into {}", dir.path().display());

        for file in &self.files {
            if !file.source.is_file() {
                warn!(
                    "{} not found in {}, continuing without it",
                    file.dest,
                    self.root.display()
                );
                continue;
            }
            let dest = dir.path().join(&file.dest);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&file.source, &dest)?;
        }

        for dir_copy in &self.dirs {
            copy_tree(&dir_copy.source, &dir.path().join(&dir_copy.dest))?;
        }

        fs::write(dir.path().join(MANIFEST_ENTRY), &self.descriptor)?;

        Ok(Staging { dir })
    }
}

/// Recursively copy a directory, preserving relative structure at any depth.
fn copy_tree(source: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(source) {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(source)
            .map_err(std::io::Error::other)?;
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Staging directories older than this are considered orphaned.
const STALE_AFTER: Duration = Duration::from_secs(60 * 60);

/// Remove staging directories left behind by aborted prior runs.
///
/// Unique naming keeps live runs from colliding with leftovers, but the
/// leftovers themselves are never reclaimed by the run that lost them.
/// The age threshold keeps a concurrent run's live staging out of reach.
/// Best-effort: failures are logged and ignored.
pub fn sweep_stale_staging() {
    sweep_dir(&std::env::temp_dir(), STALE_AFTER);
}

fn sweep_dir(temp: &Path, older_than: Duration) {
    let entries = match fs::read_dir(temp) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("cannot scan {} for stale staging: {}", temp.display(), err);
            return;
        }
    };

    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !name.starts_with(STAGING_PREFIX) {
            continue;
        }
        let path = entry.path();
        if !path.is_dir() || !is_older_than(&path, older_than) {
            continue;
        }
        match fs::remove_dir_all(&path) {
            Ok(()) => debug!("removed stale staging {}", path.display()),
            Err(err) => warn!("cannot remove stale staging {}: {}", path.display(), err),
        }
    }
}

fn is_older_than(path: &Path, age: Duration) -> bool {
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };
    let Ok(modified) = metadata.modified() else {
        return false;
    };
    match modified.elapsed() {
        Ok(elapsed) => elapsed >= age,
        Err(_) => false,
    }
}
