// src/archive.rs

//! Output archive construction and verification.
//!
//! VSIX is plain ZIP. Two equivalent build paths exist: shelling out to a
//! `zip` utility over the staging tree, or streaming the tree through an
//! in-process writer. Both produce the same entry set (file entries only,
//! forward-slash names, maximum compression); which one runs depends on
//! what the host has installed.

use crate::error::{Error, Result};
use crate::manifest::MANIFEST_ENTRY;
use crate::tool::{self, ToolCommand};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Streaming VSIX writer: accepts directory trees and raw byte payloads.
pub struct VsixWriter {
    inner: ZipWriter<File>,
    options: SimpleFileOptions,
}

impl VsixWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .map_err(|err| Error::ArchiveWrite(format!("cannot create {}: {}", path.display(), err)))?;
        Ok(Self {
            inner: ZipWriter::new(file),
            options: SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(9)),
        })
    }

    /// Append a single entry from memory (used for synthesized content).
    pub fn add_bytes(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        self.inner
            .start_file(name, self.options)
            .map_err(|err| Error::ArchiveWrite(format!("cannot start entry {}: {}", name, err)))?;
        std::io::Write::write_all(&mut self.inner, bytes)
            .map_err(|err| Error::ArchiveWrite(format!("cannot write entry {}: {}", name, err)))?;
        Ok(())
    }

    /// Append every file under `root`, entry names relative to `root`.
    pub fn add_tree(&mut self, root: &Path) -> Result<()> {
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry
                .path()
                .strip_prefix(root)
                .map_err(std::io::Error::other)?
                .to_string_lossy()
                .replace('\\', "/");
            self.inner
                .start_file(name.as_str(), self.options)
                .map_err(|err| Error::ArchiveWrite(format!("cannot start entry {}: {}", name, err)))?;
            let mut file = File::open(entry.path())?;
            std::io::copy(&mut file, &mut self.inner)
                .map_err(|err| Error::ArchiveWrite(format!("cannot write entry {}: {}", name, err)))?;
        }
        Ok(())
    }

    pub fn finish(self) -> Result<()> {
        self.inner
            .finish()
            .map_err(|err| Error::ArchiveWrite(format!("cannot finalize archive: {}", err)))?;
        Ok(())
    }
}

/// Compress the staging tree into `output`, returning the archive size in
/// bytes. Prefers the external `zip` utility; falls back to the in-process
/// writer when the tool is absent or fails. Any pre-existing output from an
/// earlier attempt is removed first so both paths create the archive fresh.
pub fn build(staging: &Path, output: &Path) -> Result<u64> {
    let output = absolutize(output)?;
    if output.exists() {
        fs::remove_file(&output)?;
    }

    match tool::resolve("zip") {
        Some(zip_tool) => match build_with_tool(&zip_tool, staging, &output) {
            Ok(size) => Ok(size),
            Err(err) => {
                warn!("zip utility failed ({}), building in-process", err);
                if output.exists() {
                    fs::remove_file(&output)?;
                }
                build_in_process(staging, &output)
            }
        },
        None => {
            debug!("no zip utility on PATH, building in-process");
            build_in_process(staging, &output)
        }
    }
}

/// Invoke the external compression utility over the staging tree.
///
/// `-D` suppresses directory entries so the listing matches the in-process
/// writer; the staging directory becomes the child's working directory.
fn build_with_tool(zip_tool: &Path, staging: &Path, output: &Path) -> Result<u64> {
    ToolCommand::new(zip_tool)
        .args(["-q", "-r", "-9", "-D"])
        .arg(output)
        .arg(".")
        .current_dir(staging)
        .run("zip")?;
    archive_size(output)
}

fn build_in_process(staging: &Path, output: &Path) -> Result<u64> {
    let mut writer = VsixWriter::create(output)?;
    writer.add_tree(staging)?;
    writer.finish()?;
    archive_size(output)
}

fn archive_size(output: &Path) -> Result<u64> {
    let size = fs::metadata(output)?.len();
    info!(
        "wrote {} ({:.2} KB)",
        output.display(),
        size as f64 / 1024.0
    );
    Ok(size)
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// List entry names in an archive.
pub fn entry_names(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path)?;
    let archive = ZipArchive::new(file)
        .map_err(|err| Error::Verification(format!("{} is not a readable archive: {}", path.display(), err)))?;
    Ok(archive.file_names().map(String::from).collect())
}

/// Check that `path` is a well-formed package: it must contain the package
/// descriptor entry, and the descriptor's Identity must name `expected_id`.
/// The identity comparison guards against a stale or foreign archive
/// satisfying a bare existence check.
pub fn verify(path: &Path, expected_id: &str) -> Result<()> {
    let file = File::open(path)
        .map_err(|err| Error::Verification(format!("cannot open {}: {}", path.display(), err)))?;
    let mut archive = ZipArchive::new(file)
        .map_err(|err| Error::Verification(format!("{} is not a readable archive: {}", path.display(), err)))?;

    let mut xml = String::new();
    archive
        .by_name(MANIFEST_ENTRY)
        .map_err(|_| {
            Error::Verification(format!("{} lacks a {} entry", path.display(), MANIFEST_ENTRY))
        })?
        .read_to_string(&mut xml)
        .map_err(|err| Error::Verification(format!("cannot read descriptor: {}", err)))?;

    let id = descriptor_identity(&xml)?;
    if id == expected_id {
        debug!("verified descriptor identity '{}' in {}", id, path.display());
        Ok(())
    } else {
        Err(Error::Verification(format!(
            "descriptor identity '{}' does not match '{}'",
            id, expected_id
        )))
    }
}

/// Extract the Id attribute of the descriptor's Identity element.
fn descriptor_identity(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.name().as_ref() == b"Identity" => {
                let attr = e
                    .try_get_attribute("Id")
                    .map_err(|err| Error::Verification(format!("malformed Identity: {}", err)))?;
                return match attr {
                    Some(attr) => {
                        let value = attr
                            .unescape_value()
                            .map_err(|err| Error::Verification(format!("malformed Identity Id: {}", err)))?;
                        Ok(value.into_owned())
                    }
                    None => Err(Error::Verification(
                        "descriptor Identity has no Id attribute".to_string(),
                    )),
                };
            }
            Ok(Event::Eof) => {
                return Err(Error::Verification(
                    "descriptor has no Identity element".to_string(),
                ));
            }
            Err(err) => {
                return Err(Error::Verification(format!("malformed descriptor: {}", err)));
            }
            Ok(_) => {}
        }
    }
}
