// src/lib.rs

//! vsixpack
//!
//! Packages a VS Code color theme extension into a VSIX archive, the
//! ZIP-based distributable the extension gallery consumes.
//!
//! # Architecture
//!
//! - Metadata-first: package.json is loaded and validated before any
//!   file I/O; invalid metadata aborts the run
//! - Layered strategies: external packaging CLI, then manual staged
//!   assembly, then a rescue script, each attempted at most once
//! - Scoped staging: the staging tree is uniquely named and removed on
//!   success and failure alike
//! - Verified output: every produced archive must carry a package
//!   descriptor whose identity matches the metadata

pub mod archive;
pub mod commands;
mod error;
pub mod manifest;
pub mod metadata;
pub mod staging;
pub mod strategy;
pub mod tool;

pub use error::{Error, Result};
pub use metadata::ExtensionMetadata;
pub use strategy::{Outcome, PackageContext, PackagingStrategy, Selector};
