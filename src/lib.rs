//! markweave expands `<template-instance>` elements in markup documents.
//!
//! The work is split across the workspace crates, re-exported here:
//!
//! - [`xpath`]: path queries over any navigable tree.
//! - [`dom`]: the tokenizer, the node store and its mutations.
//! - [`resource`]: where `src=` and fetched documents come from.
//! - [`template`]: mapping programs and the host-document driver.
//!
//! ```no_run
//! use markweave::{ParseMode, expand_file};
//!
//! let page = expand_file("site/index.html", ParseMode::Html)?;
//! print!("{}", String::from_utf8_lossy(&page));
//! # Ok::<(), markweave::MarkweaveError>(())
//! ```

pub mod error;

pub use markweave_dom as dom;
pub use markweave_resource as resource;
pub use markweave_template as template;
pub use markweave_xpath as xpath;

pub use error::MarkweaveError;
pub use markweave_dom::{Document, NodeId, ParseMode};
pub use markweave_template::{Program, TemplateContext, TemplateError, expand_document, run_template};

use std::io::Read;
use std::path::{Path, PathBuf};

/// Expands the host document at `path`. Documents it refers to are read
/// relative to its directory.
pub fn expand_file(path: impl AsRef<Path>, mode: ParseMode) -> Result<Vec<u8>, MarkweaveError> {
    let path = path.as_ref();
    let host = std::fs::read(path).map_err(|source| MarkweaveError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let base = base_dir(path.parent().unwrap_or(Path::new("")))?;
    expand_bytes(&host, &base, mode)
}

/// Expands a host document read from `reader`, resolving its references
/// against `base`.
pub fn expand_reader(
    mut reader: impl Read,
    base: impl AsRef<Path>,
    mode: ParseMode,
) -> Result<Vec<u8>, MarkweaveError> {
    let mut host = Vec::new();
    reader
        .read_to_end(&mut host)
        .map_err(|source| MarkweaveError::Io {
            path: PathBuf::from("-"),
            source,
        })?;
    let base = base_dir(base.as_ref())?;
    expand_bytes(&host, &base, mode)
}

fn expand_bytes(host: &[u8], base: &Path, mode: ParseMode) -> Result<Vec<u8>, MarkweaveError> {
    log::debug!("expanding {} bytes against {}", host.len(), base.display());
    let context = TemplateContext::for_directory(base).with_mode(mode);
    Ok(expand_document(host, &context)?)
}

/// `dir` made absolute, so that `link-relative` results are computed against
/// a fixed directory.
fn base_dir(dir: &Path) -> Result<PathBuf, MarkweaveError> {
    if dir.is_absolute() {
        return Ok(dir.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|source| MarkweaveError::Io {
        path: PathBuf::from("."),
        source,
    })?;
    Ok(if dir.as_os_str().is_empty() {
        cwd
    } else {
        cwd.join(dir)
    })
}
