//! Filesystem-backed documents.
//!
//! Paths are resolved against a base directory, normally the directory of the
//! host document. Mapping programs routinely point at sibling directories
//! (`../data/feed.xml`), so traversal is allowed unless the provider is built
//! with [`FilesystemResourceProvider::confined`].

use crate::{ResourceError, ResourceProvider, SharedResourceData};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

#[derive(Debug)]
pub struct FilesystemResourceProvider {
    base_path: PathBuf,
    /// Set for confined providers: the canonical base every path must stay under.
    confinement: Option<PathBuf>,
}

impl FilesystemResourceProvider {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            confinement: None,
        }
    }

    /// A provider that refuses absolute paths and anything resolving outside `base_path`.
    pub fn confined<P: AsRef<Path>>(base_path: P) -> Self {
        let base = base_path.as_ref().to_path_buf();
        let canonical = base.canonicalize().unwrap_or_else(|_| base.clone());
        Self {
            base_path: base,
            confinement: Some(canonical),
        }
    }

    pub fn base(&self) -> &Path {
        &self.base_path
    }

    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let requested = Path::new(path);
        let Some(canonical_base) = &self.confinement else {
            return Some(self.base_path.join(requested));
        };

        if requested.is_absolute() {
            return None;
        }
        let full_path = self.base_path.join(requested);
        if let Ok(canonical) = full_path.canonicalize() {
            return canonical.starts_with(canonical_base).then_some(canonical);
        }
        // Nonexistent files can't be canonicalized; reject any `..` outright.
        if requested.components().any(|c| c == Component::ParentDir) {
            return None;
        }
        Some(full_path)
    }
}

impl ResourceProvider for FilesystemResourceProvider {
    fn load(&self, path: &str) -> Result<SharedResourceData, ResourceError> {
        let full_path = self.resolve(path).ok_or_else(|| {
            ResourceError::NotFound(format!("{} (outside {})", path, self.base_path.display()))
        })?;
        log::debug!("loading document {}", full_path.display());

        std::fs::read(&full_path).map(Arc::new).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ResourceError::NotFound(path.to_string())
            } else {
                ResourceError::LoadFailed {
                    path: path.to_string(),
                    message: e.to_string(),
                }
            }
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_some_and(|p| p.is_file())
    }

    fn name(&self) -> &'static str {
        "FilesystemResourceProvider"
    }
}
