//! Where template sources come from.
//!
//! `src=` attributes and fetched item lists name documents by path; the
//! interpreter asks a [`ResourceProvider`] for their bytes and never touches
//! the filesystem itself.
//!
//! - [`FilesystemResourceProvider`]: reads files relative to a base directory
//! - [`InMemoryResourceProvider`]: a pre-populated map, used by tests and embedders

mod filesystem;
mod memory;

pub use filesystem::FilesystemResourceProvider;
pub use memory::InMemoryResourceProvider;

use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResourceError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("failed to load resource '{path}': {message}")]
    LoadFailed { path: String, message: String },

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ResourceError {
    fn from(err: std::io::Error) -> Self {
        ResourceError::Io(err.to_string())
    }
}

/// Document bytes, shared so repeated loads of one path stay cheap.
pub type SharedResourceData = Arc<Vec<u8>>;

pub trait ResourceProvider: Send + Sync + Debug {
    /// Loads the document at `path`, as written in the mapping program.
    fn load(&self, path: &str) -> Result<SharedResourceData, ResourceError>;

    fn exists(&self, path: &str) -> bool;

    /// Human-readable provider name for log output.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_error_display() {
        let err = ResourceError::NotFound("feed.xml".to_string());
        assert!(err.to_string().contains("feed.xml"));

        let err = ResourceError::LoadFailed {
            path: "items.xml".to_string(),
            message: "permission denied".to_string(),
        };
        assert!(err.to_string().contains("items.xml"));
        assert!(err.to_string().contains("permission denied"));
    }

    #[test]
    fn test_resource_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err: ResourceError = io_err.into();
        assert!(matches!(err, ResourceError::Io(_)));
        assert!(err.to_string().contains("disk on fire"));
    }

    #[test]
    fn test_providers_are_object_safe() {
        let providers: Vec<Box<dyn ResourceProvider>> = vec![
            Box::new(InMemoryResourceProvider::new()),
            Box::new(FilesystemResourceProvider::new(".")),
        ];
        let names: Vec<_> = providers.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["InMemoryResourceProvider", "FilesystemResourceProvider"]);
    }
}
