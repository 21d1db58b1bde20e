use crate::{ResourceError, ResourceProvider, SharedResourceData};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Documents held in memory, keyed by the exact path the mapping program uses.
#[derive(Debug, Default)]
pub struct InMemoryResourceProvider {
    documents: RwLock<HashMap<String, SharedResourceData>>,
}

impl InMemoryResourceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion, for setting up a provider in one expression.
    pub fn with(self, path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        if let Err(e) = self.add(path, data) {
            log::warn!("{}", e);
        }
        self
    }

    /// # Errors
    ///
    /// Returns `ResourceError::LoadFailed` if the internal lock is poisoned.
    pub fn add(&self, path: impl Into<String>, data: impl Into<Vec<u8>>) -> Result<(), ResourceError> {
        let path = path.into();
        let mut documents = self.documents.write().map_err(|_| ResourceError::LoadFailed {
            path: path.clone(),
            message: "document store lock poisoned".to_string(),
        })?;
        documents.insert(path, Arc::new(data.into()));
        Ok(())
    }

    pub fn remove(&self, path: &str) -> Option<SharedResourceData> {
        self.documents.write().ok()?.remove(path)
    }

    /// Returns 0 if the lock is poisoned.
    pub fn len(&self) -> usize {
        self.documents.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResourceProvider for InMemoryResourceProvider {
    fn load(&self, path: &str) -> Result<SharedResourceData, ResourceError> {
        let documents = self.documents.read().map_err(|_| ResourceError::LoadFailed {
            path: path.to_string(),
            message: "document store lock poisoned".to_string(),
        })?;
        documents
            .get(path)
            .cloned()
            .ok_or_else(|| ResourceError::NotFound(path.to_string()))
    }

    fn exists(&self, path: &str) -> bool {
        self.documents
            .read()
            .map(|d| d.contains_key(path))
            .unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        "InMemoryResourceProvider"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_load() {
        let provider = InMemoryResourceProvider::new();
        provider.add("items.xml", "<items/>").unwrap();

        let data = provider.load("items.xml").unwrap();
        assert_eq!(&*data, b"<items/>");
        assert!(provider.exists("items.xml"));
    }

    #[test]
    fn test_not_found() {
        let provider = InMemoryResourceProvider::new();
        assert!(matches!(
            provider.load("missing.xml"),
            Err(ResourceError::NotFound(_))
        ));
        assert!(!provider.exists("missing.xml"));
    }

    #[test]
    fn test_builder_and_overwrite() {
        let provider = InMemoryResourceProvider::new()
            .with("a.xml", "<a/>")
            .with("a.xml", "<b/>");
        assert_eq!(provider.len(), 1);
        assert_eq!(&*provider.load("a.xml").unwrap(), b"<b/>");
    }

    #[test]
    fn test_remove() {
        let provider = InMemoryResourceProvider::new().with("a.xml", "<a/>");
        assert!(provider.remove("a.xml").is_some());
        assert!(provider.remove("a.xml").is_none());
        assert!(provider.is_empty());
    }
}
