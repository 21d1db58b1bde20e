use crate::error::TemplateError;
use markweave_dom::{Document, ParseMode};
use markweave_resource::{FilesystemResourceProvider, ResourceProvider};
use std::path::Path;
use std::sync::Arc;

pub const DEFAULT_DATETIME_PATTERN: &str = "%c";

/// Everything a template evaluation needs from its surroundings.
///
/// There is no global state: the base directory, the parse mode and the
/// document loader all travel in here.
#[derive(Debug, Clone)]
pub struct TemplateContext {
    provider: Arc<dyn ResourceProvider>,
    base_dir: String,
    mode: ParseMode,
    datetime_pattern: String,
}

impl TemplateContext {
    pub fn new(provider: Arc<dyn ResourceProvider>) -> Self {
        TemplateContext {
            provider,
            base_dir: String::new(),
            mode: ParseMode::Xml,
            datetime_pattern: DEFAULT_DATETIME_PATTERN.to_string(),
        }
    }

    /// Reads documents from `dir`, which is also the base for `link-relative`.
    pub fn for_directory(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(Arc::new(FilesystemResourceProvider::new(dir)))
            .with_base_dir(dir.to_string_lossy())
    }

    pub fn with_base_dir(mut self, dir: impl Into<String>) -> Self {
        self.base_dir = dir.into();
        self
    }

    pub fn with_mode(mut self, mode: ParseMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_datetime_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.datetime_pattern = pattern.into();
        self
    }

    pub fn base_dir(&self) -> &str {
        &self.base_dir
    }

    pub fn mode(&self) -> ParseMode {
        self.mode
    }

    pub fn datetime_pattern(&self) -> &str {
        &self.datetime_pattern
    }

    pub fn provider(&self) -> &dyn ResourceProvider {
        self.provider.as_ref()
    }

    pub fn parse(&self, markup: &[u8]) -> Result<Document, TemplateError> {
        Ok(Document::parse(markup, self.mode)?)
    }

    /// Loads and parses the source document at `path`.
    pub fn load_source(&self, path: &str) -> Result<Document, TemplateError> {
        let data = self
            .provider
            .load(path)
            .map_err(|source| TemplateError::MissingResource {
                path: path.to_string(),
                source,
            })?;
        log::debug!("loaded {} ({} bytes) via {}", path, data.len(), self.provider.name());
        Document::parse(&data, self.mode).map_err(|source| TemplateError::InvalidSource {
            path: path.to_string(),
            source,
        })
    }
}
