use markweave_template::TemplateError;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error for expanding a host document.
#[derive(Error, Debug)]
pub enum MarkweaveError {
    #[error("Template expansion failed: {0}")]
    Template(#[from] TemplateError),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
