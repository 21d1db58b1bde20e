use markweave_dom::{DomError, ParseError};
use markweave_resource::ResourceError;
use markweave_xpath::XPathError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    #[error("markup parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("cannot parse source document '{path}': {source}")]
    InvalidSource {
        path: String,
        #[source]
        source: ParseError,
    },

    #[error("query error: {0}")]
    Query(#[from] XPathError),

    #[error("template tree error: {0}")]
    Dom(#[from] DomError),

    #[error("missing resource '{path}': {source}")]
    MissingResource {
        path: String,
        #[source]
        source: ResourceError,
    },

    /// Two items being sorted disagree on the direction of the key at `position`.
    #[error("sort direction conflict at key {position}")]
    SortDirectionConflict { position: usize },

    #[error("no template found for <template-instance{}>", using_suffix(.using))]
    MissingTemplate { using: Option<String> },

    #[error("cannot resolve link '{link}': {message}")]
    InvalidLink { link: String, message: String },
}

fn using_suffix(using: &Option<String>) -> String {
    match using {
        Some(id) => format!(" using=\"{}\"", id),
        None => String::new(),
    }
}
