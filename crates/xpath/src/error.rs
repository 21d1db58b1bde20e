use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum XPathError {
    #[error("invalid path query '{expr}': {message}")]
    Parse { expr: String, message: String },

    #[error("function '{function}': {message}")]
    Function { function: String, message: String },

    #[error("type error: {0}")]
    Type(String),
}

impl XPathError {
    pub(crate) fn parse(expr: &str, message: impl Into<String>) -> Self {
        XPathError::Parse {
            expr: expr.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn function(function: &str, message: impl Into<String>) -> Self {
        XPathError::Function {
            function: function.to_string(),
            message: message.into(),
        }
    }
}
