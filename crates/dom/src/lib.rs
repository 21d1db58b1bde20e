//! A markup node store built for in-place rewriting.
//!
//! A [`Document`] keeps its nodes in one flat preorder sequence with explicit
//! end markers. Structural edits rebuild the sequence and reindex it; callers
//! hold [`NodeId`] handles that follow their node across every edit.
//!
//! ```text
//! <ul><li>a</li></ul>   ->   Document ul li "a" /li /ul /Document
//! ```

mod breadcrumb;
mod document;
mod error;
mod mutate;
mod namespace;
mod node;
mod parse;
mod serialize;
mod tokenizer;
mod xpath;

pub use document::{Document, NodeId};
pub use error::{DomError, ParseError};
pub use namespace::{Namespaces, XML_NAMESPACE};
pub use node::{Fragment, NodeKind, QName};
pub use parse::parse;
pub use tokenizer::{
    ParseMode, Token, TokenKind, Tokenizer, VOID_ELEMENTS, is_raw_text_element, is_void_element,
};
pub use xpath::NodeRef;
