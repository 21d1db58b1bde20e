//! XPath 1.0 path queries over any tree that implements [`XPathNode`].

pub mod ast;
pub mod axes;
pub mod engine;
pub mod error;
pub mod functions;
pub mod node;
pub mod operators;
pub mod parser;
pub mod query;
pub mod value;

pub use ast::{Axis, BinaryOperator, Expression, LocationPath, NodeTest, Step};
pub use engine::{EvaluationContext, evaluate};
pub use error::XPathError;
pub use node::{NodeType, QName, XPathNode};
pub use parser::parse_expression;
pub use query::Query;
pub use value::XPathValue;
