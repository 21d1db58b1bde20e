//! Compiled, reusable path queries.

use crate::ast::Expression;
use crate::engine::{EvaluationContext, evaluate};
use crate::error::XPathError;
use crate::node::XPathNode;
use crate::parser::parse_expression;
use crate::value::XPathValue;
use std::fmt;
use std::str::FromStr;

/// A path query compiled once and evaluated against any number of context nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    source: String,
    expr: Expression,
}

impl Query {
    pub fn compile(source: &str) -> Result<Self, XPathError> {
        let expr = parse_expression(source)?;
        log::trace!("compiled query '{}'", source);
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn expression(&self) -> &Expression {
        &self.expr
    }

    pub fn evaluate<'a, N>(&self, context: N) -> Result<XPathValue<N>, XPathError>
    where
        N: XPathNode<'a> + 'a,
    {
        evaluate(&self.expr, &EvaluationContext::new(context))
    }

    /// Evaluates to a node-set; any other result type is a `Type` error.
    pub fn select<'a, N>(&self, context: N) -> Result<Vec<N>, XPathError>
    where
        N: XPathNode<'a> + 'a,
    {
        match self.evaluate(context)? {
            XPathValue::NodeSet(nodes) => Ok(nodes),
            other => Err(XPathError::Type(format!(
                "query '{}' evaluated to '{}', not a node-set",
                self.source, other
            ))),
        }
    }

    pub fn exists<'a, N>(&self, context: N) -> Result<bool, XPathError>
    where
        N: XPathNode<'a> + 'a,
    {
        Ok(self.evaluate(context)?.to_bool())
    }
}

impl FromStr for Query {
    type Err = XPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Query::compile(s)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
