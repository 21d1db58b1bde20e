//! Builds a store from a token stream.

use crate::document::Document;
use crate::error::ParseError;
use crate::namespace::{Namespaces, base_namespaces, declare_raw, resolve};
use crate::node::{Node, NodeKind};
use crate::tokenizer::{ParseMode, Token, TokenKind, Tokenizer};

/// Parses a complete document.
pub fn parse(input: &[u8], mode: ParseMode) -> Result<Document, ParseError> {
    let mut builder = Builder::new();
    for token in Tokenizer::new(input, mode) {
        builder.push(token?);
    }
    let doc = builder.finish(mode);
    log::debug!("parsed {} bytes into {} nodes", input.len(), doc.len());
    Ok(doc)
}

impl Document {
    pub fn parse(input: &[u8], mode: ParseMode) -> Result<Document, ParseError> {
        parse(input, mode)
    }
}

struct Builder {
    nodes: Vec<Node>,
    /// In-scope declarations, one entry per open element plus the base.
    scopes: Vec<Namespaces>,
}

impl Builder {
    fn new() -> Self {
        Builder {
            nodes: vec![Node::leaf(NodeKind::Document, "")],
            scopes: vec![base_namespaces()],
        }
    }

    fn scope(&self) -> &Namespaces {
        // The base scope is never popped.
        &self.scopes[self.scopes.len() - 1]
    }

    fn push(&mut self, token: Token) {
        match token.kind {
            TokenKind::Start | TokenKind::Empty => {
                let mut scope = self.scope().clone();
                declare_raw(
                    &mut scope,
                    token.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str())),
                );
                self.nodes
                    .push(Node::element(resolve(&scope, &token.name, false)));
                for (key, value) in token.attributes {
                    self.nodes
                        .push(Node::attribute(resolve(&scope, &key, true), value));
                }
                if token.kind == TokenKind::Start {
                    self.scopes.push(scope);
                } else {
                    self.nodes.push(Node::end());
                }
            }
            TokenKind::End => {
                for _ in 0..token.closes {
                    self.close();
                }
            }
            TokenKind::Text => self.nodes.push(Node::leaf(NodeKind::Text, token.text)),
            TokenKind::Comment => self.nodes.push(Node::leaf(NodeKind::Comment, token.text)),
            TokenKind::ProcessingInstruction => self
                .nodes
                .push(Node::leaf(NodeKind::ProcessingInstruction, token.text)),
            TokenKind::Doctype => self.nodes.push(Node::leaf(NodeKind::Doctype, token.text)),
        }
    }

    fn close(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
            self.nodes.push(Node::end());
        }
    }

    fn finish(mut self, mode: ParseMode) -> Document {
        while self.scopes.len() > 1 {
            self.close();
        }
        self.nodes.push(Node::end());
        Document::from_nodes(self.nodes, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::tests::assert_consistent;

    fn kinds(doc: &Document) -> Vec<NodeKind> {
        doc.nodes.iter().map(|n| n.kind).collect()
    }

    #[test]
    fn test_sequence_layout() {
        let doc = parse(b"<a x=\"1\">t<b/></a>", ParseMode::Xml).unwrap();
        assert_eq!(
            kinds(&doc),
            vec![
                NodeKind::Document,
                NodeKind::Element,
                NodeKind::Attribute,
                NodeKind::Text,
                NodeKind::Element,
                NodeKind::ElementEnd,
                NodeKind::ElementEnd,
                NodeKind::ElementEnd,
            ]
        );
        assert_consistent(&doc);
    }

    #[test]
    fn test_empty_input() {
        let doc = parse(b"", ParseMode::Xml).unwrap();
        assert!(doc.is_empty());
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn test_strict_errors() {
        assert_eq!(
            parse(b"<a><b></a>", ParseMode::Xml).unwrap_err().to_string(),
            "a/b: non matching close tag </a>"
        );
        assert!(matches!(
            parse(b"<a>", ParseMode::Xml),
            Err(ParseError::Unclosed { .. })
        ));
    }

    #[test]
    fn test_lenient_recovery() {
        let doc = parse(b"<ul><li>one<li>two</ul></div>", ParseMode::Html).unwrap();
        assert_consistent(&doc);
        assert_eq!(
            String::from_utf8(doc.to_bytes()).unwrap(),
            "<ul><li>one<li>two</li></li></ul>"
        );

        let doc = parse(b"<p>open", ParseMode::Html).unwrap();
        assert_consistent(&doc);
        assert_eq!(String::from_utf8(doc.to_bytes()).unwrap(), "<p>open</p>");
    }
}
