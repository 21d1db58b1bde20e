use crate::namespace::Namespaces;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The store's root, at position 0. Owns every top-level node.
    Document,
    Element,
    ElementEnd,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
    Doctype,
}

impl NodeKind {
    /// Kinds that open a level and are paired with an `ElementEnd`.
    pub fn is_container(self) -> bool {
        matches!(self, NodeKind::Document | NodeKind::Element)
    }
}

/// A resolved name. `space` is the namespace URI, or the raw prefix when the
/// prefix was never declared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct QName {
    pub space: String,
    pub local: String,
}

impl QName {
    pub fn local(local: impl Into<String>) -> Self {
        QName {
            space: String::new(),
            local: local.into(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.space.is_empty() {
            write!(f, "{}", self.local)
        } else {
            write!(f, "{{{}}}{}", self.space, self.local)
        }
    }
}

/// One entry of a store's node sequence.
///
/// `position`, `pair`, `parent` and `children` are derived and recomputed by
/// every reindex; `ident` is the node's identity and travels with it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) name: QName,
    pub(crate) value: String,
    pub(crate) ident: u32,
    pub(crate) position: usize,
    pub(crate) pair: usize,
    pub(crate) parent: Option<usize>,
    pub(crate) children: Vec<usize>,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, name: QName, value: String) -> Self {
        Node {
            kind,
            name,
            value,
            ident: 0,
            position: 0,
            pair: 0,
            parent: None,
            children: Vec::new(),
        }
    }

    pub(crate) fn element(name: QName) -> Self {
        Node::new(NodeKind::Element, name, String::new())
    }

    pub(crate) fn end() -> Self {
        Node::new(NodeKind::ElementEnd, QName::default(), String::new())
    }

    pub(crate) fn leaf(kind: NodeKind, value: impl Into<String>) -> Self {
        Node::new(kind, QName::default(), value.into())
    }

    pub(crate) fn attribute(name: QName, value: impl Into<String>) -> Self {
        Node::new(NodeKind::Attribute, name, value.into())
    }

    /// A processing instruction's target: the first word of its content.
    pub(crate) fn target(&self) -> &str {
        self.value.split_whitespace().next().unwrap_or("")
    }
}

/// A detached, balanced run of nodes: zero or more complete subtrees that can
/// be grafted into any store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    pub(crate) nodes: Vec<Node>,
    /// Non-default bindings in scope where the nodes were extracted.
    pub(crate) scope: Namespaces,
}

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single text node.
    pub fn text(text: impl Into<String>) -> Self {
        Fragment {
            nodes: vec![Node::leaf(NodeKind::Text, text)],
            scope: Namespaces::new(),
        }
    }

    /// Appends `other`. On a prefix bound differently by the two, the
    /// binding already held wins.
    pub fn append(&mut self, mut other: Fragment) {
        self.nodes.append(&mut other.nodes);
        for (prefix, uri) in other.scope {
            self.scope.entry(prefix).or_insert(uri);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes, counting attributes and end markers.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

impl FromIterator<Fragment> for Fragment {
    fn from_iter<I: IntoIterator<Item = Fragment>>(iter: I) -> Self {
        let mut all = Fragment::new();
        for fragment in iter {
            all.append(fragment);
        }
        all
    }
}
