//! The navigation contract the query engine is written against.
use std::hash::Hash;

/// A qualified name. `namespace` is the resolved namespace URI, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QName<'a> {
    pub namespace: Option<&'a str>,
    pub local: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Root,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
}

/// A node of a read-only markup tree, as seen by the query engine.
///
/// Implementations are cheap handles (`Copy`) whose `Ord` is document order,
/// with an element ordered before its attributes and its attributes before its
/// children.
pub trait XPathNode<'a>:
    std::fmt::Debug + Clone + Copy + PartialEq + Eq + Hash + PartialOrd + Ord
{
    fn node_type(&self) -> NodeType;

    /// Element and attribute names, or a processing instruction's target.
    fn name(&self) -> Option<QName<'a>>;

    /// The XPath string value: the concatenated descendant text for roots and
    /// elements, the value for everything else.
    fn string_value(&self) -> String;

    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    fn parent(&self) -> Option<Self>;

    /// The root of the tree this node belongs to.
    fn root(&self) -> Self {
        let mut current = *self;
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }
}
