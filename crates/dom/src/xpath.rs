//! Path-query view of a store.

use crate::document::{Document, NodeId};
use crate::node::NodeKind;
use markweave_xpath::{NodeType, QName, XPathNode};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A borrowed node, ordered by document position.
#[derive(Clone, Copy)]
pub struct NodeRef<'d> {
    doc: &'d Document,
    position: usize,
}

impl<'d> NodeRef<'d> {
    pub(crate) fn new(doc: &'d Document, position: usize) -> Self {
        NodeRef { doc, position }
    }

    /// A stable handle to this node, valid after the borrow ends.
    pub fn id(&self) -> NodeId {
        self.doc.id_at(self.position)
    }

    pub fn kind(&self) -> NodeKind {
        self.doc.nodes[self.position].kind
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn document(&self) -> &'d Document {
        self.doc
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = &self.doc.nodes[self.position];
        write!(f, "NodeRef({:?} {} @{})", node.kind, node.name, self.position)
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.position == other.position
    }
}

impl Eq for NodeRef<'_> {}

impl PartialOrd for NodeRef<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NodeRef<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        let doc_order = (self.doc as *const Document).cmp(&(other.doc as *const Document));
        doc_order.then(self.position.cmp(&other.position))
    }
}

impl Hash for NodeRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self.doc, state);
        self.position.hash(state);
    }
}

impl<'d> XPathNode<'d> for NodeRef<'d> {
    fn node_type(&self) -> NodeType {
        match self.kind() {
            NodeKind::Document => NodeType::Root,
            NodeKind::Element | NodeKind::ElementEnd => NodeType::Element,
            NodeKind::Attribute => NodeType::Attribute,
            NodeKind::Text => NodeType::Text,
            NodeKind::Comment | NodeKind::Doctype => NodeType::Comment,
            NodeKind::ProcessingInstruction => NodeType::ProcessingInstruction,
        }
    }

    fn name(&self) -> Option<QName<'d>> {
        let node = &self.doc.nodes[self.position];
        match node.kind {
            NodeKind::Element | NodeKind::Attribute => Some(QName {
                namespace: (!node.name.space.is_empty()).then_some(node.name.space.as_str()),
                local: &node.name.local,
            }),
            NodeKind::ProcessingInstruction => Some(QName {
                namespace: None,
                local: node.target(),
            }),
            _ => None,
        }
    }

    fn string_value(&self) -> String {
        self.doc.string_value_at(self.position)
    }

    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'd> {
        let doc = self.doc;
        Box::new(
            doc.attribute_positions(self.position)
                .map(move |position| NodeRef { doc, position }),
        )
    }

    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'd> {
        let doc = self.doc;
        Box::new(
            doc.nodes[self.position]
                .children
                .iter()
                .filter(move |&&c| doc.nodes[c].kind != NodeKind::Doctype)
                .map(move |&position| NodeRef { doc, position }),
        )
    }

    fn parent(&self) -> Option<Self> {
        let doc = self.doc;
        doc.nodes[self.position]
            .parent
            .map(|position| NodeRef { doc, position })
    }
}
