//! The node store: one flat, preorder sequence of nodes per document.

use crate::error::DomError;
use crate::namespace::Namespaces;
use crate::node::{Fragment, Node, NodeKind, QName};
use crate::tokenizer::ParseMode;
use crate::xpath::NodeRef;
use std::ops::Range;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_DOCUMENT_ID: AtomicU32 = AtomicU32::new(1);

/// A stable handle to a node.
///
/// Handles survive every structural edit of their store. They stop resolving
/// (with [`DomError::StaleHandle`]) once their node is removed, and never
/// resolve against any other store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    doc: u32,
    ident: u32,
}

/// An owned markup tree.
///
/// Position 0 is the `Document` node and the last position its `ElementEnd`;
/// everything else sits in between in document order, each element followed
/// by its attributes, then its children, then its own `ElementEnd`.
#[derive(Debug)]
pub struct Document {
    id: u32,
    mode: ParseMode,
    pub(crate) nodes: Vec<Node>,
    /// Current position of each node identity, `None` once removed.
    locations: Vec<Option<usize>>,
    next_ident: u32,
    /// Bindings a detached copy inherits from where it was cut out.
    pub(crate) inherited: Namespaces,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Document {
    /// A deep copy with its own identity: handles into `self` do not resolve in the copy.
    fn clone(&self) -> Self {
        let mut copy = Document::from_nodes(self.nodes.clone(), self.mode);
        copy.inherited = self.inherited.clone();
        copy
    }
}

impl Document {
    /// An empty document.
    pub fn new() -> Self {
        Document::from_fragment(Fragment::new())
    }

    /// A document whose only content is one text node.
    pub fn from_text(text: impl Into<String>) -> Self {
        Document::from_fragment(Fragment::text(text))
    }

    /// A document holding `fragment`. Namespace bindings the fragment was
    /// extracted under stay in scope for its nodes.
    pub fn from_fragment(fragment: Fragment) -> Self {
        let mut nodes = Vec::with_capacity(fragment.nodes.len() + 2);
        nodes.push(Node::leaf(NodeKind::Document, ""));
        nodes.extend(fragment.nodes);
        nodes.push(Node::end());
        let mut doc = Document::from_nodes(nodes, ParseMode::Xml);
        doc.inherited = fragment.scope;
        doc
    }

    /// Takes a complete, balanced sequence and assigns fresh identities.
    pub(crate) fn from_nodes(mut nodes: Vec<Node>, mode: ParseMode) -> Self {
        for (ident, node) in nodes.iter_mut().enumerate() {
            node.ident = ident as u32;
        }
        let count = nodes.len();
        let mut doc = Document {
            id: NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed),
            mode,
            nodes,
            locations: Vec::with_capacity(count),
            next_ident: count as u32,
            inherited: Namespaces::new(),
        };
        doc.reindex();
        doc
    }

    /// Recomputes every derived field in one pass and re-targets handles by
    /// node identity.
    pub(crate) fn reindex(&mut self) {
        self.locations.iter_mut().for_each(|l| *l = None);
        let mut open: Vec<usize> = Vec::new();

        for i in 0..self.nodes.len() {
            let parent = open.last().copied();
            let kind = self.nodes[i].kind;
            let node = &mut self.nodes[i];
            node.position = i;
            node.pair = i;
            node.parent = parent;
            node.children.clear();
            let ident = node.ident as usize;

            match kind {
                NodeKind::ElementEnd => {
                    if let Some(start) = open.pop() {
                        self.nodes[start].pair = i;
                        self.nodes[i].pair = start;
                    }
                }
                NodeKind::Attribute => {}
                _ => {
                    if let Some(parent) = parent {
                        self.nodes[parent].children.push(i);
                    }
                }
            }
            if kind.is_container() {
                open.push(i);
            }

            if ident >= self.locations.len() {
                self.locations.resize(ident + 1, None);
            }
            self.locations[ident] = Some(i);
        }
        debug_assert!(open.is_empty(), "unbalanced node sequence");
    }

    pub(crate) fn allocate_ident(&mut self) -> u32 {
        let ident = self.next_ident;
        self.next_ident += 1;
        ident
    }

    pub(crate) fn locate(&self, id: NodeId) -> Result<usize, DomError> {
        if id.doc != self.id {
            return Err(DomError::StaleHandle);
        }
        self.locations
            .get(id.ident as usize)
            .copied()
            .flatten()
            .ok_or(DomError::StaleHandle)
    }

    pub(crate) fn id_at(&self, position: usize) -> NodeId {
        NodeId {
            doc: self.id,
            ident: self.nodes[position].ident,
        }
    }

    pub(crate) fn node(&self, id: NodeId) -> Result<&Node, DomError> {
        Ok(&self.nodes[self.locate(id)?])
    }

    /// Positions covered by the node: through its `ElementEnd` for containers.
    pub(crate) fn extent(&self, position: usize) -> Range<usize> {
        let node = &self.nodes[position];
        if node.kind.is_container() {
            position..node.pair + 1
        } else {
            position..position + 1
        }
    }

    /// First position after a container's attributes.
    pub(crate) fn content_start(&self, position: usize) -> usize {
        let mut i = position + 1;
        while self.nodes[i].kind == NodeKind::Attribute {
            i += 1;
        }
        i
    }

    pub(crate) fn attribute_positions(&self, position: usize) -> Range<usize> {
        if self.nodes[position].kind == NodeKind::Element {
            position + 1..self.content_start(position)
        } else {
            position..position
        }
    }

    pub fn mode(&self) -> ParseMode {
        self.mode
    }

    pub(crate) fn set_mode(&mut self, mode: ParseMode) {
        self.mode = mode;
    }

    /// Total number of nodes, including the `Document` node, attributes and end markers.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the document has no content at all.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 2
    }

    pub fn root(&self) -> NodeId {
        self.id_at(0)
    }

    /// The single top-level element, if there is exactly one.
    pub fn document_element(&self) -> Option<NodeId> {
        let mut elements = self.nodes[0]
            .children
            .iter()
            .filter(|&&c| self.nodes[c].kind == NodeKind::Element);
        match (elements.next(), elements.next()) {
            (Some(&only), None) => Some(self.id_at(only)),
            _ => None,
        }
    }

    pub fn kind(&self, id: NodeId) -> Result<NodeKind, DomError> {
        Ok(self.node(id)?.kind)
    }

    /// Element and attribute names.
    pub fn name(&self, id: NodeId) -> Result<Option<&QName>, DomError> {
        let node = self.node(id)?;
        Ok(match node.kind {
            NodeKind::Element | NodeKind::Attribute => Some(&node.name),
            _ => None,
        })
    }

    /// The stored value of a leaf; empty for containers.
    pub fn value(&self, id: NodeId) -> Result<&str, DomError> {
        Ok(&self.node(id)?.value)
    }

    /// Concatenated descendant text for containers, the value otherwise.
    pub fn string_value(&self, id: NodeId) -> Result<String, DomError> {
        Ok(self.string_value_at(self.locate(id)?))
    }

    pub(crate) fn string_value_at(&self, position: usize) -> String {
        let node = &self.nodes[position];
        if !node.kind.is_container() {
            return node.value.clone();
        }
        self.nodes[position + 1..node.pair]
            .iter()
            .filter(|n| n.kind == NodeKind::Text)
            .map(|n| n.value.as_str())
            .collect()
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, DomError> {
        Ok(self.node(id)?.parent.map(|p| self.id_at(p)))
    }

    pub fn children(&self, id: NodeId) -> Result<Vec<NodeId>, DomError> {
        Ok(self
            .node(id)?
            .children
            .iter()
            .map(|&c| self.id_at(c))
            .collect())
    }

    pub fn attributes(&self, id: NodeId) -> Result<Vec<NodeId>, DomError> {
        let position = self.locate(id)?;
        Ok(self
            .attribute_positions(position)
            .map(|p| self.id_at(p))
            .collect())
    }

    /// The value of the unprefixed attribute `name`.
    pub fn attribute(&self, id: NodeId, name: &str) -> Result<Option<&str>, DomError> {
        let position = self.locate(id)?;
        Ok(self.nodes[self.attribute_positions(position)]
            .iter()
            .find(|a| a.name.space.is_empty() && a.name.local == name)
            .map(|a| a.value.as_str()))
    }

    pub fn position(&self, id: NodeId) -> Result<usize, DomError> {
        self.locate(id)
    }

    /// True while `id` addresses a node of this store.
    pub fn contains(&self, id: NodeId) -> bool {
        self.locate(id).is_ok()
    }

    /// For containers, the position of the matching end marker.
    pub fn pair_position(&self, id: NodeId) -> Result<Option<usize>, DomError> {
        let node = self.node(id)?;
        Ok(node.kind.is_container().then_some(node.pair))
    }

    /// A read-only view for path queries.
    pub fn node_ref(&self, id: NodeId) -> Result<NodeRef<'_>, DomError> {
        Ok(NodeRef::new(self, self.locate(id)?))
    }
}
