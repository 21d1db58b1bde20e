//! Structural edits. Each one computes the new sequence, splices it in and
//! reindexes, so handles held by callers keep pointing at their nodes.

use crate::document::{Document, NodeId};
use crate::error::DomError;
use crate::node::{Fragment, NodeKind};
use std::ops::Range;

impl Document {
    /// Discards the children of a container and grafts `content` in their place.
    /// Attributes are kept.
    pub fn replace_children(&mut self, target: NodeId, content: Fragment) -> Result<(), DomError> {
        let position = self.locate(target)?;
        let kind = self.nodes[position].kind;
        if !kind.is_container() {
            return Err(DomError::InvalidNodeKind {
                operation: "replace_children",
                kind,
            });
        }
        let start = self.content_start(position);
        let end = self.nodes[position].pair;
        self.splice(start..end, content, position);
        Ok(())
    }

    /// Sets the text of a node. Containers get a single text child (or none
    /// for empty text); leaves have their value replaced in place.
    pub fn set_text(&mut self, target: NodeId, text: &str) -> Result<(), DomError> {
        let position = self.locate(target)?;
        match self.nodes[position].kind {
            NodeKind::Document | NodeKind::Element => {
                let content = if text.is_empty() {
                    Fragment::new()
                } else {
                    Fragment::text(text)
                };
                self.replace_children(target, content)
            }
            NodeKind::ElementEnd => Err(DomError::InvalidNodeKind {
                operation: "set_text",
                kind: NodeKind::ElementEnd,
            }),
            _ => {
                self.nodes[position].value = text.to_string();
                Ok(())
            }
        }
    }

    pub fn insert_before(&mut self, target: NodeId, content: Fragment) -> Result<(), DomError> {
        let position = self.sibling_anchor(target, "insert_before")?;
        let parent = self.nodes[position].parent.unwrap_or(0);
        self.splice(position..position, content, parent);
        Ok(())
    }

    /// Inserts after the target's full extent (after its end marker for elements).
    pub fn insert_after(&mut self, target: NodeId, content: Fragment) -> Result<(), DomError> {
        let position = self.sibling_anchor(target, "insert_after")?;
        let end = self.extent(position).end;
        let parent = self.nodes[position].parent.unwrap_or(0);
        self.splice(end..end, content, parent);
        Ok(())
    }

    /// Deletes the target and, for elements, everything inside it.
    pub fn remove(&mut self, target: NodeId) -> Result<(), DomError> {
        let position = self.locate(target)?;
        match self.nodes[position].kind {
            kind @ (NodeKind::Document | NodeKind::ElementEnd) => Err(DomError::InvalidNodeKind {
                operation: "remove",
                kind,
            }),
            _ => {
                let extent = self.extent(position);
                self.splice(extent, Fragment::new(), 0);
                Ok(())
            }
        }
    }

    /// A deep copy of the target's subtree, detached from this store.
    ///
    /// The document node yields all top-level content. An attribute yields a
    /// text node holding its value, since it cannot stand outside an element.
    pub fn extract(&self, target: NodeId) -> Result<Fragment, DomError> {
        let position = self.locate(target)?;
        let node = &self.nodes[position];
        let range = match node.kind {
            NodeKind::Document => 1..node.pair,
            NodeKind::Attribute => return Ok(Fragment::text(node.value.clone())),
            NodeKind::ElementEnd => {
                return Err(DomError::InvalidNodeKind {
                    operation: "extract",
                    kind: NodeKind::ElementEnd,
                });
            }
            _ => self.extent(position),
        };
        let scope = match node.parent {
            Some(parent) if node.kind != NodeKind::Document => self.scope_at(parent),
            _ => self.inherited.clone(),
        };
        Ok(Fragment {
            nodes: self.nodes[range].to_vec(),
            scope,
        })
    }

    /// A new, independent document holding a copy of the target's subtree.
    pub fn clone_subtree(&self, target: NodeId) -> Result<Document, DomError> {
        let mut copy = Document::from_fragment(self.extract(target)?);
        copy.set_mode(self.mode());
        Ok(copy)
    }

    /// A copy of all top-level content.
    pub fn contents(&self) -> Fragment {
        Fragment {
            nodes: self.nodes[1..self.nodes.len() - 1].to_vec(),
            scope: self.inherited.clone(),
        }
    }

    /// All top-level content, without copying.
    pub fn into_contents(mut self) -> Fragment {
        let end = self.nodes.len() - 1;
        self.nodes.truncate(end);
        self.nodes.remove(0);
        Fragment {
            nodes: self.nodes,
            scope: self.inherited,
        }
    }

    fn sibling_anchor(&self, target: NodeId, operation: &'static str) -> Result<usize, DomError> {
        let position = self.locate(target)?;
        match self.nodes[position].kind {
            kind @ (NodeKind::Document | NodeKind::ElementEnd | NodeKind::Attribute) => {
                Err(DomError::InvalidNodeKind { operation, kind })
            }
            _ => Ok(position),
        }
    }

    /// Replaces `range` with `content`, which lands inside the container at
    /// `parent`.
    fn splice(&mut self, range: Range<usize>, content: Fragment, parent: usize) {
        let mut nodes = if content.is_empty() {
            Vec::new()
        } else {
            content.into_nodes_under(&self.namespaces_at(parent))
        };
        for node in &mut nodes {
            node.ident = self.allocate_ident();
        }
        log::trace!(
            "splicing {} node(s) over positions {:?}",
            nodes.len(),
            range
        );
        self.nodes.splice(range, nodes);
        self.reindex();
    }
}
