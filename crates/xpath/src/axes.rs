//! Axis traversal. Every function returns nodes in axis order: document order
//! for forward axes, nearest-first for reverse ones.

use crate::ast::Axis;
use crate::node::{NodeType, XPathNode};

pub fn collect<'a, N: XPathNode<'a>>(axis: Axis, node: N) -> Vec<N> {
    match axis {
        Axis::Child => node.children().collect(),
        Axis::Attribute => node.attributes().collect(),
        Axis::SelfAxis => vec![node],
        Axis::Parent => node.parent().into_iter().collect(),
        Axis::Descendant => descendants(node),
        Axis::DescendantOrSelf => {
            let mut out = vec![node];
            out.extend(descendants(node));
            out
        }
        Axis::Ancestor => ancestors(node),
        Axis::AncestorOrSelf => {
            let mut out = vec![node];
            out.extend(ancestors(node));
            out
        }
        Axis::FollowingSibling => following_siblings(node),
        Axis::PrecedingSibling => preceding_siblings(node),
        Axis::Following => following(node),
        Axis::Preceding => preceding(node),
    }
}

fn descendants<'a, N: XPathNode<'a>>(node: N) -> Vec<N> {
    let mut out = Vec::new();
    let mut stack: Vec<N> = node.children().collect();
    stack.reverse();
    while let Some(next) = stack.pop() {
        out.push(next);
        let mut children: Vec<N> = next.children().collect();
        children.reverse();
        stack.extend(children);
    }
    out
}

fn ancestors<'a, N: XPathNode<'a>>(node: N) -> Vec<N> {
    let mut out = Vec::new();
    let mut current = node.parent();
    while let Some(parent) = current {
        out.push(parent);
        current = parent.parent();
    }
    out
}

fn siblings<'a, N: XPathNode<'a>>(node: N) -> Option<(Vec<N>, usize)> {
    // Attributes have a parent but are not among its children.
    if node.node_type() == NodeType::Attribute {
        return None;
    }
    let parent = node.parent()?;
    let all: Vec<N> = parent.children().collect();
    let index = all.iter().position(|n| *n == node)?;
    Some((all, index))
}

fn following_siblings<'a, N: XPathNode<'a>>(node: N) -> Vec<N> {
    match siblings(node) {
        Some((all, index)) => all[index + 1..].to_vec(),
        None => vec![],
    }
}

fn preceding_siblings<'a, N: XPathNode<'a>>(node: N) -> Vec<N> {
    match siblings(node) {
        Some((all, index)) => all[..index].iter().rev().copied().collect(),
        None => vec![],
    }
}

fn following<'a, N: XPathNode<'a>>(node: N) -> Vec<N> {
    let mut out = Vec::new();
    let mut current = Some(node);
    while let Some(anchor) = current {
        for sibling in following_siblings(anchor) {
            out.push(sibling);
            out.extend(descendants(sibling));
        }
        current = anchor.parent();
    }
    out
}

fn preceding<'a, N: XPathNode<'a>>(node: N) -> Vec<N> {
    let mut out = Vec::new();
    let mut current = Some(node);
    while let Some(anchor) = current {
        for sibling in preceding_siblings(anchor) {
            let mut subtree = vec![sibling];
            subtree.extend(descendants(sibling));
            out.extend(subtree.into_iter().rev());
        }
        current = anchor.parent();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::mock::{MockNode, create_test_tree};

    fn ids(nodes: Vec<MockNode>) -> Vec<usize> {
        nodes.into_iter().map(|n| n.id).collect()
    }

    #[test]
    fn test_descendants_in_document_order() {
        let tree = create_test_tree();
        let root = MockNode { id: 0, tree: &tree };
        assert_eq!(ids(collect(Axis::Descendant, root)), vec![1, 3, 5, 6, 7, 9, 10]);
    }

    #[test]
    fn test_reverse_axes_are_nearest_first() {
        let tree = create_test_tree();
        let text = MockNode { id: 9, tree: &tree };
        assert_eq!(ids(collect(Axis::Ancestor, text)), vec![7, 1, 0]);
        assert_eq!(ids(collect(Axis::Preceding, text)), vec![6, 5, 3]);

        let second = MockNode { id: 7, tree: &tree };
        assert_eq!(ids(collect(Axis::PrecedingSibling, second)), vec![6, 3]);
    }

    #[test]
    fn test_following_axes() {
        let tree = create_test_tree();
        let first = MockNode { id: 3, tree: &tree };
        assert_eq!(ids(collect(Axis::FollowingSibling, first)), vec![6, 7, 10]);
        let text = MockNode { id: 5, tree: &tree };
        assert_eq!(ids(collect(Axis::Following, text)), vec![6, 7, 9, 10]);
    }

    #[test]
    fn test_attributes_have_no_siblings() {
        let tree = create_test_tree();
        let attr = MockNode { id: 4, tree: &tree };
        assert!(collect(Axis::FollowingSibling, attr).is_empty());
        assert!(collect(Axis::PrecedingSibling, attr).is_empty());
        assert_eq!(ids(collect(Axis::Parent, attr)), vec![3]);
    }
}
