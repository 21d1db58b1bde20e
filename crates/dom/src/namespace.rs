//! Prefix bookkeeping. Names are stored resolved to their namespace URI;
//! prefixes are looked up again from in-scope declarations when serializing.

use crate::document::{Document, NodeId};
use crate::error::DomError;
use crate::node::{Fragment, Node, NodeKind, QName};
use std::collections::BTreeMap;

pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Prefix to URI. The empty prefix is the default namespace.
pub type Namespaces = BTreeMap<String, String>;

pub(crate) fn base_namespaces() -> Namespaces {
    let mut ns = Namespaces::new();
    ns.insert(String::new(), String::new());
    ns.insert("xml".to_string(), XML_NAMESPACE.to_string());
    ns
}

/// The declaration an attribute makes, if it is `xmlns` or `xmlns:p`.
fn declaration(name: &QName) -> Option<&str> {
    if name.space.is_empty() && name.local == "xmlns" {
        Some("")
    } else if name.space == "xmlns" {
        Some(&name.local)
    } else {
        None
    }
}

/// Declarations written with raw attribute names, as the tokenizer reports them.
pub(crate) fn declare_raw<'a>(
    scope: &mut Namespaces,
    attributes: impl IntoIterator<Item = (&'a str, &'a str)>,
) {
    for (key, value) in attributes {
        if key == "xmlns" {
            scope.insert(String::new(), value.to_string());
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            scope.insert(prefix.to_string(), value.to_string());
        }
    }
}

/// Resolves a raw `prefix:local` name. Unprefixed attributes are in no
/// namespace; unprefixed elements take the default one. Undeclared prefixes
/// are kept as the namespace.
pub(crate) fn resolve(scope: &Namespaces, raw: &str, is_attribute: bool) -> QName {
    match raw.split_once(':') {
        Some(("xmlns", local)) if is_attribute => QName {
            space: "xmlns".to_string(),
            local: local.to_string(),
        },
        Some((prefix, local)) => QName {
            space: scope
                .get(prefix)
                .cloned()
                .unwrap_or_else(|| prefix.to_string()),
            local: local.to_string(),
        },
        None if is_attribute => QName::local(raw),
        None => QName {
            space: scope.get("").cloned().unwrap_or_default(),
            local: raw.to_string(),
        },
    }
}

/// The prefix to write for `space`, or `None` for an unprefixed name.
///
/// A declared prefix wins, the default namespace first for elements.
/// Attributes never use the default namespace. An undeclared namespace that
/// is itself a valid prefix is written as one.
pub(crate) fn prefix_for<'a>(ns: &'a Namespaces, space: &'a str, is_attribute: bool) -> Option<&'a str> {
    if space.is_empty() {
        return None;
    }
    let declared = ns
        .iter()
        .find(|(prefix, uri)| *uri == space && !(is_attribute && prefix.is_empty()))
        .map(|(prefix, _)| prefix.as_str());
    match declared {
        Some("") => None,
        Some(prefix) => Some(prefix),
        None if is_nc_name(space) => Some(space),
        None => None,
    }
}

fn is_nc_name(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

impl Document {
    /// Every prefix in scope at `id`, including the element's own declarations.
    pub fn ancestor_namespaces(&self, id: NodeId) -> Result<Namespaces, DomError> {
        Ok(self.namespaces_at(self.locate(id)?))
    }

    pub(crate) fn namespaces_at(&self, position: usize) -> Namespaces {
        let mut chain = Vec::new();
        let mut current = Some(position);
        while let Some(p) = current {
            if self.nodes[p].kind == NodeKind::Element {
                chain.push(p);
            }
            current = self.nodes[p].parent;
        }

        let mut ns = base_namespaces();
        ns.extend(self.inherited.iter().map(|(p, u)| (p.clone(), u.clone())));
        for &element in chain.iter().rev() {
            self.declare(&mut ns, element);
        }
        ns
    }

    /// The bindings in scope at `position` that differ from the defaults.
    pub(crate) fn scope_at(&self, position: usize) -> Namespaces {
        let base = base_namespaces();
        self.namespaces_at(position)
            .into_iter()
            .filter(|(prefix, uri)| base.get(prefix) != Some(uri))
            .collect()
    }

    /// Adds the declarations made by the element at `position` to `ns`.
    pub(crate) fn declare(&self, ns: &mut Namespaces, position: usize) {
        for attr in &self.nodes[self.attribute_positions(position)] {
            if let Some(prefix) = declaration(&attr.name) {
                ns.insert(prefix.to_string(), attr.value.clone());
            }
        }
    }
}

fn declaration_name(prefix: &str) -> QName {
    if prefix.is_empty() {
        QName::local("xmlns")
    } else {
        QName {
            space: "xmlns".to_string(),
            local: prefix.to_string(),
        }
    }
}

impl Fragment {
    /// The nodes, ready to be placed where `target` is in scope.
    ///
    /// Each top-level element gets a declaration for every binding it uses
    /// from the extraction scope that `target` lacks or binds differently,
    /// and `xmlns=""` when it holds elements in no namespace but `target` has
    /// a default one.
    pub(crate) fn into_nodes_under(self, target: &Namespaces) -> Vec<Node> {
        let Fragment { nodes, scope } = self;
        let mut out = Vec::with_capacity(nodes.len());
        let mut depth = 0usize;
        for (i, node) in nodes.iter().enumerate() {
            out.push(node.clone());
            match node.kind {
                NodeKind::Element if depth == 0 => {
                    out.extend(declarations_needed(&nodes, i, &scope, target));
                    depth += 1;
                }
                NodeKind::Element => depth += 1,
                NodeKind::ElementEnd => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
        out
    }
}

/// Declarations the element at `start` of `nodes` must carry to keep its
/// names when placed under `target`.
fn declarations_needed(nodes: &[Node], start: usize, scope: &Namespaces, target: &Namespaces) -> Vec<Node> {
    let own: Vec<&str> = nodes[start + 1..]
        .iter()
        .take_while(|n| n.kind == NodeKind::Attribute)
        .filter_map(|n| declaration(&n.name))
        .collect();
    let mut depth = 0usize;
    let mut end = start;
    for (i, node) in nodes.iter().enumerate().skip(start) {
        match node.kind {
            NodeKind::Element => depth += 1,
            NodeKind::ElementEnd => {
                depth -= 1;
                if depth == 0 {
                    end = i;
                    break;
                }
            }
            _ => {}
        }
    }
    let subtree = &nodes[start..=end];

    let mut needed = Vec::new();
    for (prefix, uri) in scope {
        if own.contains(&prefix.as_str()) || target.get(prefix) == Some(uri) {
            continue;
        }
        let used = subtree.iter().any(|n| {
            n.name.space == *uri
                && (n.kind == NodeKind::Element || (n.kind == NodeKind::Attribute && !prefix.is_empty()))
        });
        if used {
            needed.push(Node::attribute(declaration_name(prefix), uri.clone()));
        }
    }
    let unqualified = subtree
        .iter()
        .any(|n| n.kind == NodeKind::Element && n.name.space.is_empty());
    let target_default = target.get("").is_some_and(|d| !d.is_empty());
    if unqualified && target_default && !own.contains(&"") && !scope.contains_key("") {
        needed.push(Node::attribute(declaration_name(""), ""));
    }
    needed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::ParseMode;

    #[test]
    fn test_resolution_at_parse_time() {
        let doc = Document::parse(
            b"<svg xmlns=\"urn:svg\" xmlns:x=\"urn:x\"><x:rect x:w=\"1\" h=\"2\"/><fb:like/></svg>",
            ParseMode::Html,
        )
        .unwrap();
        let svg = doc.document_element().unwrap();
        assert_eq!(doc.name(svg).unwrap().unwrap().space, "urn:svg");

        let children = doc.children(svg).unwrap();
        let rect = doc.name(children[0]).unwrap().unwrap();
        assert_eq!((rect.space.as_str(), rect.local.as_str()), ("urn:x", "rect"));
        let attrs = doc.attributes(children[0]).unwrap();
        assert_eq!(doc.name(attrs[0]).unwrap().unwrap().space, "urn:x");
        assert_eq!(doc.name(attrs[1]).unwrap().unwrap().space, "");

        let like = doc.name(children[1]).unwrap().unwrap();
        assert_eq!(like.space, "fb");
    }

    #[test]
    fn test_ancestor_namespaces() {
        let doc = Document::parse(
            b"<a xmlns:p=\"urn:p\"><b xmlns=\"urn:d\"><c/></b></a>",
            ParseMode::Xml,
        )
        .unwrap();
        let a = doc.document_element().unwrap();
        let b = doc.children(a).unwrap()[0];
        let c = doc.children(b).unwrap()[0];

        let ns = doc.ancestor_namespaces(c).unwrap();
        assert_eq!(ns.get("p").map(String::as_str), Some("urn:p"));
        assert_eq!(ns.get("").map(String::as_str), Some("urn:d"));
        assert_eq!(ns.get("xml").map(String::as_str), Some(XML_NAMESPACE));

        let ns = doc.ancestor_namespaces(a).unwrap();
        assert_eq!(ns.get("").map(String::as_str), Some(""));
    }

    #[test]
    fn test_prefix_choice() {
        let mut ns = base_namespaces();
        ns.insert("p".into(), "urn:p".into());
        ns.insert("".into(), "urn:p".into());
        assert_eq!(prefix_for(&ns, "urn:p", false), None);
        assert_eq!(prefix_for(&ns, "urn:p", true), Some("p"));
        assert_eq!(prefix_for(&ns, "xmlns", true), Some("xmlns"));
        assert_eq!(prefix_for(&ns, "urn:unknown", false), None);
        assert_eq!(prefix_for(&ns, XML_NAMESPACE, true), Some("xml"));
    }
}
