use crate::document::{Document, NodeId};
use crate::error::DomError;
use crate::namespace::{Namespaces, base_namespaces, prefix_for};
use crate::node::{Node, NodeKind, QName};
use crate::tokenizer::{ParseMode, is_raw_text_element, is_void_element};
use quick_xml::escape::escape;

impl Document {
    /// Serializes one node and its subtree.
    pub fn to_markup(&self, id: NodeId) -> Result<Vec<u8>, DomError> {
        let position = self.locate(id)?;
        let ns = match self.nodes[position].parent {
            Some(parent) => self.namespaces_at(parent),
            None => base_namespaces(),
        };
        let mut out = Vec::new();
        self.write_node(position, &ns, &mut out);
        Ok(out)
    }

    /// Serializes the whole document.
    pub fn to_bytes(&self) -> Vec<u8> {
        if !self.inherited.is_empty() {
            // A detached copy declares what it inherited on its top-level elements.
            let standalone = Document::from_nodes(
                std::iter::once(Node::leaf(NodeKind::Document, ""))
                    .chain(self.contents().into_nodes_under(&base_namespaces()))
                    .chain(std::iter::once(Node::end()))
                    .collect(),
                self.mode(),
            );
            return standalone.to_bytes();
        }
        let mut out = Vec::new();
        self.write_node(0, &base_namespaces(), &mut out);
        out
    }

    fn write_node(&self, position: usize, ns: &Namespaces, out: &mut Vec<u8>) {
        let node = &self.nodes[position];
        match node.kind {
            NodeKind::Document => {
                for &child in &node.children {
                    self.write_node(child, ns, out);
                }
            }
            NodeKind::Element => {
                let mut scope = ns.clone();
                self.declare(&mut scope, position);

                out.push(b'<');
                write_name(&node.name, &scope, false, out);
                for attr in self.attribute_positions(position) {
                    out.push(b' ');
                    self.write_node(attr, &scope, out);
                }
                if node.children.is_empty() && is_void_element(&node.name.local) {
                    out.extend_from_slice(b"/>");
                    return;
                }
                out.push(b'>');

                let raw_text =
                    self.mode() == ParseMode::Html && is_raw_text_element(&node.name.local);
                for &child in &node.children {
                    let child_node = &self.nodes[child];
                    if raw_text && child_node.kind == NodeKind::Text {
                        out.extend_from_slice(child_node.value.as_bytes());
                    } else {
                        self.write_node(child, &scope, out);
                    }
                }
                write_end(&node.name, &scope, out);
            }
            NodeKind::ElementEnd => {
                let start = node.pair;
                let mut scope = ns.clone();
                self.declare(&mut scope, start);
                write_end(&self.nodes[start].name, &scope, out);
            }
            NodeKind::Attribute => {
                write_name(&node.name, ns, true, out);
                out.extend_from_slice(b"=\"");
                escape_into(&node.value, out);
                out.push(b'"');
            }
            NodeKind::Text => escape_into(&node.value, out),
            NodeKind::Comment => {
                out.extend_from_slice(b"<!--");
                out.extend_from_slice(node.value.as_bytes());
                out.extend_from_slice(b"-->");
            }
            NodeKind::ProcessingInstruction => {
                out.extend_from_slice(b"<?");
                out.extend_from_slice(node.value.as_bytes());
                out.extend_from_slice(b"?>");
            }
            NodeKind::Doctype => {
                out.extend_from_slice(b"<!DOCTYPE");
                out.extend_from_slice(node.value.as_bytes());
                out.push(b'>');
            }
        }
    }
}

fn write_name(name: &QName, ns: &Namespaces, is_attribute: bool, out: &mut Vec<u8>) {
    if let Some(prefix) = prefix_for(ns, &name.space, is_attribute) {
        out.extend_from_slice(prefix.as_bytes());
        out.push(b':');
    }
    out.extend_from_slice(name.local.as_bytes());
}

fn write_end(name: &QName, ns: &Namespaces, out: &mut Vec<u8>) {
    out.extend_from_slice(b"</");
    write_name(name, ns, false, out);
    out.push(b'>');
}

fn escape_into(text: &str, out: &mut Vec<u8>) {
    out.extend_from_slice(escape(text).as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(input: &str, mode: ParseMode) -> String {
        let doc = Document::parse(input.as_bytes(), mode).unwrap();
        String::from_utf8(doc.to_bytes()).unwrap()
    }

    #[test]
    fn test_escaping() {
        assert_eq!(
            roundtrip("<p title=\"a &quot;b&quot;\">x &amp; 'y' &gt; z</p>", ParseMode::Xml),
            "<p title=\"a &quot;b&quot;\">x &amp; &apos;y&apos; &gt; z</p>"
        );
    }

    #[test]
    fn test_leaves_are_verbatim() {
        let input = "<?xml version=\"1.0\"?><!DOCTYPE html><!-- a < b --><r><?pi x?></r>";
        assert_eq!(roundtrip(input, ParseMode::Xml), input);
    }

    #[test]
    fn test_void_and_empty_elements() {
        assert_eq!(
            roundtrip("<div><br><img src=x><span/></div>", ParseMode::Html),
            "<div><br/><img src=\"x\"/><span></span></div>"
        );
    }

    #[test]
    fn test_raw_text_elements() {
        let input = "<script>if (a < b) {}</script>";
        assert_eq!(roundtrip(input, ParseMode::Html), input);
    }

    #[test]
    fn test_namespace_prefixes() {
        let input = "<a xmlns:p=\"urn:p\"><p:b p:x=\"1\"></p:b><c xml:lang=\"en\"></c></a>";
        assert_eq!(roundtrip(input, ParseMode::Xml), input);
        let lenient = "<fb:like fb:ref=\"x\"></fb:like>";
        assert_eq!(roundtrip(lenient, ParseMode::Html), lenient);
    }

    #[test]
    fn test_subtree_markup_uses_ancestor_declarations() {
        let doc = Document::parse(b"<a xmlns:p=\"urn:p\"><p:b>t</p:b></a>", ParseMode::Xml).unwrap();
        let a = doc.document_element().unwrap();
        let b = doc.children(a).unwrap()[0];
        assert_eq!(doc.to_markup(b).unwrap(), b"<p:b>t</p:b>");
        let t = doc.children(b).unwrap()[0];
        assert_eq!(doc.to_markup(t).unwrap(), b"t");
    }

    #[test]
    fn test_reserialization_is_idempotent() {
        let inputs = [
            "<ul>\n  <li class='a'>one &amp; two</li>\n  <li/>\n</ul>",
            "<!DOCTYPE html><html><body><p>x<br>y</p><script>a<b</script></body></html>",
        ];
        for input in inputs {
            let once = roundtrip(input, ParseMode::Html);
            assert_eq!(roundtrip(&once, ParseMode::Html), once);
        }
    }
}
