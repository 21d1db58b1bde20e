mod common;

use common::{TestResult, init_logger};
use markweave::dom::{Document, DomError, Fragment, ParseMode};
use markweave::template::{Program, TemplateContext, run_template};
use markweave::xpath::Query;
use markweave::resource::InMemoryResourceProvider;
use std::sync::Arc;

fn serialized(doc: &Document) -> String {
    String::from_utf8(doc.to_bytes()).unwrap()
}

#[test]
fn test_handles_survive_unrelated_edits() -> TestResult {
    init_logger();
    let mut doc = Document::parse(b"<r><a>1</a><b>2</b><c>3</c></r>", ParseMode::Xml)?;
    let root = doc.document_element().unwrap();
    let found = Query::compile("b")?.select(doc.node_ref(root)?)?;
    let b = found[0].id();
    let [a, _, c] = doc.children(root)?[..] else {
        panic!("expected three children");
    };

    doc.insert_before(a, Fragment::text("x"))?;
    doc.replace_children(c, Fragment::text("three"))?;
    doc.remove(a)?;

    assert_eq!(doc.string_value(b)?, "2");
    assert_eq!(doc.string_value(c)?, "three");
    assert_eq!(doc.kind(a), Err(DomError::StaleHandle));
    assert_eq!(serialized(&doc), "<r>x<b>2</b><c>three</c></r>");

    let copy = doc.clone_subtree(root)?;
    assert_eq!(copy.kind(b), Err(DomError::StaleHandle));
    assert_eq!(serialized(&copy), serialized(&doc));
    Ok(())
}

#[test]
fn test_children_agree_with_parents_after_edits() -> TestResult {
    init_logger();
    let mut doc = Document::parse(b"<r><a><b/>t</a><c x=\"1\"/></r>", ParseMode::Xml)?;
    let root = doc.document_element().unwrap();
    let a = doc.children(root)?[0];
    let c = doc.children(root)?[1];
    doc.insert_after(a, Document::parse(b"<d><e/></d>", ParseMode::Xml)?.into_contents())?;
    doc.replace_children(c, Fragment::text("y"))?;
    doc.remove(doc.children(a)?[0])?;

    let everything = Query::compile("//node()")?.select(doc.node_ref(doc.root())?)?;
    for element in everything.iter().filter(|n| doc.kind(n.id()) == Ok(markweave::dom::NodeKind::Element)) {
        let children = doc.children(element.id())?;
        let by_parent: Vec<_> = everything
            .iter()
            .map(|n| n.id())
            .filter(|id| doc.parent(*id) == Ok(Some(element.id())))
            .collect();
        assert_eq!(children, by_parent);
        let start = doc.position(element.id())?;
        let end = doc.pair_position(element.id())?.unwrap();
        assert!(start < end);
    }
    assert_eq!(serialized(&doc), "<r><a>t</a><d><e></e></d><c x=\"1\">y</c></r>");
    Ok(())
}

#[test]
fn test_serialization_is_stable() -> TestResult {
    init_logger();
    let inputs: [(&[u8], ParseMode); 3] = [
        (
            br#"<?xml version="1.0"?><!-- c --><r xmlns:p="urn:p"><p:x a="1 &amp; 2">t &lt; u</p:x><e/></r>"#,
            ParseMode::Xml,
        ),
        (
            b"<!DOCTYPE html><html><body><p>one<br>two<p>three</body></html>",
            ParseMode::Html,
        ),
        (b"<a/><b>text</b>tail", ParseMode::Xml),
    ];
    for (input, mode) in inputs {
        let once = Document::parse(input, mode)?.to_bytes();
        let twice = Document::parse(&once, mode)?.to_bytes();
        assert_eq!(
            String::from_utf8(twice)?,
            String::from_utf8(once)?,
            "input: {}",
            String::from_utf8_lossy(input)
        );
    }
    Ok(())
}

#[test]
fn test_only_if_empty_is_idempotent() -> TestResult {
    init_logger();
    let context = TemplateContext::new(Arc::new(InMemoryResourceProvider::new()));
    let source = Document::parse(b"<r><name>Ada</name></r>", ParseMode::Xml)?;
    let program = Program::parse(br#"<map from="name/text()" to="h1" only-if="empty"/>"#)?;
    let mut template = Document::parse(b"<div><h1/></div>", ParseMode::Xml)?;

    run_template(&program, &source, &mut template, &context)?;
    let once = serialized(&template);
    run_template(&program, &source, &mut template, &context)?;

    assert_eq!(once, "<div><h1>Ada</h1></div>");
    assert_eq!(serialized(&template), once);
    Ok(())
}

#[test]
fn test_program_runs_against_caller_documents() -> TestResult {
    init_logger();
    let context = TemplateContext::new(Arc::new(InMemoryResourceProvider::new()));
    let source = Document::parse(
        br#"<people><person age="40">Bo</person><person age="31">Al</person><person age="52">Cy</person></people>"#,
        ParseMode::Xml,
    )?;
    let program = Program::parse(
        br#"<map from="person" to="tr" multiple="true">
              <sort desc="@age"/>
              <map from="text()" to="td[1]"/>
              <map from="@age" to="td[2]"/>
            </map>"#,
    )?;
    let mut template = Document::parse(b"<table><tr><td/><td/></tr></table>", ParseMode::Xml)?;

    run_template(&program, &source, &mut template, &context)?;
    assert_eq!(
        serialized(&template),
        concat!(
            "<table>",
            "<tr><td>Cy</td><td>52</td></tr>",
            "<tr><td>Bo</td><td>40</td></tr>",
            "<tr><td>Al</td><td>31</td></tr>",
            "</table>"
        )
    );
    Ok(())
}
