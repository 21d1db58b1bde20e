//! Host documents: `<template id=..>` definitions and `<template-instance>`
//! expansion.
//!
//! The host is streamed token by token and copied through verbatim; only
//! instance elements are replaced. Output is collected in memory so a fatal
//! error never leaves a half-written document behind.

use crate::context::TemplateContext;
use crate::error::TemplateError;
use crate::interpreter::{Interpreter, context_node};
use crate::program::Program;
use markweave_dom::{ParseMode, Token, TokenKind, Tokenizer};
use markweave_xpath::Query;
use std::collections::HashMap;

/// Template bodies registered so far in one host document, by id.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, Vec<u8>>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a body; a later definition with the same id replaces the earlier one.
    pub fn register(&mut self, id: impl Into<String>, body: impl Into<Vec<u8>>) {
        let id = id.into();
        if self.templates.insert(id.clone(), body.into()).is_some() {
            log::debug!("template '{}' redefined", id);
        }
    }

    pub fn get(&self, id: &str) -> Option<&[u8]> {
        self.templates.get(id).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Expands every `<template-instance>` in `host`.
pub fn expand_document(host: &[u8], context: &TemplateContext) -> Result<Vec<u8>, TemplateError> {
    let mut registry = TemplateRegistry::new();
    let mut tokenizer = Tokenizer::new(host, ParseMode::Html);
    let mut out = Vec::with_capacity(host.len());

    while let Some(token) = tokenizer.next_token()? {
        if !token.is_start() {
            out.extend_from_slice(tokenizer.slice(token.span.clone()));
            continue;
        }
        match token.name.as_str() {
            "template" => {
                let body = tokenizer.raw_content(&token)?;
                if let Some(id) = token.attribute("id") {
                    log::debug!("registered template '{}'", id);
                    registry.register(id, body);
                }
            }
            "template-instance" => {
                let mapping = tokenizer.raw_content(&token)?;
                let raw = tokenizer.slice(token.span.start..tokenizer.position());
                let expanded = expand_instance(&token, mapping, host, &registry, context)?;
                out.extend_from_slice(expanded.as_deref().unwrap_or(raw));
                continue;
            }
            _ => {}
        }
        out.extend_from_slice(tokenizer.slice(token.span.start..tokenizer.position()));
    }
    Ok(out)
}

/// The serialized result of one instance, or `None` when its `if` condition
/// does not hold and the instance must be left as written.
fn expand_instance(
    instance: &Token,
    mapping: &[u8],
    host: &[u8],
    registry: &TemplateRegistry,
    context: &TemplateContext,
) -> Result<Option<Vec<u8>>, TemplateError> {
    let using = instance.attribute("using").filter(|id| !id.is_empty());
    let src = instance.attribute("src").unwrap_or_default();

    let template_body = match using.and_then(|id| registry.get(id)) {
        Some(body) => body,
        None => nested_template(mapping)?.ok_or_else(|| TemplateError::MissingTemplate {
            using: using.map(str::to_string),
        })?,
    };

    let source = if src.is_empty() {
        context.parse(host)?
    } else {
        context.load_source(src)?
    };

    if let Some(condition) = instance.attribute("if").filter(|c| !c.is_empty()) {
        let query = Query::compile(condition)?;
        if !query.exists(source.node_ref(context_node(&source))?)? {
            log::debug!("if=\"{}\" does not hold, leaving instance as is", condition);
            return Ok(None);
        }
    }

    let program = Program::parse(mapping)?;
    let mut template = context.parse(template_body)?;
    Interpreter::new(context).run(&program, &source, src, &mut template)?;
    Ok(Some(template.to_bytes()))
}

/// The body of the first `<template>` inside an instance.
fn nested_template(mapping: &[u8]) -> Result<Option<&[u8]>, TemplateError> {
    let mut tokenizer = Tokenizer::new(mapping, ParseMode::Html);
    while let Some(token) = tokenizer.next_token()? {
        if token.kind == TokenKind::Start && token.name == "template" {
            return Ok(Some(tokenizer.raw_content(&token)?));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use markweave_resource::InMemoryResourceProvider;
    use std::sync::Arc;

    fn expand(host: &str, provider: InMemoryResourceProvider) -> Result<String, TemplateError> {
        let _ = env_logger::builder().is_test(true).try_init();
        let context = TemplateContext::new(Arc::new(provider)).with_mode(ParseMode::Html);
        expand_document(host.as_bytes(), &context).map(|out| String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_registry() {
        let mut registry = TemplateRegistry::new();
        assert!(registry.is_empty());
        registry.register("a", "<p/>");
        registry.register("a", "<q/>");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("a"), Some(&b"<q/>"[..]));
        assert_eq!(registry.get("b"), None);
    }

    #[test]
    fn test_passthrough_is_verbatim() {
        let host = "<!DOCTYPE html>\n<html><body class='x'><p>a &amp; b<br></p></body></html>\n";
        assert_eq!(expand(host, InMemoryResourceProvider::new()).unwrap(), host);
    }

    #[test]
    fn test_instance_with_nested_template_and_src() {
        let provider = InMemoryResourceProvider::new()
            .with("data.xml", "<items><item>b</item><item>a</item></items>");
        let host = r#"<body><template-instance src="data.xml"><template><ul><li></li></ul></template><map from="item" to="li" multiple="true"><sort asc="."/></map></template-instance></body>"#;
        assert_eq!(
            expand(host, provider).unwrap(),
            "<body><ul><li>a</li><li>b</li></ul></body>"
        );
    }

    #[test]
    fn test_registered_template_and_host_source() {
        let host = concat!(
            r#"<html><head><title>Page</title></head><body>"#,
            r#"<template id="heading"><h1></h1></template>"#,
            r#"<template-instance using="heading"><map from="head/title/text()" to="."/></template-instance>"#,
            r#"</body></html>"#,
        );
        assert_eq!(
            expand(host, InMemoryResourceProvider::new()).unwrap(),
            concat!(
                r#"<html><head><title>Page</title></head><body>"#,
                r#"<template id="heading"><h1></h1></template>"#,
                r#"<h1>Page</h1>"#,
                r#"</body></html>"#,
            )
        );
    }

    #[test]
    fn test_false_condition_leaves_instance() {
        let host = r#"<div><template-instance if="//missing"><template><p></p></template></template-instance></div>"#;
        assert_eq!(expand(host, InMemoryResourceProvider::new()).unwrap(), host);
    }

    #[test]
    fn test_missing_template_is_fatal() {
        let host = r#"<div><template-instance using="nope"><map from="." to="."/></template-instance></div>"#;
        assert_eq!(
            expand(host, InMemoryResourceProvider::new()).unwrap_err(),
            TemplateError::MissingTemplate {
                using: Some("nope".to_string())
            }
        );
    }

    #[test]
    fn test_missing_source_is_fatal() {
        let host = r#"<template-instance src="gone.xml"><template><p></p></template></template-instance>"#;
        assert!(matches!(
            expand(host, InMemoryResourceProvider::new()),
            Err(TemplateError::MissingResource { .. })
        ));
    }
}
