//! Runs a mapping program against a source tree, rewriting a template tree.
//!
//! Each nesting level executes with its own frame: the current source node,
//! the current template node and the sort keys emitted so far. `multiple` and
//! `fetch` maps run their body once per item against a copy of the template
//! node, then sort and graft the copies.

use crate::context::TemplateContext;
use crate::error::TemplateError;
use crate::format::{FormatScope, Item, concat_text};
use crate::program::{DataSource, Dispatch, Instruction, MapInstruction, Program, SortInstruction};
use crate::relurl;
use crate::sort::{SortKeys, sort_by_keys};
use markweave_dom::{Document, Fragment, NodeId, NodeKind, NodeRef};
use markweave_xpath::{Query, XPathNode, XPathValue};

/// The node queries start from: the document element when there is exactly
/// one, the document node otherwise.
pub fn context_node(doc: &Document) -> NodeId {
    doc.document_element().unwrap_or_else(|| doc.root())
}

/// Runs `program` with the host document itself as the source. Source paths
/// are relative to the host, whose own path is empty.
pub fn run_template(
    program: &Program,
    source: &Document,
    template: &mut Document,
    context: &TemplateContext,
) -> Result<(), TemplateError> {
    Interpreter::new(context).run(program, source, "", template)?;
    Ok(())
}

struct Frame<'s, 'p> {
    source: NodeRef<'s>,
    source_path: &'p str,
}

pub struct Interpreter<'c> {
    context: &'c TemplateContext,
}

impl<'c> Interpreter<'c> {
    pub fn new(context: &'c TemplateContext) -> Self {
        Interpreter { context }
    }

    /// Runs `program` over the whole of `template` and returns the sort keys
    /// emitted at the top level.
    pub fn run(
        &self,
        program: &Program,
        source: &Document,
        source_path: &str,
        template: &mut Document,
    ) -> Result<SortKeys, TemplateError> {
        let frame = Frame {
            source: source.node_ref(context_node(source))?,
            source_path,
        };
        let tmpl = context_node(template);
        let mut keys = SortKeys::new();
        log::debug!("templating from source {:?}", source_path);
        self.execute(program.instructions(), &frame, template, tmpl, &mut keys, 0)?;
        Ok(keys)
    }

    fn execute(
        &self,
        instructions: &[Instruction],
        frame: &Frame<'_, '_>,
        template: &mut Document,
        tmpl: NodeId,
        keys: &mut SortKeys,
        depth: usize,
    ) -> Result<(), TemplateError> {
        for instruction in instructions {
            match instruction {
                Instruction::Sort(sort) => self.sort(sort, frame, keys)?,
                Instruction::Map(map) => {
                    if !template.contains(tmpl) {
                        log::debug!("[{}] template context was replaced, skipping map", depth);
                        continue;
                    }
                    self.map(map, frame, template, tmpl, depth)?;
                    if !map.repeats() {
                        self.execute(&map.body, frame, template, tmpl, keys, depth)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn scope<'f>(&'f self, frame: &'f Frame<'_, '_>) -> FormatScope<'f> {
        FormatScope {
            source_path: frame.source_path,
            base_dir: self.context.base_dir(),
            datetime_pattern: self.context.datetime_pattern(),
        }
    }

    fn sort(
        &self,
        sort: &SortInstruction,
        frame: &Frame<'_, '_>,
        keys: &mut SortKeys,
    ) -> Result<(), TemplateError> {
        let mut items = select(&sort.select, frame.source)?;
        if let Some(format) = &sort.format {
            match format.apply(items, &self.scope(frame))? {
                Some(converted) => items = converted,
                None => return Ok(()),
            }
        }
        let key = concat_text(&items);
        log::trace!("sort key {:?} ({:?})", key, sort.order);
        keys.push(sort.order, key);
        Ok(())
    }

    fn map(
        &self,
        map: &MapInstruction,
        frame: &Frame<'_, '_>,
        template: &mut Document,
        tmpl: NodeId,
        depth: usize,
    ) -> Result<(), TemplateError> {
        if let (true, Some(to)) = (map.only_if_empty, &map.to) {
            let filled = to
                .select(template.node_ref(tmpl)?)?
                .iter()
                .any(|target| target.children().next().is_some());
            if filled {
                log::debug!("[{}] only-if=empty: '{}' already has content, skipping", depth, to);
                return Ok(());
            }
        }

        let items = match (&map.from, map.data) {
            (Some(from), _) => select(from, frame.source)?,
            (None, Some(DataSource::RelativeUrl)) => vec![Item::Text(frame.source_path.to_string())],
            (None, Some(DataSource::RelativeDir)) => {
                vec![Item::Text(format!("{}/", relurl::dir(frame.source_path)))]
            }
            (None, None) => {
                log::debug!("[{}] nothing to select, mapping aborted", depth);
                return Ok(());
            }
        };
        let items = match &map.format {
            Some(format) => match format.apply(items, &self.scope(frame))? {
                Some(converted) => converted,
                None => return Ok(()),
            },
            None => items,
        };
        log::debug!("[{}] map selected {} item(s)", depth, items.len());

        match (map.dispatch, &map.to) {
            (Dispatch::Fetch, _) => self.fetch(map, &items, frame, template, tmpl, depth),
            (_, Some(to)) if !items.is_empty() => {
                let targets: Vec<NodeId> = to
                    .select(template.node_ref(tmpl)?)?
                    .iter()
                    .map(NodeRef::id)
                    .collect();
                log::debug!("[{}] '{}' matched {} template node(s)", depth, to, targets.len());
                for target in targets {
                    // An earlier target may have replaced this one.
                    if !template.contains(target) {
                        log::debug!("[{}] target removed by an earlier graft, skipping", depth);
                        continue;
                    }
                    if map.dispatch == Dispatch::Multiple {
                        self.repeat(map, &items, frame, template, target, depth)?;
                    } else {
                        graft(template, target, &items)?;
                    }
                }
                Ok(())
            }
            _ => {
                log::debug!("[{}] mapping aborted", depth);
                Ok(())
            }
        }
    }

    /// `multiple="true"`: one copy of `target` per item, sorted, in place of `target`.
    fn repeat(
        &self,
        map: &MapInstruction,
        items: &[Item<'_>],
        frame: &Frame<'_, '_>,
        template: &mut Document,
        target: NodeId,
        depth: usize,
    ) -> Result<(), TemplateError> {
        let fill = !map.body_maps();
        let mut copies = Vec::with_capacity(items.len());
        for item in items {
            let (mut copy, copy_context) = detached_copy(template, target)?;
            if fill {
                fill_copy(&mut copy, copy_context, item)?;
            }
            let mut keys = SortKeys::new();
            match item {
                Item::Node(node) => {
                    let sub = Frame {
                        source: *node,
                        source_path: frame.source_path,
                    };
                    self.execute(&map.body, &sub, &mut copy, copy_context, &mut keys, depth + 1)?;
                }
                Item::Text(text) => {
                    let source = Document::from_text(text.as_str());
                    let sub = Frame {
                        source: source.node_ref(source.root())?,
                        source_path: frame.source_path,
                    };
                    self.execute(&map.body, &sub, &mut copy, copy_context, &mut keys, depth + 1)?;
                }
            }
            copies.push((copy, keys));
        }

        sort_by_keys(&mut copies)?;
        for (copy, _) in copies {
            template.insert_before(target, copy.into_contents())?;
        }
        template.remove(target)?;
        Ok(())
    }

    /// `fetch="resource"`: each item names a document; the content of `tmpl`
    /// is templated once per document and the results replace it.
    fn fetch(
        &self,
        map: &MapInstruction,
        items: &[Item<'_>],
        frame: &Frame<'_, '_>,
        template: &mut Document,
        tmpl: NodeId,
        depth: usize,
    ) -> Result<(), TemplateError> {
        let mut results = Vec::with_capacity(items.len());
        for item in items {
            let link = item.text();
            let path = if link.starts_with('/') {
                relurl::clean(&link)
            } else {
                relurl::join(&relurl::dir(frame.source_path), &link)
            };
            log::debug!("[{}] fetch {:?} -> {:?}", depth, link, path);

            let source = self.context.load_source(&path)?;
            let (mut copy, copy_context) = detached_copy(template, tmpl)?;
            let sub = Frame {
                source: source.node_ref(context_node(&source))?,
                source_path: &path,
            };
            let mut keys = SortKeys::new();
            self.execute(&map.body, &sub, &mut copy, copy_context, &mut keys, depth + 1)?;
            results.push((content_of(copy, copy_context)?, keys));
        }

        sort_by_keys(&mut results)?;
        let content: Fragment = results.into_iter().map(|(content, _)| content).collect();
        template.replace_children(tmpl, content)?;
        Ok(())
    }
}

/// Evaluates against the source. A result that is not a node-set becomes a
/// single text item.
fn select<'s>(query: &Query, context: NodeRef<'s>) -> Result<Vec<Item<'s>>, TemplateError> {
    Ok(match query.evaluate(context)? {
        XPathValue::NodeSet(nodes) => nodes.into_iter().map(Item::Node).collect(),
        other => vec![Item::Text(other.to_string())],
    })
}

/// Containers take copies of the items as children; other nodes take their text.
fn graft(template: &mut Document, target: NodeId, items: &[Item<'_>]) -> Result<(), TemplateError> {
    if template.kind(target)?.is_container() {
        let content = items
            .iter()
            .map(Item::to_fragment)
            .collect::<Result<Fragment, _>>()?;
        template.replace_children(target, content)?;
    } else {
        template.set_text(target, &concat_text(items))?;
    }
    Ok(())
}

/// Without mapping instructions of its own, a repetition fills each copy with
/// the content of its item.
fn fill_copy(copy: &mut Document, context: NodeId, item: &Item<'_>) -> Result<(), TemplateError> {
    if !copy.kind(context)?.is_container() {
        copy.set_text(context, &item.text())?;
        return Ok(());
    }
    let content = match item {
        Item::Node(node) if node.kind().is_container() => {
            let source = node.document();
            source
                .children(node.id())?
                .into_iter()
                .map(|child| source.extract(child))
                .collect::<Result<Fragment, _>>()?
        }
        other => other.to_fragment()?,
    };
    copy.replace_children(context, content)?;
    Ok(())
}

/// A copy of `target` in a store of its own, and the copy's handle.
fn detached_copy(template: &Document, target: NodeId) -> Result<(Document, NodeId), TemplateError> {
    let copy = template.clone_subtree(target)?;
    let context = if template.kind(target)? == NodeKind::Document {
        copy.root()
    } else {
        copy.children(copy.root())?
            .first()
            .copied()
            .unwrap_or_else(|| copy.root())
    };
    Ok((copy, context))
}

/// The children of `context`, detached. When the body replaced `context`
/// itself, everything the copy holds.
fn content_of(copy: Document, context: NodeId) -> Result<Fragment, TemplateError> {
    if context == copy.root() || !copy.contains(context) {
        return Ok(copy.into_contents());
    }
    Ok(copy
        .children(context)?
        .into_iter()
        .map(|child| copy.extract(child))
        .collect::<Result<Fragment, _>>()?)
}
