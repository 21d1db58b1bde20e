//! Mapping programs, decoded from markup into instructions.
//!
//! ```xml
//! <map from="item" to="li" multiple="true">
//!   <sort asc="@date"/>
//!   <map from="title" to="a"/>
//! </map>
//! ```
//!
//! Attribute values are decoded once, here; an unrecognised value becomes an
//! explicit variant (or is dropped with a log line) instead of being matched
//! again on every execution.

use crate::error::TemplateError;
use crate::format::Format;
use crate::sort::SortOrder;
use markweave_dom::{Document, NodeId, NodeKind, ParseMode};
use markweave_xpath::Query;

#[derive(Debug, Clone)]
pub enum Instruction {
    Sort(SortInstruction),
    Map(MapInstruction),
}

/// `<sort asc=.. | desc=.. format=..>`
#[derive(Debug, Clone)]
pub struct SortInstruction {
    pub order: SortOrder,
    pub select: Query,
    pub format: Option<Format>,
}

/// Where a `<map>` takes its values from when it has no `from`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// The current source path.
    RelativeUrl,
    /// The directory of the current source path, with a trailing `/`.
    RelativeDir,
}

/// What a `<map>` does with its selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Graft the selection into each `to` match.
    Graft,
    /// `multiple="true"`: one copy of each `to` match per selected node.
    Multiple,
    /// `fetch="resource"`: one copy of the template per fetched document.
    Fetch,
}

/// `<map from=.. to=.. data=.. format=.. multiple=.. fetch=.. only-if=..>`
#[derive(Debug, Clone)]
pub struct MapInstruction {
    pub from: Option<Query>,
    pub to: Option<Query>,
    pub data: Option<DataSource>,
    pub format: Option<Format>,
    pub dispatch: Dispatch,
    /// `only-if="empty"`: skip when a `to` match already has content.
    pub only_if_empty: bool,
    pub body: Vec<Instruction>,
}

impl MapInstruction {
    /// True when the body runs once per repetition item rather than inline.
    pub fn repeats(&self) -> bool {
        self.dispatch != Dispatch::Graft
    }

    pub(crate) fn body_maps(&self) -> bool {
        self.body.iter().any(|i| matches!(i, Instruction::Map(_)))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    /// Parses and decodes a mapping program. Programs are always read leniently.
    pub fn parse(markup: &[u8]) -> Result<Program, TemplateError> {
        let doc = Document::parse(markup, ParseMode::Html)?;
        Program::decode(&doc)
    }

    /// Decodes the instructions found in `doc`. `<map>` and `<sort>` nested in
    /// literal elements belong to the enclosing level; `<template>` bodies are
    /// not part of the program.
    pub fn decode(doc: &Document) -> Result<Program, TemplateError> {
        Ok(Program {
            instructions: decode_level(doc, doc.root())?,
        })
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

fn decode_level(doc: &Document, parent: NodeId) -> Result<Vec<Instruction>, TemplateError> {
    let mut instructions = Vec::new();
    for child in doc.children(parent)? {
        if doc.kind(child)? != NodeKind::Element {
            continue;
        }
        let name = doc.name(child)?.map(|n| n.local.as_str()).unwrap_or_default();
        match name {
            "sort" => instructions.extend(decode_sort(doc, child)?.map(Instruction::Sort)),
            "map" => instructions.push(Instruction::Map(decode_map(doc, child)?)),
            "template" => {}
            _ => instructions.extend(decode_level(doc, child)?),
        }
    }
    Ok(instructions)
}

/// A non-empty attribute value.
fn attr<'d>(doc: &'d Document, id: NodeId, name: &str) -> Result<Option<&'d str>, TemplateError> {
    Ok(doc.attribute(id, name)?.filter(|v| !v.is_empty()))
}

fn compile(doc: &Document, id: NodeId, name: &str) -> Result<Option<Query>, TemplateError> {
    attr(doc, id, name)?
        .map(|expr| Query::compile(expr).map_err(TemplateError::from))
        .transpose()
}

fn decode_format(doc: &Document, id: NodeId) -> Result<Option<Format>, TemplateError> {
    let strftime = attr(doc, id, "strftime")?;
    Ok(attr(doc, id, "format")?.map(|name| Format::decode(name, strftime)))
}

fn decode_sort(doc: &Document, id: NodeId) -> Result<Option<SortInstruction>, TemplateError> {
    let (order, expr) = match (attr(doc, id, "asc")?, attr(doc, id, "desc")?) {
        (Some(expr), None) => (SortOrder::Ascending, expr),
        (None, Some(expr)) => (SortOrder::Descending, expr),
        _ => {
            log::debug!("<sort> needs exactly one of asc or desc, ignoring it");
            return Ok(None);
        }
    };
    Ok(Some(SortInstruction {
        order,
        select: Query::compile(expr)?,
        format: decode_format(doc, id)?,
    }))
}

fn decode_map(doc: &Document, id: NodeId) -> Result<MapInstruction, TemplateError> {
    let data = match attr(doc, id, "data")? {
        Some("relative-url") => Some(DataSource::RelativeUrl),
        Some("relative-dir") => Some(DataSource::RelativeDir),
        Some(other) => {
            log::debug!("ignoring unknown data={:?}", other);
            None
        }
        None => None,
    };
    let dispatch = if attr(doc, id, "fetch")? == Some("resource") {
        Dispatch::Fetch
    } else if attr(doc, id, "multiple")? == Some("true") {
        Dispatch::Multiple
    } else {
        Dispatch::Graft
    };

    Ok(MapInstruction {
        to: compile(doc, id, "to")?,
        from: compile(doc, id, "from")?,
        data,
        format: decode_format(doc, id)?,
        dispatch,
        only_if_empty: attr(doc, id, "only-if")? == Some("empty"),
        body: decode_level(doc, id)?,
    })
}
