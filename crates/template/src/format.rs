//! `format=` conversions, shared by `<map>` and `<sort>`.

use crate::error::TemplateError;
use crate::relurl;
use chrono::DateTime;
use chrono::format::{Item as FormatItem, StrftimeItems};
use markweave_dom::{DomError, Fragment, NodeRef};
use markweave_xpath::XPathNode;

/// One selected value: a node of the current source, or text made up along the way.
#[derive(Debug, Clone, PartialEq)]
pub enum Item<'s> {
    Node(NodeRef<'s>),
    Text(String),
}

impl Item<'_> {
    pub fn text(&self) -> String {
        match self {
            Item::Node(node) => node.string_value(),
            Item::Text(text) => text.clone(),
        }
    }

    /// A detached copy for grafting into another store.
    pub fn to_fragment(&self) -> Result<Fragment, DomError> {
        match self {
            Item::Node(node) => node.document().extract(node.id()),
            Item::Text(text) => Ok(Fragment::text(text.clone())),
        }
    }
}

pub fn concat_text(items: &[Item<'_>]) -> String {
    items.iter().map(Item::text).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Format {
    Text,
    Split,
    LinkRelative,
    /// Reformats an RFC 3339 timestamp; `pattern` is the `strftime=` attribute.
    Datetime { pattern: Option<String> },
    Debug,
    /// Not a known conversion. Applying it aborts the mapping.
    Unknown(String),
}

impl Format {
    pub fn decode(name: &str, strftime: Option<&str>) -> Format {
        match name {
            "text" => Format::Text,
            "split" => Format::Split,
            "link-relative" => Format::LinkRelative,
            "datetime" => Format::Datetime {
                pattern: strftime.map(str::to_string),
            },
            "debug" => Format::Debug,
            other => Format::Unknown(other.to_string()),
        }
    }
}

/// Where a conversion runs: the current source path and the base directory.
#[derive(Debug, Clone, Copy)]
pub struct FormatScope<'a> {
    pub source_path: &'a str,
    pub base_dir: &'a str,
    pub datetime_pattern: &'a str,
}

impl Format {
    /// Converts the whole selection. `None` means the mapping is aborted.
    pub fn apply<'s>(
        &self,
        items: Vec<Item<'s>>,
        scope: &FormatScope<'_>,
    ) -> Result<Option<Vec<Item<'s>>>, TemplateError> {
        let converted = match self {
            Format::Text => vec![Item::Text(concat_text(&items))],
            Format::Split => concat_text(&items)
                .split(' ')
                .map(|token| Item::Text(token.to_string()))
                .collect(),
            Format::Debug => vec![Item::Text(format!("DEBUG[{}]", concat_text(&items)))],
            Format::LinkRelative => {
                let link = concat_text(&items);
                let resolved =
                    relurl::link_relative(&relurl::dir(scope.source_path), &link, scope.base_dir)?;
                log::trace!("link-relative: {:?} -> {:?}", link, resolved);
                vec![Item::Text(resolved)]
            }
            Format::Datetime { pattern } => {
                let pattern = pattern.as_deref().unwrap_or(scope.datetime_pattern);
                match format_datetime(&concat_text(&items), pattern) {
                    Some(text) => vec![Item::Text(text)],
                    None => items,
                }
            }
            Format::Unknown(name) => {
                log::warn!("unknown format {:?}, aborting mapping", name);
                return Ok(None);
            }
        };
        Ok(Some(converted))
    }
}

fn format_datetime(input: &str, pattern: &str) -> Option<String> {
    if input.is_empty() {
        return None;
    }
    let timestamp = match DateTime::parse_from_rfc3339(input.trim()) {
        Ok(timestamp) => timestamp,
        Err(e) => {
            log::warn!("cannot read {:?} as a date-time: {}", input, e);
            return None;
        }
    };
    if StrftimeItems::new(pattern).any(|item| matches!(item, FormatItem::Error)) {
        log::warn!("invalid strftime pattern {:?}", pattern);
        return None;
    }
    Some(
        timestamp
            .format_with_items(StrftimeItems::new(pattern))
            .to_string(),
    )
}
