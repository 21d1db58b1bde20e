//! A forward-only markup token stream over `quick-xml`.
//!
//! Every token keeps the byte span it was read from, so callers that only
//! rewrite a few regions of a document can copy everything else verbatim.

use crate::breadcrumb::Breadcrumb;
use crate::error::ParseError;
use quick_xml::Reader;
use quick_xml::escape::{resolve_html5_entity, unescape};
use quick_xml::events::{BytesStart, Event};
use std::collections::VecDeque;
use std::ops::Range;

/// HTML elements that never have content or an end tag.
pub const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// HTML elements whose content is raw text, not markup.
const RAW_TEXT_ELEMENTS: [&str; 2] = ["script", "style"];

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

pub fn is_raw_text_element(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Well-formed XML; structural mistakes are errors.
    #[default]
    Xml,
    /// Lenient HTML: void elements, stray end tags, unclosed elements,
    /// valueless attributes and HTML named entities are accepted.
    Html,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Start,
    End,
    /// A self-closing tag, or an HTML void element.
    Empty,
    /// Character data, with entity references resolved and CDATA sections merged in.
    Text,
    Comment,
    /// Processing instructions, including the XML declaration.
    ProcessingInstruction,
    Doctype,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// The qualified tag name as written, for tags.
    pub name: String,
    /// Qualified attribute names and unescaped values, in source order.
    pub attributes: Vec<(String, String)>,
    /// Unescaped text, or the verbatim inside of a comment, PI or doctype.
    pub text: String,
    /// Byte range of the token in the input.
    pub span: Range<usize>,
    /// For end tags: how many open elements the tag closed.
    pub closes: usize,
}

impl Token {
    fn new(kind: TokenKind, span: Range<usize>) -> Self {
        Token {
            kind,
            name: String::new(),
            attributes: Vec::new(),
            text: String::new(),
            span,
            closes: 0,
        }
    }

    fn text(text: String, span: Range<usize>) -> Self {
        Token {
            text,
            ..Token::new(TokenKind::Text, span)
        }
    }

    pub fn is_start(&self) -> bool {
        matches!(self.kind, TokenKind::Start | TokenKind::Empty)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

pub struct Tokenizer<'a> {
    input: &'a [u8],
    reader: Reader<&'a [u8]>,
    /// Offset of `reader`'s first byte in `input`.
    base: usize,
    mode: ParseMode,
    breadcrumb: Breadcrumb,
    pending: VecDeque<Token>,
    /// End of the last token handed out.
    consumed: usize,
    finished: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a [u8], mode: ParseMode) -> Self {
        Tokenizer {
            input,
            reader: Self::reader_at(input, mode),
            base: 0,
            mode,
            breadcrumb: Breadcrumb::default(),
            pending: VecDeque::new(),
            consumed: 0,
            finished: false,
        }
    }

    fn reader_at(input: &'a [u8], mode: ParseMode) -> Reader<&'a [u8]> {
        let mut reader = Reader::from_reader(input);
        let config = reader.config_mut();
        config.trim_text(false);
        // End tags are matched by the breadcrumb so both modes report them alike.
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
        config.allow_dangling_amp = mode == ParseMode::Html;
        reader
    }

    pub fn mode(&self) -> ParseMode {
        self.mode
    }

    pub fn input(&self) -> &'a [u8] {
        self.input
    }

    /// Number of currently open elements.
    pub fn depth(&self) -> usize {
        self.breadcrumb.depth()
    }

    pub fn breadcrumb(&self) -> &[String] {
        self.breadcrumb.names()
    }

    pub fn slice(&self, span: Range<usize>) -> &'a [u8] {
        &self.input[span]
    }

    /// Byte offset just past the last token returned.
    pub fn position(&self) -> usize {
        self.consumed
    }

    pub fn next_token(&mut self) -> Result<Option<Token>, ParseError> {
        let token = match self.pending.pop_front() {
            Some(token) => Some(token),
            None if self.finished => None,
            None => self.read_token()?,
        };
        match token {
            Some(mut token) => {
                self.track(&mut token)?;
                self.consumed = token.span.end;
                Ok(Some(token))
            }
            None => {
                self.finished = true;
                if let Some(open) = self.breadcrumb.current() {
                    if self.mode == ParseMode::Xml {
                        return Err(ParseError::Unclosed {
                            name: open.to_string(),
                        });
                    }
                    log::debug!("closing {} element(s) left open at end of input", self.depth());
                }
                Ok(None)
            }
        }
    }

    /// Consumes everything up to the end tag matching `start` and returns the
    /// verbatim bytes in between. Returns an empty slice for anything but a
    /// start tag with content.
    pub fn raw_content(&mut self, start: &Token) -> Result<&'a [u8], ParseError> {
        if start.kind != TokenKind::Start {
            return Ok(&[]);
        }
        let depth = self.depth();
        loop {
            match self.next_token()? {
                Some(token) => {
                    if self.depth() < depth {
                        return Ok(&self.input[start.span.end..token.span.start]);
                    }
                }
                None => return Ok(&self.input[start.span.end..]),
            }
        }
    }

    fn track(&mut self, token: &mut Token) -> Result<(), ParseError> {
        match token.kind {
            TokenKind::Start => {
                self.breadcrumb.open(&token.name);
                if self.mode == ParseMode::Html && is_raw_text_element(&token.name) {
                    self.queue_raw_text(&token.name, token.span.end);
                }
            }
            TokenKind::End => {
                token.closes = self.breadcrumb.close(&token.name, self.mode)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// `<script>` and `<style>` hold raw text up to their end tag.
    fn queue_raw_text(&mut self, name: &str, from: usize) {
        let closing = format!("</{}", name.to_ascii_lowercase());
        let end = self.input[from..]
            .windows(closing.len())
            .position(|w| w.eq_ignore_ascii_case(closing.as_bytes()))
            .map_or(self.input.len(), |i| from + i);
        if end > from {
            let text = String::from_utf8_lossy(&self.input[from..end]).into_owned();
            self.pending.push_back(Token::text(text, from..end));
        }
        self.reader = Self::reader_at(&self.input[end..], self.mode);
        self.base = end;
    }

    fn offset(&self) -> usize {
        self.base + self.reader.buffer_position() as usize
    }

    fn read_token(&mut self) -> Result<Option<Token>, ParseError> {
        let mut text: Option<(usize, String)> = None;
        let mut text_end = 0;

        loop {
            let start = self.offset();
            let event = self.reader.read_event().map_err(|e| ParseError::Syntax {
                position: self.base + self.reader.error_position() as usize,
                message: e.to_string(),
            })?;
            let end = self.offset();

            let markup = match event {
                Event::Text(_) | Event::GeneralRef(_) => {
                    let piece = self.unescape(start..end)?;
                    text.get_or_insert_with(|| (start, String::new()))
                        .1
                        .push_str(&piece);
                    text_end = end;
                    continue;
                }
                Event::CData(_) => {
                    let piece = self.str_at(start + 9..end - 3)?;
                    text.get_or_insert_with(|| (start, String::new()))
                        .1
                        .push_str(piece);
                    text_end = end;
                    continue;
                }
                Event::Start(e) => {
                    let mut token = self.tag(TokenKind::Start, &e, start..end)?;
                    if self.mode == ParseMode::Html && is_void_element(&token.name) {
                        token.kind = TokenKind::Empty;
                    }
                    Some(token)
                }
                Event::Empty(e) => Some(self.tag(TokenKind::Empty, &e, start..end)?),
                Event::End(e) => {
                    let mut token = Token::new(TokenKind::End, start..end);
                    token.name = self.utf8(e.name().as_ref(), start)?.to_string();
                    Some(token)
                }
                Event::Comment(_) => Some(self.leaf(TokenKind::Comment, start..end, 4, 3)?),
                Event::Decl(_) | Event::PI(_) => {
                    Some(self.leaf(TokenKind::ProcessingInstruction, start..end, 2, 2)?)
                }
                Event::DocType(_) => Some(self.leaf(TokenKind::Doctype, start..end, 9, 1)?),
                Event::Eof => None,
            };

            return match text {
                Some((text_start, value)) => {
                    if let Some(token) = markup {
                        self.pending.push_back(token);
                    } else {
                        self.finished = true;
                    }
                    Ok(Some(Token::text(value, text_start..text_end)))
                }
                None => {
                    if markup.is_none() {
                        self.finished = true;
                    }
                    Ok(markup)
                }
            };
        }
    }

    fn tag(
        &self,
        kind: TokenKind,
        e: &BytesStart<'_>,
        span: Range<usize>,
    ) -> Result<Token, ParseError> {
        let position = span.start;
        let mut token = Token::new(kind, span);
        token.name = self.utf8(e.name().as_ref(), position)?.to_string();

        let mut attributes = match self.mode {
            ParseMode::Xml => e.attributes(),
            ParseMode::Html => e.html_attributes(),
        };
        attributes.with_checks(self.mode == ParseMode::Xml);
        for attr in attributes {
            let attr = attr.map_err(|err| ParseError::Syntax {
                position,
                message: err.to_string(),
            })?;
            let key = self.utf8(attr.key.as_ref(), position)?.to_string();
            let raw = self.utf8(&attr.value, position)?;
            let value = self.unescape_str(raw, position)?;
            token.attributes.push((key, value));
        }
        Ok(token)
    }

    /// A comment, PI or doctype: the verbatim bytes between its delimiters.
    fn leaf(
        &self,
        kind: TokenKind,
        span: Range<usize>,
        open: usize,
        close: usize,
    ) -> Result<Token, ParseError> {
        let inner = (span.start + open)..(span.end - close).max(span.start + open);
        let mut token = Token::new(kind, span);
        token.text = self.str_at(inner)?.to_string();
        Ok(token)
    }

    fn str_at(&self, span: Range<usize>) -> Result<&'a str, ParseError> {
        let position = span.start;
        self.utf8(&self.input[span], position)
    }

    fn utf8<'b>(&self, bytes: &'b [u8], position: usize) -> Result<&'b str, ParseError> {
        std::str::from_utf8(bytes).map_err(|e| ParseError::Utf8 {
            position: position + e.valid_up_to(),
        })
    }

    fn unescape(&self, span: Range<usize>) -> Result<String, ParseError> {
        let position = span.start;
        let raw = self.str_at(span)?;
        self.unescape_str(raw, position)
    }

    fn unescape_str(&self, raw: &str, position: usize) -> Result<String, ParseError> {
        match self.mode {
            ParseMode::Xml => unescape(raw)
                .map(|s| s.into_owned())
                .map_err(|e| ParseError::Syntax {
                    position,
                    message: e.to_string(),
                }),
            ParseMode::Html => Ok(unescape_lenient(raw)),
        }
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Result<Token, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}

/// Resolves numeric and HTML5 named references; anything unknown stays literal.
fn unescape_lenient(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let resolved = after
            .find(';')
            .filter(|&semi| semi > 0 && after[..semi].chars().all(|c| c.is_ascii_alphanumeric() || c == '#'))
            .and_then(|semi| resolve_entity(&after[..semi]).map(|value| (semi, value)));
        match resolved {
            Some((semi, value)) => {
                out.push_str(&value);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn resolve_entity(entity: &str) -> Option<String> {
    if let Some(number) = entity.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }
    resolve_html5_entity(entity).map(str::to_string)
}
