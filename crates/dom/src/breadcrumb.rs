//! Tracks the chain of open element names while tokenizing.

use crate::error::ParseError;
use crate::tokenizer::ParseMode;

#[derive(Debug, Default, Clone)]
pub struct Breadcrumb {
    names: Vec<String>,
}

impl Breadcrumb {
    pub fn open(&mut self, name: &str) {
        self.names.push(name.to_string());
    }

    pub fn depth(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The innermost open element.
    pub fn current(&self) -> Option<&str> {
        self.names.last().map(String::as_str)
    }

    /// Closes `name` and returns how many open elements the end tag closed.
    ///
    /// Strict mode only accepts the innermost open element. Lenient mode closes
    /// the nearest matching element together with everything opened inside
    /// it, and ignores an end tag that matches nothing (returning 0).
    pub fn close(&mut self, name: &str, mode: ParseMode) -> Result<usize, ParseError> {
        match mode {
            ParseMode::Xml => {
                if self.current() == Some(name) {
                    self.names.pop();
                    Ok(1)
                } else {
                    Err(ParseError::MismatchedEnd {
                        path: self.path(),
                        name: name.to_string(),
                    })
                }
            }
            ParseMode::Html => {
                let found = self
                    .names
                    .iter()
                    .rposition(|open| open.eq_ignore_ascii_case(name));
                match found {
                    Some(index) => {
                        let closed = self.names.len() - index;
                        self.names.truncate(index);
                        Ok(closed)
                    }
                    None => {
                        log::debug!("{}: ignoring stray close tag </{}>", self.path(), name);
                        Ok(0)
                    }
                }
            }
        }
    }

    fn path(&self) -> String {
        self.names.join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_close() {
        let mut crumbs = Breadcrumb::default();
        crumbs.open("html");
        crumbs.open("body");
        assert_eq!(crumbs.depth(), 2);
        assert_eq!(crumbs.close("body", ParseMode::Xml), Ok(1));

        let err = crumbs.close("div", ParseMode::Xml).unwrap_err();
        assert_eq!(err.to_string(), "html: non matching close tag </div>");
        assert_eq!(crumbs.depth(), 1);
    }

    #[test]
    fn test_lenient_close_pops_to_match() {
        let mut crumbs = Breadcrumb::default();
        for name in ["ul", "li", "b"] {
            crumbs.open(name);
        }
        assert_eq!(crumbs.close("UL", ParseMode::Html), Ok(3));
        assert_eq!(crumbs.depth(), 0);
    }

    #[test]
    fn test_lenient_ignores_stray_close() {
        let mut crumbs = Breadcrumb::default();
        crumbs.open("p");
        assert_eq!(crumbs.close("span", ParseMode::Html), Ok(0));
        assert_eq!(crumbs.names(), ["p".to_string()]);
    }
}
