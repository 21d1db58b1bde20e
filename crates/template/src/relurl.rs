//! Lexical path helpers and `link-relative` resolution.
//!
//! Paths in mapping programs always use `/`, whatever the host platform.

use crate::error::TemplateError;
use url::Url;

/// Everything but the last element of `path`, cleaned. `"."` when there is
/// no directory part.
pub fn dir(path: &str) -> String {
    match path.rfind('/') {
        Some(0) => "/".to_string(),
        Some(i) => clean(&path[..i]),
        None => ".".to_string(),
    }
}

/// Joins two paths and cleans the result. An empty `base` is ignored.
pub fn join(base: &str, path: &str) -> String {
    if base.is_empty() {
        clean(path)
    } else {
        clean(&format!("{}/{}", base, path))
    }
}

/// Collapses `.`, `..` and repeated separators without touching the filesystem.
pub fn clean(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if rooted => {}
                _ => parts.push(".."),
            },
            _ => parts.push(part),
        }
    }
    let joined = parts.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// The path that leads from directory `from` to `to`. Both must be cleaned and
/// either both rooted or both relative.
fn relative(from: &str, to: &str) -> Option<String> {
    if from.starts_with('/') != to.starts_with('/') {
        return None;
    }
    let split = |p: &str| -> Vec<String> {
        p.split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .map(str::to_string)
            .collect()
    };
    let from = split(from);
    let to = split(to);
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();
    if from[common..].iter().any(|p| p == "..") {
        return None;
    }

    let mut parts: Vec<&str> = vec![".."; from.len() - common];
    parts.extend(to[common..].iter().map(String::as_str));
    if parts.is_empty() {
        Some(".".to_string())
    } else {
        Some(parts.join("/"))
    }
}

/// Resolves `link`, written in a document located in `source_dir`, to the
/// form it takes relative to `cwd`.
///
/// Absolute URLs, network-path references and rooted paths are returned
/// unchanged. When `source_dir` is itself a URL the link is joined onto it.
pub fn link_relative(source_dir: &str, link: &str, cwd: &str) -> Result<String, TemplateError> {
    if Url::parse(link).is_ok() || link.starts_with('/') {
        return Ok(link.to_string());
    }
    if let Ok(base) = Url::parse(source_dir) {
        return base
            .join(link)
            .map(|url| url.to_string())
            .map_err(|e| TemplateError::InvalidLink {
                link: link.to_string(),
                message: e.to_string(),
            });
    }

    let split = link.find(['?', '#']).unwrap_or(link.len());
    let (path, suffix) = link.split_at(split);
    if path.is_empty() {
        return Ok(link.to_string());
    }
    if cwd.is_empty() {
        return Ok(join(source_dir, path) + suffix);
    }

    let base = if source_dir.starts_with('/') {
        clean(source_dir)
    } else {
        join(cwd, source_dir)
    };
    let target = join(&base, path);
    let rel = relative(&clean(cwd), &target).ok_or_else(|| TemplateError::InvalidLink {
        link: link.to_string(),
        message: format!("'{}' is not reachable from '{}'", target, cwd),
    })?;
    Ok(rel + suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_and_dir() {
        assert_eq!(clean("a/./b//c/../d"), "a/b/d");
        assert_eq!(clean("../a/.."), "..");
        assert_eq!(clean("/../a"), "/a");
        assert_eq!(clean(""), ".");
        assert_eq!(dir(""), ".");
        assert_eq!(dir("index.html"), ".");
        assert_eq!(dir("posts/2024/a.html"), "posts/2024");
        assert_eq!(dir("/a.html"), "/");
        assert_eq!(join(".", "a.html"), "a.html");
        assert_eq!(join("posts", "../b.html"), "b.html");
    }

    #[test]
    fn test_relative() {
        assert_eq!(relative("/site", "/site/img/a.png").as_deref(), Some("img/a.png"));
        assert_eq!(relative("/site/posts", "/site/img").as_deref(), Some("../img"));
        assert_eq!(relative("/site", "/site").as_deref(), Some("."));
        assert_eq!(relative("site", "/abs"), None);
    }

    #[test]
    fn test_link_relative_paths() {
        assert_eq!(link_relative(".", "img/a.png", "/site").unwrap(), "img/a.png");
        assert_eq!(link_relative("posts", "a.png", "/site").unwrap(), "posts/a.png");
        assert_eq!(link_relative("posts", "../img/a.png", "/site").unwrap(), "img/a.png");
        assert_eq!(link_relative("posts", "a.html#top", "/site").unwrap(), "posts/a.html#top");
        assert_eq!(link_relative("posts", "a.png", "").unwrap(), "posts/a.png");
        assert_eq!(link_relative(".", "a.png", "site").unwrap(), "a.png");
    }

    #[test]
    fn test_link_relative_leaves_absolute_links_alone() {
        assert_eq!(link_relative("posts", "https://example.org/x", "/site").unwrap(), "https://example.org/x");
        assert_eq!(link_relative("posts", "mailto:me@example.org", "/site").unwrap(), "mailto:me@example.org");
        assert_eq!(link_relative("posts", "/rooted.png", "/site").unwrap(), "/rooted.png");
        assert_eq!(link_relative("posts", "#frag", "/site").unwrap(), "#frag");
    }

    #[test]
    fn test_link_relative_against_url_base() {
        assert_eq!(
            link_relative("https://example.org/blog/", "a.html", "/site").unwrap(),
            "https://example.org/blog/a.html"
        );
    }
}
