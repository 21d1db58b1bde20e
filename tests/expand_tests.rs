mod common;

use common::{Site, TestResult};
use markweave::{MarkweaveError, ParseMode, TemplateError, expand_reader};

#[test]
fn test_sorted_list_from_source_document() -> TestResult {
    let site = Site::new()
        .with(
            "index.html",
            r#"<html><body><template-instance src="data/items.xml"><template><ul><li></li></ul></template><map from="item" to="li" multiple="true"><sort asc="."/></map></template-instance></body></html>"#,
        )
        .with("data/items.xml", "<items><item>b</item><item>a</item></items>");

    assert_eq!(
        site.expand("index.html", ParseMode::Xml)?,
        "<html><body><ul><li>a</li><li>b</li></ul></body></html>"
    );
    Ok(())
}

#[test]
fn test_fetched_posts_with_relative_links() -> TestResult {
    let site = Site::new()
        .with(
            "index.html",
            concat!(
                "<main>\n",
                r#"<template id="posts"><ul><li><a href=""></a></li></ul></template>"#,
                "\n",
                r#"<template-instance src="data/index.xml" using="posts">"#,
                r#"<map from="ref" fetch="resource">"#,
                r#"<sort asc="date"/>"#,
                r#"<map from="title/text()" to="li/a"/>"#,
                r#"<map from="img/text()" format="link-relative" to="li/a/@href"/>"#,
                r#"</map>"#,
                r#"</template-instance>"#,
                "\n</main>\n",
            ),
        )
        .with("data/index.xml", "<index><ref>posts/b.xml</ref><ref>posts/a.xml</ref></index>")
        .with("data/posts/a.xml", "<post><title>Ant</title><date>1</date><img>a.png</img></post>")
        .with("data/posts/b.xml", "<post><title>Bee</title><date>2</date><img>b.png</img></post>");

    assert_eq!(
        site.expand("index.html", ParseMode::Xml)?,
        concat!(
            "<main>\n",
            r#"<template id="posts"><ul><li><a href=""></a></li></ul></template>"#,
            "\n",
            r#"<ul><li><a href="data/posts/a.png">Ant</a></li><li><a href="data/posts/b.png">Bee</a></li></ul>"#,
            "\n</main>\n",
        )
    );
    Ok(())
}

#[test]
fn test_missing_fetched_document_fails_without_output() {
    let site = Site::new()
        .with(
            "index.html",
            r#"<template-instance src="list.xml"><template><ul></ul></template><map from="ref" fetch="resource"/></template-instance>"#,
        )
        .with("list.xml", "<r><ref>gone.xml</ref></r>");

    match site.expand("index.html", ParseMode::Xml) {
        Err(MarkweaveError::Template(TemplateError::MissingResource { path, .. })) => {
            assert_eq!(path, "gone.xml");
        }
        other => panic!("expected a missing resource, got {:?}", other),
    }
}

#[test]
fn test_host_without_instances_is_unchanged() -> TestResult {
    let host = "<!DOCTYPE html>\n<!-- header -->\n<html lang=\"en\"><body><p>a &amp; b<br><img src='x.png'></p></body></html>\n";
    let site = Site::new().with("plain.html", host);
    assert_eq!(site.expand("plain.html", ParseMode::Xml)?, host);
    Ok(())
}

#[test]
fn test_lenient_sources_need_html_mode() -> TestResult {
    let site = Site::new()
        .with(
            "index.html",
            r#"<header><template-instance src="page.html" if="//title"><template><h1></h1></template><map from="head/title/text()" to="."/></template-instance></header>"#,
        )
        .with(
            "page.html",
            r#"<html><head><meta charset="utf-8"><title>Hello</title></head><body><p>one<br>two</body></html>"#,
        );

    assert_eq!(
        site.expand("index.html", ParseMode::Html)?,
        "<header><h1>Hello</h1></header>"
    );
    assert!(matches!(
        site.expand("index.html", ParseMode::Xml),
        Err(MarkweaveError::Template(TemplateError::InvalidSource { .. }))
    ));
    Ok(())
}

#[test]
fn test_datetime_with_custom_pattern() -> TestResult {
    let site = Site::new()
        .with(
            "index.html",
            r#"<template-instance src="post.xml"><template><p><time></time></p></template><map from="date" format="datetime" strftime="%d %B %Y" to="time"/></template-instance>"#,
        )
        .with("post.xml", "<post><date>2001-07-08T00:34:59+00:00</date></post>");

    assert_eq!(
        site.expand("index.html", ParseMode::Xml)?,
        "<p><time>08 July 2001</time></p>"
    );
    Ok(())
}

#[test]
fn test_expand_from_reader() -> TestResult {
    let site = Site::new().with("tags.xml", "<r><tags>red green</tags></r>");
    let host = r#"<template-instance src="tags.xml"><template><ul><li></li></ul></template><map from="tags" format="split" to="li" multiple="true"/></template-instance>"#;

    let out = expand_reader(host.as_bytes(), site.root(), ParseMode::Xml)?;
    assert_eq!(String::from_utf8(out)?, "<ul><li>red</li><li>green</li></ul>");
    Ok(())
}
