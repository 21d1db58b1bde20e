mod common;

use common::{Site, TestResult};
use std::io::Write;
use std::process::{Command, Stdio};

fn markweave() -> Command {
    Command::new(env!("CARGO_BIN_EXE_markweave"))
}

#[test]
fn test_expands_file_after_changing_directory() -> TestResult {
    let site = Site::new()
        .with(
            "site/index.html",
            r#"<p><template-instance src="data.xml"><template><b></b></template><map from="name/text()" to="."/></template-instance></p>"#,
        )
        .with("site/data.xml", "<r><name>Ada</name></r>");

    let output = markweave()
        .arg("-C")
        .arg(site.root())
        .arg("site/index.html")
        .output()?;

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8(output.stdout)?, "<p><b>Ada</b></p>");
    Ok(())
}

#[test]
fn test_reads_standard_input() -> TestResult {
    let site = Site::new().with("page.html", "<html><head><title>Hi</title><meta charset=\"utf-8\"></head></html>");

    let mut child = markweave()
        .current_dir(site.root())
        .args(["--html", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()?;
    child
        .stdin
        .take()
        .ok_or("no stdin")?
        .write_all(br#"<template-instance src="page.html"><template><h1></h1></template><map from="head/title/text()" to="."/></template-instance>"#)?;
    let output = child.wait_with_output()?;

    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout)?, "<h1>Hi</h1>");
    Ok(())
}

#[test]
fn test_failure_prints_nothing_to_stdout() -> TestResult {
    let site = Site::new().with(
        "index.html",
        r#"<div>before</div><template-instance using="nowhere"><map from="." to="."/></template-instance>"#,
    );

    let output = markweave().arg(site.path("index.html")).output()?;

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8(output.stderr)?.contains("nowhere"));
    Ok(())
}
