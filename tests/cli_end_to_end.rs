use std::io::Write;

use assert_cmd::Command;
use httpmock::MockServer;
use predicates::str::contains;
use tempfile::NamedTempFile;

const BLOG_JSON: &str = r#"{"id":"42","title":"Hello","category":["TECH","NEWS"],"description":"First post","content":"Body text","date":"2025-03-04T10:00:00Z","author":{"name":"Ada"}}"#;

fn monk(server: &MockServer) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("monk"));
    cmd.env_remove("MONK_CONFIG_FILE")
        .arg("--api-base-url")
        .arg(server.base_url());
    cmd
}

#[test]
fn list_renders_rows() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET").path("/blogs");
        then.status(200)
            .header("content-type", "application/json")
            .body(format!("[{BLOG_JSON}]"));
    });

    monk(&server)
        .arg("list")
        .assert()
        .success()
        .stdout(contains("[42] Hello | TECH | Mar 4 | 5 min read"))
        .stdout(contains("by Ada"));
    mock.assert();
}

#[test]
fn show_missing_blog_reports_not_found() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET").path("/blogs/missing-id");
        then.status(404).body("no such blog");
    });

    monk(&server)
        .args(["show", "missing-id"])
        .assert()
        .code(3)
        .stdout(contains("Story `missing-id` not found."));
    mock.assert();
}

#[test]
fn show_renders_detail() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/blogs/42");
        then.status(200)
            .header("content-type", "application/json")
            .body(BLOG_JSON);
    });

    monk(&server)
        .args(["show", "42"])
        .assert()
        .success()
        .stdout(contains("TECH, NEWS | March 4, 2025 | 5 min read"))
        .stdout(contains("Ada (Author)"));
}

#[test]
fn create_sends_uppercased_categories_and_reloads_list() {
    let server = MockServer::start();
    let create = server.mock(|when, then| {
        when.method("POST")
            .path("/blogs")
            .json_body_includes(r#"{"title":"Hello","category":["TECH","NEWS"],"content":"Body text"}"#);
        then.status(201)
            .header("content-type", "application/json")
            .body(BLOG_JSON);
    });
    let list = server.mock(|when, then| {
        when.method("GET").path("/blogs");
        then.status(200)
            .header("content-type", "application/json")
            .body(format!("[{BLOG_JSON}]"));
    });

    let mut content = NamedTempFile::new().expect("tmp file");
    content.write_all(b"Body text").expect("write content");

    monk(&server)
        .args([
            "create",
            "--title",
            "Hello",
            "--category",
            "tech, news",
            "--description",
            "First post",
            "--content-file",
        ])
        .arg(content.path())
        .assert()
        .success()
        .stdout(contains("Published `Hello` as 42"))
        .stdout(contains("[42] Hello"));
    create.assert();
    list.assert();
}

#[test]
fn create_without_content_fails_locally() {
    let server = MockServer::start();
    let create = server.mock(|when, then| {
        when.method("POST").path("/blogs");
        then.status(201).body(BLOG_JSON);
    });

    monk(&server)
        .args([
            "create",
            "--title",
            "Hello",
            "--category",
            "tech",
            "--description",
            "First post",
        ])
        .assert()
        .code(2)
        .stdout(contains("Error: `content` is required"));
    create.assert_calls(0);
}

#[test]
fn rejected_create_keeps_form_and_fails() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path("/blogs");
        then.status(422).body("title taken");
    });

    monk(&server)
        .args([
            "create",
            "--title",
            "Hello",
            "--category",
            "tech",
            "--description",
            "First post",
            "--content",
            "Body",
        ])
        .assert()
        .code(2)
        .stdout(contains("Title:       Hello"))
        .stdout(contains("Error: blog rejected by server: title taken"));
}

#[test]
fn unreachable_api_fails() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("monk"));
    cmd.env_remove("MONK_CONFIG_FILE")
        .args(["--api-base-url", "http://127.0.0.1:9/", "--api-timeout-seconds", "2", "list"])
        .assert()
        .code(1)
        .stdout(contains("Could not load stories"))
        .stderr(contains("application error"));
}
