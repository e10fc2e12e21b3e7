//! End-to-end runs of the `httpreq` binary against the mock server.

use std::process::Command;

use assert_cmd::prelude::*;
use mock_server::{blob_bytes, Log, RecordedRequest};
use predicates::prelude::*;

fn start_server() -> (String, Log) {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    let log = Log::default();
    let server_log = log.clone();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run_with_log(listener, server_log).await
        })
        .unwrap();
    });

    (format!("http://{addr}"), log)
}

fn recorded(log: &Log) -> Vec<RecordedRequest> {
    log.blocking_read().clone()
}

fn httpreq() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_httpreq"));
    cmd.env_remove("RUST_LOG").env_remove("HTTPREQ_TIMEOUT");
    cmd
}

#[test]
fn get_prints_status_and_body() {
    let (base, log) = start_server();

    httpreq()
        .args(["get", &format!("{base}/hello"), "--header", "Accept=application/json,X-Trace:abc"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("200 ("))
        .stdout(predicate::str::contains(r#""path":"/hello""#));

    let sent = recorded(&log);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].header("accept"), Some("application/json"));
    assert_eq!(sent[0].header("x-trace"), Some("abc"));
}

#[test]
fn port_shorthand_targets_localhost() {
    let (base, log) = start_server();
    let port = base.rsplit(':').next().unwrap();

    httpreq().args(["delete", &format!(":{port}/items/3")]).assert().success();

    let sent = recorded(&log);
    assert_eq!(sent[0].method, "DELETE");
    assert_eq!(sent[0].path, "/items/3");
}

#[test]
fn post_sends_json_body() {
    let (base, log) = start_server();

    httpreq()
        .args([
            "post",
            &format!("{base}/items"),
            "--json",
            r#"{"name": "widget"}"#,
            "--header",
            "Content-Type=text/plain",
        ])
        .assert()
        .success();

    let sent = recorded(&log);
    assert_eq!(sent[0].header("content-type"), Some("application/json"));
    let body: serde_json::Value = serde_json::from_str(&sent[0].body).unwrap();
    assert_eq!(body, serde_json::json!({"name": "widget"}));
}

#[test]
fn invalid_json_fails_without_sending() {
    let (base, log) = start_server();

    httpreq()
        .args(["post", &format!("{base}/items"), "--json", "{oops"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--json must be valid JSON"));

    assert!(recorded(&log).is_empty());
}

#[test]
fn sigv4_without_region_fails() {
    let (base, log) = start_server();

    httpreq()
        .args(["get", &format!("{base}/x"), "--aws-sigv4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must specify an AWS region"));

    assert!(recorded(&log).is_empty());
}

#[test]
fn sigv4_with_environment_credentials() {
    let (base, log) = start_server();

    httpreq()
        .env("AWS_ACCESS_KEY_ID", "AKIDE2E")
        .env("AWS_SECRET_ACCESS_KEY", "secret")
        .env_remove("AWS_SESSION_TOKEN")
        .args(["get", &format!("{base}/signed"), "--aws-sigv4", "--aws-region", "us-west-2"])
        .assert()
        .success();

    let sent = recorded(&log);
    let auth = sent[0].header("authorization").unwrap();
    assert!(auth.starts_with("AWS4-HMAC-SHA256 Credential=AKIDE2E/"));
    assert!(auth.contains("/us-west-2/execute-api/aws4_request"));
}

#[test]
fn output_file_receives_body() {
    let (base, _log) = start_server();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("body.json");

    httpreq()
        .args(["get", &format!("{base}/saved"), "--output-file", out.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("/saved").not());

    let saved: RecordedRequest = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(saved.path, "/saved");
}

#[test]
fn output_file_keeps_binary_body_intact() {
    let (base, _log) = start_server();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("body.bin");

    httpreq()
        .args(["get", &format!("{base}/blob/600"), "--output-file", out.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("200 ("));

    assert_eq!(std::fs::read(&out).unwrap(), blob_bytes(600));
}

#[test]
fn run_executes_spec_ids_in_given_order() {
    let (base, log) = start_server();
    let dir = tempfile::tempdir().unwrap();
    let spec = dir.path().join("spec.json");
    std::fs::write(
        &spec,
        r#"{"requests": [
            {"id": "a", "method": "GET", "url": "/a"},
            {"id": "b", "method": "POST", "url": "/b", "body": {"n": 1}},
            {"id": "c", "method": "DELETE", "url": "/c"}
        ]}"#,
    )
    .unwrap();

    httpreq()
        .args(["run", spec.to_str().unwrap(), "c", "b", "--base-url", &base])
        .assert()
        .success();

    let sent: Vec<String> = recorded(&log).into_iter().map(|r| r.path).collect();
    assert_eq!(sent, ["/c", "/b"]);
}

#[test]
fn run_with_unknown_id_fails_without_sending() {
    let (base, log) = start_server();
    let dir = tempfile::tempdir().unwrap();
    let spec = dir.path().join("spec.json");
    std::fs::write(&spec, r#"{"requests": [{"id": "a", "method": "GET", "url": "/a"}]}"#).unwrap();

    httpreq()
        .args(["run", spec.to_str().unwrap(), "a", "x", "--base-url", &base])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown request ID: x"));

    assert!(recorded(&log).is_empty());
}

#[test]
fn unreachable_host_exits_with_failure() {
    let closed = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = closed.local_addr().unwrap();
    drop(closed);

    httpreq()
        .args(["get", &format!("http://{addr}/"), "--timeout", "2"])
        .assert()
        .failure()
        .stdout(predicate::str::starts_with("error: transport error"));
}
