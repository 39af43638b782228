//! Integration tests for the `onapie` CLI binary.
//!
//! Argument handling and exit codes are checked offline (catalog fetch
//! disabled, no credentials); the request flow runs against a wiremock server.
#![allow(clippy::unwrap_used)]

use std::io::Write;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use tokio::runtime::Runtime;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a command for the `onapie` binary with env isolation.
///
/// `HOME` points at an empty directory so `~/.onapierc` is never the user's
/// real file, and every `ONAPIE_*` variable is cleared.
fn onapie_cmd(home: &tempfile::TempDir) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("onapie");
    cmd.env("HOME", home.path())
        .env_remove("RUST_LOG")
        .env_remove("ONAPIE_CONFIG")
        .env_remove("ONAPIE_API_ADDR")
        .env_remove("ONAPIE_TOKEN_KEY")
        .env_remove("ONAPIE_API_TOKEN")
        .env_remove("ONAPIE_USERNAME")
        .env_remove("ONAPIE_PASSWORD")
        .env_remove("ONAPIE_OUTPUT");
    cmd
}

/// Offline invocation: no catalog fetch, no network.
fn offline_cmd(home: &tempfile::TempDir) -> assert_cmd::Command {
    let mut cmd = onapie_cmd(home);
    cmd.args(["--api-addr", "http://127.0.0.1:9", "--fetch-catalog", "False"]);
    cmd
}

struct Server {
    server: MockServer,
    rt: Runtime,
}

impl Server {
    fn start() -> Self {
        let rt = Runtime::new().unwrap();
        let server = rt.block_on(MockServer::start());
        Self { server, rt }
    }

    fn mount(&self, mock: Mock) {
        self.rt.block_on(mock.mount(&self.server));
    }

    fn uri(&self) -> String {
        self.server.uri()
    }
}

// ── Help ────────────────────────────────────────────────────────────

#[test]
fn test_help_flag_anywhere() {
    let home = tempfile::tempdir().unwrap();
    onapie_cmd(&home)
        .args(["forms", "list", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Usage: onapie")
                .and(predicate::str::contains("forms"))
                .and(predicate::str::contains("get_formdata"))
                .and(predicate::str::contains("list_endpoints")),
        );
}

#[test]
fn test_short_help_flag() {
    let home = tempfile::tempdir().unwrap();
    onapie_cmd(&home)
        .arg("-h")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("--api-addr"));
}

// ── Exit codes ──────────────────────────────────────────────────────

#[test]
fn test_missing_option_value_exits_1() {
    let home = tempfile::tempdir().unwrap();
    onapie_cmd(&home)
        .arg("--username")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("missing value for argument --username"));
}

#[test]
fn test_missing_api_exits_2() {
    let home = tempfile::tempdir().unwrap();
    offline_cmd(&home)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("must specify an api"));
}

#[test]
fn test_unknown_api_exits_3_and_lists_apis() {
    let home = tempfile::tempdir().unwrap();
    offline_cmd(&home)
        .args(["bogus", "list"])
        .assert()
        .code(3)
        .stderr(
            predicate::str::contains("api bogus does not exist")
                .and(predicate::str::contains("data, forms and stats")),
        );
}

#[test]
fn test_missing_method_exits_4() {
    let home = tempfile::tempdir().unwrap();
    offline_cmd(&home)
        .arg("forms")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("clone_to_user"));
}

#[test]
fn test_unknown_method_exits_5() {
    let home = tempfile::tempdir().unwrap();
    offline_cmd(&home)
        .args(["stats", "bogus"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("method bogus does not exist on the stats api"));
}

#[test]
fn test_missing_required_argument_exits_6() {
    let home = tempfile::tempdir().unwrap();
    offline_cmd(&home)
        .args(["forms", "get"])
        .assert()
        .code(6)
        .stderr(
            predicate::str::contains("missing field `pk`")
                .and(predicate::str::contains("pk, representation or tags")),
        );
}

#[test]
fn test_invalid_representation_exits_7() {
    let home = tempfile::tempdir().unwrap();
    offline_cmd(&home)
        .args(["forms", "get", "--pk", "1", "--representation", "pdf"])
        .assert()
        .code(7)
        .stderr(predicate::str::contains("unsupported form representation"));
}

// ── Request flow ────────────────────────────────────────────────────

#[test]
fn test_credentials_exchange_then_forms_list() {
    let server = Server::start();
    let base = server.uri();
    server.mount(
        Mock::given(method("GET"))
            .and(path("/api/v1/user"))
            .and(header("authorization", "Basic dTpw"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"api_token": "T"}))),
    );
    server.mount(
        Mock::given(method("GET"))
            .and(path("/api/v1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "forms": format!("{base}/api/v1/forms"),
                "data": format!("{base}/api/v1/data"),
                "stats": format!("{base}/api/v1/stats"),
            }))),
    );
    server.mount(
        Mock::given(method("GET"))
            .and(path("/api/v1/forms"))
            .and(header("authorization", "Token T"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({}))),
    );

    let home = tempfile::tempdir().unwrap();
    onapie_cmd(&home)
        .args(["--api-addr", &base, "--username=u", "--password=p", "forms", "list"])
        .assert()
        .success()
        .stdout("{}\n");
}

#[test]
fn test_numeric_password_is_sent_as_text() {
    let server = Server::start();
    server.mount(
        Mock::given(method("GET"))
            .and(path("/api/v1/user"))
            .and(header("authorization", "Basic dToxMjM0NQ=="))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"api_token": "T"}))),
    );
    server.mount(
        Mock::given(method("GET"))
            .and(path("/api/v1/stats/1"))
            .and(header("authorization", "Token T"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"n": 1}))),
    );

    let home = tempfile::tempdir().unwrap();
    onapie_cmd(&home)
        .args(["--api-addr", &server.uri(), "--fetch-catalog", "False"])
        .args(["--username", "u", "--password", "12345", "stats", "get", "--pk", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"n\": 1"));
}

#[test]
fn test_config_file_supplies_client_options() {
    let server = Server::start();
    server.mount(
        Mock::given(method("GET"))
            .and(path("/api/v1/stats/3"))
            .and(query_param("method", "mean"))
            .and(header("authorization", "Token from-file"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"age": 4}))),
    );

    let home = tempfile::tempdir().unwrap();
    let mut rc = std::fs::File::create(home.path().join(".onapierc")).unwrap();
    write!(
        rc,
        r#"{{"api_addr": "{}", "api_token": "from-file", "fetch_catalog": false, "output": "json-compact"}}"#,
        server.uri()
    )
    .unwrap();

    onapie_cmd(&home)
        .args(["stats", "get", "--pk", "3", "--method", "mean"])
        .assert()
        .success()
        .stdout("{\"age\":4}\n");
}

#[test]
fn test_delete_with_wrong_status_exits_7() {
    let server = Server::start();
    server.mount(
        Mock::given(method("DELETE"))
            .and(path("/api/v1/forms/1"))
            .respond_with(ResponseTemplate::new(200)),
    );

    let home = tempfile::tempdir().unwrap();
    onapie_cmd(&home)
        .args(["--api-addr", &server.uri(), "--fetch-catalog", "false"])
        .args(["forms", "delete", "--pk", "1"])
        .assert()
        .code(7)
        .stderr(predicate::str::contains("Invalid api delete response: 200, OK"));
}

#[test]
fn test_extra_arguments_are_ignored_with_a_warning() {
    let server = Server::start();
    server.mount(
        Mock::given(method("POST"))
            .and(path("/api/v1/forms/1/clone"))
            .and(body_string("username=alice"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"formid": 2}))),
    );

    let home = tempfile::tempdir().unwrap();
    onapie_cmd(&home)
        .args(["--api-addr", &server.uri(), "--fetch-catalog", "false"])
        .args(["forms", "clone_to_user", "--pk", "1", "--username", "alice", "--colour", "red"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"formid\": 2"))
        .stderr(predicate::str::contains("ignoring extra argument(s): colour"));
}

#[test]
fn test_export_bytes_are_written_verbatim() {
    let server = Server::start();
    server.mount(
        Mock::given(method("GET"))
            .and(path("/api/v1/exports/5.csv"))
            .respond_with(ResponseTemplate::new(200).set_body_string("name,age\nbob,3\n")),
    );

    let home = tempfile::tempdir().unwrap();
    onapie_cmd(&home)
        .args(["--api-addr", &server.uri(), "--fetch-catalog", "false"])
        .args(["forms", "get_formdata", "--pk", "5", "--export-format", "csv"])
        .assert()
        .success()
        .stdout("name,age\nbob,3\n");
}

#[test]
fn test_quiet_suppresses_results() {
    let server = Server::start();
    server.mount(
        Mock::given(method("GET"))
            .and(path("/api/v1/forms"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"formid": 1}]))),
    );

    let home = tempfile::tempdir().unwrap();
    onapie_cmd(&home)
        .args(["-q", "--api-addr", &server.uri(), "--fetch-catalog", "false", "forms", "list"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_unreachable_server_exits_1() {
    let home = tempfile::tempdir().unwrap();
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    onapie_cmd(&home)
        .args(["--api-addr", &format!("http://127.0.0.1:{port}"), "--max-retries", "0"])
        .args(["forms", "list"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("could not create the Ona client"));
}
