use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A command isolated from user config files and tracker env vars
fn isolated(home: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("tracker-rpc");
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path())
        .env_remove("TRACKER_CONFIG")
        .env_remove("TRACKER_URL")
        .env_remove("TRACKER_LOGIN")
        .env_remove("TRACKER_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

fn responses(stdout: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn tracker(url: &str) -> Value {
    json!({
        "id": 7,
        "url": url,
        "type": "REDMINE",
        "credentials": {"login": "alice", "password": "s3cret"}
    })
}

#[test]
fn test_help_command() {
    cargo_bin_cmd!("tracker-rpc")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("JSON-RPC service and CLI"));
}

#[test]
fn test_issue_subcommand_help() {
    cargo_bin_cmd!("tracker-rpc")
        .args(["issue", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("progress"))
        .stdout(predicate::str::contains("url"));
}

#[test]
fn test_completions() {
    cargo_bin_cmd!("tracker-rpc")
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tracker-rpc"));
}

#[test]
fn test_missing_config() {
    let home = TempDir::new().unwrap();
    isolated(&home)
        .args(["issue", "get", "42"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("URL not configured"));
}

#[test]
fn test_missing_config_file() {
    let home = TempDir::new().unwrap();
    isolated(&home)
        .args(["--config", "absent.toml", "user"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn test_invalid_date() {
    let home = TempDir::new().unwrap();
    isolated(&home)
        .args(["--url", "http://127.0.0.1:1", "--login", "alice"])
        .args(["report", "total", "--date", "yesterday"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected YYYY-MM-DD"));
}

#[test]
fn test_rpc_call_version() {
    let home = TempDir::new().unwrap();
    isolated(&home)
        .args(["rpc", "call", "API.Version"])
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_rpc_call_unknown_method() {
    let home = TempDir::new().unwrap();
    isolated(&home)
        .args(["--format", "json", "rpc", "call", "API.Nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Method not found"));
}

#[test]
fn test_rpc_serve_error_codes() {
    let home = TempDir::new().unwrap();
    let mut jira = tracker("http://127.0.0.1:1");
    jira["type"] = json!("JIRA");

    let requests = [
        "{broken".to_string(),
        json!({"jsonrpc": "2.0", "id": 1, "method": "API.GetCurrentUser",
               "params": {"tracker": jira}})
        .to_string(),
        json!({"jsonrpc": "2.0", "id": 2, "method": "API.GetIssueByURL",
               "params": {"tracker": tracker("http://127.0.0.1:1"), "issue_url": "http://rm/projects/1"}})
        .to_string(),
        json!({"jsonrpc": "2.0", "id": 3, "method": "API.GetProjects", "params": {}}).to_string(),
    ];

    let output = isolated(&home)
        .args(["rpc", "serve"])
        .write_stdin(requests.join("\n") + "\n")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let responses = responses(&output);
    assert_eq!(responses.len(), 4);
    assert_eq!(responses[0]["error"]["code"], -32700);
    assert_eq!(responses[1]["id"], 1);
    assert_eq!(responses[1]["error"]["code"], 103);
    assert_eq!(responses[1]["error"]["message"], "INVALID_TRACKER_TYPE");
    assert_eq!(responses[2]["error"]["code"], 105);
    assert_eq!(responses[3]["error"]["code"], -32602);
}

#[test]
fn test_rpc_serve_rejects_foreign_token() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("config.toml");
    std::fs::write(&config, "[rpc]\ntoken = \"expected\"\n").unwrap();

    let request = json!({"jsonrpc": "2.0", "id": 1, "method": "API.GetCurrentUser",
        "params": {"context": {"token": "other", "tracing_id": "t-1"},
                   "tracker": tracker("http://127.0.0.1:1")}});

    let output = isolated(&home)
        .arg("--config")
        .arg(&config)
        .args(["rpc", "serve"])
        .write_stdin(format!("{}\n", request))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let responses = responses(&output);
    assert_eq!(responses[0]["error"]["code"], 3);
    assert_eq!(responses[0]["error"]["message"], "FORBIDDEN");
}

#[tokio::test]
async fn test_rpc_serve_current_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/current.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {"id": 5, "login": "alice", "firstname": "Ada",
                     "lastname": "Lovelace", "mail": "ada@example.com"}
        })))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let request = json!({"jsonrpc": "2.0", "id": "u", "method": "GetCurrentUser",
        "params": {"tracker": tracker(&server.uri())}});

    let output = isolated(&home)
        .args(["rpc", "serve"])
        .write_stdin(format!("{}\n", request))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let responses = responses(&output);
    assert_eq!(responses[0]["id"], "u");
    assert_eq!(
        responses[0]["result"]["user"],
        json!({"id": 5, "name": "Lovelace Ada", "mail": "ada@example.com"})
    );
}

#[tokio::test]
async fn test_user_command_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/current.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {"id": 5, "login": "alice", "firstname": "Ada",
                     "lastname": "Lovelace", "mail": "ada@example.com"}
        })))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    isolated(&home)
        .args(["--url", &server.uri(), "--login", "alice", "--password", "s3cret"])
        .args(["--format", "json", "user"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"Lovelace Ada\""));
}

#[tokio::test]
async fn test_unauthorized_reports_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    isolated(&home)
        .args(["--url", &server.uri(), "--login", "alice"])
        .args(["--format", "json", "project", "get", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("INVALID_CREDENTIALS"));
}
