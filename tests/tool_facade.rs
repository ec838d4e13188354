mod common;

use common::{app_with_store, file_store, seed_catalog, settings_for, tmp_dir};
use leostream_bridge::mcp::server::McpServer;
use leostream_bridge::services::settings::ToolTier;
use leostream_bridge::stores::MemorySessionStore;
use serde_json::Value;
use std::sync::Arc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn call(server: &McpServer, id: u64, tool: &str, arguments: Value) -> Value {
    let line = serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": { "name": tool, "arguments": arguments },
    })
    .to_string();
    let response = server.handle_message(&line).await.expect("response");
    serde_json::to_value(&response).expect("serialize")
}

fn structured(response: &Value) -> &Value {
    &response["result"]["structuredContent"]
}

fn offline_server(label: &str, tier: ToolTier) -> McpServer {
    let dir = tmp_dir(label);
    seed_catalog(&dir.join("catalog.db"));
    let settings = settings_for("https://leostream.example.test", &dir).with_tool_tier(tier);
    let app = app_with_store(settings, Arc::new(MemorySessionStore::new()));
    McpServer::new(Arc::new(app))
}

#[tokio::test]
async fn initialize_ping_and_notifications() {
    let server = offline_server("facade-init", ToolTier::Full);

    let init = server
        .handle_message(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#)
        .await
        .expect("initialize reply");
    let init = serde_json::to_value(&init).expect("serialize");
    assert_eq!(init["result"]["serverInfo"]["name"], "leostream-bridge");

    let ping = server
        .handle_message(r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#)
        .await
        .expect("ping reply");
    assert!(ping.error.is_none());

    assert!(server
        .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
        .await
        .is_none());

    let unknown = server
        .handle_message(r#"{"jsonrpc":"2.0","id":3,"method":"resources/list"}"#)
        .await
        .expect("reply");
    assert_eq!(unknown.error.expect("error").code, -32601);

    let garbage = server.handle_message("{not json").await.expect("reply");
    assert_eq!(garbage.error.expect("error").code, -32700);
}

#[tokio::test]
async fn tools_list_follows_the_tier() {
    let full = offline_server("facade-full", ToolTier::Full);
    let listed = full
        .handle_message(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#)
        .await
        .expect("reply");
    let listed = serde_json::to_value(&listed).expect("serialize");
    let names: Vec<&str> = listed["result"]["tools"]
        .as_array()
        .expect("tools")
        .iter()
        .filter_map(|tool| tool["name"].as_str())
        .collect();
    assert_eq!(
        names,
        vec!["run_api", "query_api", "generate_session", "get_session", "kill_session"]
    );

    let helper = offline_server("facade-helper", ToolTier::Helper);
    let listed = helper
        .handle_message(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#)
        .await
        .expect("reply");
    let listed = serde_json::to_value(&listed).expect("serialize");
    assert_eq!(listed["result"]["tools"].as_array().expect("tools").len(), 1);

    let rejected = call(
        &helper,
        2,
        "run_api",
        serde_json::json!({ "query": "/pools", "method": "GET" }),
    )
    .await;
    assert_eq!(rejected["error"]["code"], -32602);
}

#[tokio::test]
async fn query_api_lists_matches_and_reports_no_match_without_failing() {
    let server = offline_server("facade-query", ToolTier::Full);

    let found = call(&server, 1, "query_api", serde_json::json!({ "query": "login" })).await;
    assert_eq!(found["result"]["isError"], false);
    let paths = structured(&found)["available_paths"]
        .as_array()
        .expect("available_paths");
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0]["path"], "/rest/v1/session/login");
    assert_eq!(paths[0]["method"], "POST");

    let logout = call(&server, 2, "query_api", serde_json::json!({ "query": "logout" })).await;
    let entry = &structured(&logout)["available_paths"][0];
    assert!(entry["request_body"].is_null());

    let missing = call(
        &server,
        3,
        "query_api",
        serde_json::json!({ "query": "zzz-nomatch" }),
    )
    .await;
    assert_eq!(missing["result"]["isError"], false);
    assert_eq!(
        structured(&missing),
        &serde_json::json!({ "error": "No matching endpoints found" })
    );
}

#[tokio::test]
async fn empty_query_lists_every_catalog_path() {
    let server = offline_server("facade-empty-query", ToolTier::Full);

    let everything = call(&server, 1, "query_api", serde_json::json!({ "query": "" })).await;
    assert_eq!(everything["result"]["isError"], false);
    let paths: Vec<&str> = structured(&everything)["available_paths"]
        .as_array()
        .expect("available_paths")
        .iter()
        .filter_map(|entry| entry["path"].as_str())
        .collect();
    assert_eq!(
        paths,
        vec![
            "/rest/v1/session/login",
            "/rest/v1/session/logout",
            "/rest/v1/pools"
        ]
    );

    let blank = call(&server, 2, "query_api", serde_json::json!({ "query": " " })).await;
    assert_eq!(blank["result"]["isError"], false);
    assert_eq!(structured(&blank)["error"], "No matching endpoints found");
}

#[tokio::test]
async fn run_api_accepts_an_empty_path() {
    let remote = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "version": "9.1",
        })))
        .expect(1)
        .mount(&remote)
        .await;

    let dir = tmp_dir("facade-root");
    let app = app_with_store(
        settings_for(&remote.uri(), &dir),
        Arc::new(MemorySessionStore::new()),
    );
    let server = McpServer::new(Arc::new(app));

    let root = call(
        &server,
        1,
        "run_api",
        serde_json::json!({ "query": "", "method": "GET" }),
    )
    .await;
    assert_eq!(root["result"]["isError"], false);
    assert_eq!(structured(&root)["version"], "9.1");
}

#[tokio::test]
async fn run_api_transport_failure_carries_kind() {
    let dir = tmp_dir("facade-unreachable");
    let app = app_with_store(
        settings_for("http://127.0.0.1:9", &dir),
        Arc::new(MemorySessionStore::with_token("sid", chrono::Utc::now())),
    );
    let server = McpServer::new(Arc::new(app));

    let response = call(
        &server,
        1,
        "run_api",
        serde_json::json!({ "query": "/pools", "method": "GET" }),
    )
    .await;
    assert!(response.get("error").is_none());
    assert_eq!(response["result"]["isError"], true);
    let payload = structured(&response);
    assert_eq!(payload["kind"], "transport");
    assert_eq!(payload["code"], "TRANSPORT");
    assert_eq!(payload["retryable"], true);
    assert!(payload["error"].is_string());
}

#[tokio::test]
async fn schema_violations_are_protocol_errors() {
    let server = offline_server("facade-schema", ToolTier::Full);
    let response = call(&server, 1, "run_api", serde_json::json!({ "query": "/pools" })).await;
    assert_eq!(response["error"]["code"], -32602);
    assert!(response["error"]["message"]
        .as_str()
        .expect("message")
        .contains("method"));

    let unknown = call(&server, 2, "query_apii", serde_json::json!({ "query": "x" })).await;
    assert!(unknown["error"]["message"]
        .as_str()
        .expect("message")
        .contains("query_api"));
}

#[tokio::test]
async fn tool_failures_come_back_as_error_payloads() {
    let server = offline_server("facade-failures", ToolTier::Full);

    let no_session = call(&server, 1, "get_session", serde_json::json!({})).await;
    assert!(no_session.get("error").is_none());
    assert_eq!(no_session["result"]["isError"], true);
    assert_eq!(structured(&no_session)["kind"], "not_found");

    let bad_method = call(
        &server,
        2,
        "run_api",
        serde_json::json!({ "query": "/pools", "method": "TRACE" }),
    )
    .await;
    assert_eq!(bad_method["result"]["isError"], true);
    assert_eq!(structured(&bad_method)["kind"], "invalid_params");
}

#[tokio::test]
async fn session_round_trip_through_the_tools() {
    let remote = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/session/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sid": "tool-sid",
        })))
        .mount(&remote)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/pools"))
        .and(header("authorization", "Bearer tool-sid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "pools": [{ "id": 1, "name": "desk" }],
        })))
        .mount(&remote)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/pools/404"))
        .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
        .mount(&remote)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/session/logout"))
        .and(header("authorization", "Bearer tool-sid"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&remote)
        .await;

    let dir = tmp_dir("facade-session");
    let store = file_store(&dir);
    let app = app_with_store(settings_for(&remote.uri(), &dir), store.clone());
    let server = McpServer::new(Arc::new(app));

    let login = call(&server, 1, "generate_session", serde_json::json!({})).await;
    assert_eq!(login["result"]["isError"], false);
    assert_eq!(structured(&login)["session_id"], "tool-sid");

    let status = call(&server, 2, "get_session", serde_json::json!({})).await;
    assert_eq!(structured(&status)["status"], "valid");
    assert!(structured(&status)["message"]
        .as_str()
        .expect("message")
        .starts_with("Found Valid Session: tool-sid"));

    let pools = call(
        &server,
        3,
        "run_api",
        serde_json::json!({ "query": "/pools", "method": "GET" }),
    )
    .await;
    assert_eq!(pools["result"]["isError"], false);
    assert_eq!(structured(&pools)["pools"][0]["name"], "desk");

    let missing = call(
        &server,
        4,
        "run_api",
        serde_json::json!({ "query": "/pools/404", "method": "GET" }),
    )
    .await;
    assert_eq!(missing["result"]["isError"], true);
    assert_eq!(structured(&missing)["details"], "missing");
    assert_eq!(structured(&missing)["status"], 404);
    assert_eq!(structured(&missing)["kind"], "http_status");
    assert_eq!(structured(&missing)["code"], "HTTP_STATUS");

    let killed = call(&server, 5, "kill_session", serde_json::json!({})).await;
    assert_eq!(
        structured(&killed)["message"],
        "Session tool-sid killed successfully."
    );
    assert_eq!(structured(&killed)["cleared"], true);
    assert!(!store.path().exists());
}
