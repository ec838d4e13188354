mod common;

use common::{file_store, settings_for, tmp_dir};
use filetime::FileTime;
use leostream_bridge::errors::ToolErrorKind;
use leostream_bridge::services::http_client::HttpClient;
use leostream_bridge::services::logger::Logger;
use leostream_bridge::services::session::{SessionManager, SessionState};
use leostream_bridge::services::settings::Settings;
use leostream_bridge::stores::SessionStore;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn manager(settings: Settings, store: Arc<dyn SessionStore>) -> SessionManager {
    let logger = Logger::new("test");
    let http = HttpClient::new(&logger, &settings).expect("client");
    SessionManager::new(logger, Arc::new(settings), http, store)
}

#[tokio::test]
async fn login_stores_token_and_reports_a_valid_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/session/login"))
        .and(body_json(serde_json::json!({
            "user_login": "admin",
            "password": "s3cret",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sid": "abc123",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tmp_dir("login");
    let store = file_store(&dir);
    let sessions = manager(settings_for(&server.uri(), &dir), store.clone());

    let sid = sessions.create_session(None).await.expect("login");
    assert_eq!(sid, "abc123");

    let status = sessions.get_session().expect("status");
    assert_eq!(status.state, SessionState::Valid);
    assert!(status.age_seconds < 5);
    assert!(status
        .message()
        .starts_with("Found Valid Session: abc123 | Age: "));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(store.path())
            .expect("metadata")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

#[tokio::test]
async fn login_without_sid_is_an_auth_error_and_stores_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/session/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": "bad credentials",
        })))
        .mount(&server)
        .await;

    let dir = tmp_dir("login-fail");
    let store = file_store(&dir);
    let sessions = manager(settings_for(&server.uri(), &dir), store.clone());

    let err = sessions.create_session(None).await.expect_err("no sid");
    assert_eq!(err.kind, ToolErrorKind::Auth);
    assert_eq!(err.details.as_ref().expect("details")["status"], 401);
    assert!(store.load().expect("load").is_none());
}

#[tokio::test]
async fn session_older_than_twelve_hours_is_stale() {
    let dir = tmp_dir("stale");
    let store = file_store(&dir);
    store.save("old-sid").expect("save");

    let twelve_hours_ago = std::time::SystemTime::now()
        - std::time::Duration::from_secs(43_200 + 60);
    filetime::set_file_mtime(store.path(), FileTime::from_system_time(twelve_hours_ago))
        .expect("age file");

    let sessions = manager(settings_for("https://leostream.example.test", &dir), store);
    let status = sessions.get_session().expect("status");
    assert_eq!(status.state, SessionState::Stale);
    assert!(status.age_seconds >= 43_200);
    assert_eq!(
        status.message(),
        "Found a Session, but it is not valid (Over 12Hrs Old), please generate another one: old-sid [Kill This Session ID]"
    );
}

#[tokio::test]
async fn missing_session_is_not_found() {
    let dir = tmp_dir("empty");
    let sessions = manager(
        settings_for("https://leostream.example.test", &dir),
        file_store(&dir),
    );
    let err = sessions.get_session().expect_err("nothing stored");
    assert_eq!(err.kind, ToolErrorKind::NotFound);
}

#[tokio::test]
async fn logout_sends_bearer_token_and_clears_the_store() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/session/logout"))
        .and(header("authorization", "Bearer live-sid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "logout": "ok",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tmp_dir("logout");
    let store = file_store(&dir);
    store.save("live-sid").expect("save");
    let sessions = manager(settings_for(&server.uri(), &dir), store.clone());

    let receipt = sessions.kill_session().await.expect("logout");
    assert_eq!(receipt.token, "live-sid");
    assert!(receipt.cleared);
    assert_eq!(receipt.response["logout"], "ok");
    assert!(store.load().expect("load").is_none());
    assert!(!store.path().exists());
}

#[tokio::test]
async fn rejected_logout_keeps_the_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/session/logout"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let dir = tmp_dir("logout-fail");
    let store = file_store(&dir);
    store.save("keep-me").expect("save");
    let sessions = manager(settings_for(&server.uri(), &dir), store.clone());

    let err = sessions.kill_session().await.expect_err("remote failure");
    assert_eq!(err.kind, ToolErrorKind::HttpStatus);
    assert_eq!(err.details.as_ref().expect("details")["body"], "boom");
    assert_eq!(store.load().expect("load").expect("token").value, "keep-me");
}

#[tokio::test]
async fn logout_without_stored_session_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/session/logout"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tmp_dir("logout-empty");
    let sessions = manager(settings_for(&server.uri(), &dir), file_store(&dir));

    let err = sessions.kill_session().await.expect_err("nothing to kill");
    assert_eq!(err.kind, ToolErrorKind::NotFound);
    assert!(err.hint.is_some());
}

#[tokio::test]
async fn logout_transport_failure_keeps_the_token() {
    let dir = tmp_dir("logout-unreachable");
    let store = file_store(&dir);
    store.save("still-here").expect("save");
    let sessions = manager(settings_for("http://127.0.0.1:9", &dir), store.clone());

    let err = sessions.kill_session().await.expect_err("unreachable");
    assert_eq!(err.kind, ToolErrorKind::Transport);
    assert!(err.retryable);
    assert_eq!(store.load().expect("load").expect("token").value, "still-here");
}

#[tokio::test]
async fn login_transport_failure_stores_nothing() {
    let dir = tmp_dir("login-unreachable");
    let store = file_store(&dir);
    let sessions = manager(settings_for("http://127.0.0.1:9", &dir), store.clone());

    let err = sessions.create_session(None).await.expect_err("unreachable");
    assert_eq!(err.kind, ToolErrorKind::Transport);
    assert!(store.load().expect("load").is_none());
    assert!(!store.path().exists());
}

#[tokio::test]
async fn sid_with_surrounding_spaces_is_kept_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/session/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sid": " spaced-sid ",
        })))
        .mount(&server)
        .await;

    let dir = tmp_dir("login-spaced");
    let store = file_store(&dir);
    let sessions = manager(settings_for(&server.uri(), &dir), store.clone());

    let sid = sessions.create_session(None).await.expect("login");
    assert_eq!(sid, " spaced-sid ");
    assert_eq!(store.load().expect("load").expect("token").value, " spaced-sid ");
}
