#![allow(clippy::unwrap_used)]
// End-to-end tests for `Dashboard` reads, writes and session handling
// against a wiremock admin API.

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use classdesk_core::{
    CoreError, Dashboard, DashboardConfig, OperationKind, QueryStatus, ResourceKind, ResourceQuery,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn secret(s: &str) -> SecretString {
    SecretString::from(s.to_owned())
}

fn config_for(server: &MockServer) -> DashboardConfig {
    DashboardConfig::new(Url::parse(&format!("{}/api", server.uri())).unwrap())
}

async fn setup() -> (MockServer, Dashboard) {
    let server = MockServer::start().await;
    let dashboard = Dashboard::new(config_for(&server)).unwrap();
    (server, dashboard)
}

fn sign_in(dashboard: &Dashboard) {
    dashboard
        .session()
        .set_tokens(secret("tok-1"), Some(secret("ref-1")), Some("7".into()));
}

fn teachers() -> ResourceQuery {
    ResourceQuery::new(ResourceKind::Teachers)
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.unwrap().len()
}

// ── Reads ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_read_with_token_goes_loading_then_success() {
    let (server, dashboard) = setup().await;
    sign_in(&dashboard);

    Mock::given(method("GET"))
        .and(path("/api/teacher/list-select"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 7}])))
        .expect(1)
        .mount(&server)
        .await;

    let mut stream = dashboard.read(&teachers());
    assert_eq!(stream.current().status, QueryStatus::Loading);

    let entry = stream.settled().await;
    assert_eq!(entry.status, QueryStatus::Success);
    assert_eq!(entry.data.as_deref(), Some(&json!([{"id": 7}])));
}

#[tokio::test]
async fn test_concurrent_reads_share_one_request() {
    let (server, dashboard) = setup().await;
    sign_in(&dashboard);

    Mock::given(method("GET"))
        .and(path("/api/group/list-select"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let query = ResourceQuery::new(ResourceKind::Groups);
    let mut first = dashboard.read(&query);
    let mut second = dashboard.read(&query);
    let (a, b) = tokio::join!(first.settled(), second.settled());

    assert!(a.is_success() && b.is_success());
    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn test_read_without_token_never_hits_network() {
    let (server, dashboard) = setup().await;

    let entry = dashboard.fetch(&teachers()).await;

    assert_eq!(entry.status, QueryStatus::Idle);
    assert!(entry.error.as_ref().unwrap().is_auth_required());
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn test_missing_token_gates_even_fresh_entries() {
    let (server, dashboard) = setup().await;
    sign_in(&dashboard);

    Mock::given(method("GET"))
        .and(path("/api/teacher/list-select"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([1])))
        .mount(&server)
        .await;

    assert!(dashboard.fetch(&teachers()).await.is_success());
    dashboard.session().clear();

    let entry = dashboard.fetch(&teachers()).await;
    assert!(entry.error.as_ref().unwrap().is_auth_required());
    assert_eq!(entry.status, QueryStatus::Idle);
    assert!(!entry.is_success());
    assert!(entry.data.is_none(), "previous session's data must not leak");
    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn test_query_missing_param_stays_idle() {
    let (server, dashboard) = setup().await;
    sign_in(&dashboard);

    let entry = dashboard
        .fetch(&ResourceQuery::new(ResourceKind::UnitVideos))
        .await;

    assert_eq!(entry.status, QueryStatus::Idle);
    assert!(!entry.enabled);
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn test_detail_read_posts_param() {
    let (server, dashboard) = setup().await;
    sign_in(&dashboard);

    Mock::given(method("POST"))
        .and(path("/api/unit/video/list"))
        .and(body_json(json!({"detail_id": "12"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"video_id": 1}])))
        .expect(1)
        .mount(&server)
        .await;

    let entry = dashboard
        .fetch(&ResourceQuery::with_param(ResourceKind::UnitVideos, "12"))
        .await;
    assert!(entry.is_success());
}

#[tokio::test]
async fn test_server_error_is_recorded_on_entry() {
    let (server, dashboard) = setup().await;
    sign_in(&dashboard);

    Mock::given(method("POST"))
        .and(path("/api/teacher/detail"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such teacher"))
        .expect(1)
        .mount(&server)
        .await;

    let entry = dashboard
        .fetch(&ResourceQuery::with_param(ResourceKind::Teacher, "99"))
        .await;
    assert_eq!(entry.status, QueryStatus::Error);
    assert_eq!(entry.error.as_ref().unwrap().status(), Some(404));
    assert!(entry.data.is_none());
}

// ── Writes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_delete_teacher_invalidates_and_refetches_once() {
    let (server, dashboard) = setup().await;
    sign_in(&dashboard);

    Mock::given(method("GET"))
        .and(path("/api/teacher/list-select"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "7"}])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/teacher/list-select"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/teacher/delete"))
        .and(body_json(json!({"teacher_id": "7"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let before = dashboard.fetch(&teachers()).await;
    assert_eq!(before.data.as_deref(), Some(&json!([{"id": "7"}])));

    let response = dashboard
        .run(OperationKind::DeleteTeacher, json!({"id": "7"}), None)
        .await
        .unwrap();
    assert_eq!(response, json!({"ok": true}));

    let stale = dashboard.cache().entry(&teachers().key()).unwrap();
    assert!(stale.is_invalidated());
    assert_eq!(stale.data.as_deref(), Some(&json!([{"id": "7"}])));

    let after = dashboard.fetch(&teachers()).await;
    assert_eq!(after.data.as_deref(), Some(&json!([])));
    let again = dashboard.fetch(&teachers()).await;
    assert_eq!(again.data.as_deref(), Some(&json!([])));
}

#[tokio::test]
async fn test_mutation_without_token_sends_nothing() {
    let (server, dashboard) = setup().await;

    let err = dashboard
        .run(OperationKind::AddTeacher, json!({"name": "Ada"}), None)
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::AuthRequired));
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn test_mutation_validation_sends_nothing() {
    let (server, dashboard) = setup().await;
    sign_in(&dashboard);

    let err = dashboard
        .run(OperationKind::DeleteQuiz, json!({}), None)
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::ValidationFailed { .. }));
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn test_mutation_retries_transient_failure_once() {
    let (server, dashboard) = setup().await;
    sign_in(&dashboard);

    Mock::given(method("POST"))
        .and(path("/api/group/add"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/group/add"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"group_id": 4})))
        .mount(&server)
        .await;

    let response = dashboard
        .run(OperationKind::AddGroup, json!({"name": "B1"}), None)
        .await
        .unwrap();
    assert_eq!(response, json!({"group_id": 4}));
    assert_eq!(request_count(&server).await, 2);
}

#[tokio::test]
async fn test_mutation_gives_up_after_second_transient_failure() {
    let (server, dashboard) = setup().await;
    sign_in(&dashboard);

    Mock::given(method("POST"))
        .and(path("/api/unit/add"))
        .respond_with(ResponseTemplate::new(502))
        .expect(2)
        .mount(&server)
        .await;

    let err = dashboard
        .run(OperationKind::AddUnit, json!({"title": "Fractions"}), None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Mutation {
            operation: OperationKind::AddUnit,
            ..
        }
    ));
    assert_eq!(err.status(), Some(502));
}

#[tokio::test]
async fn test_failed_mutation_leaves_cache_untouched() {
    let (server, dashboard) = setup().await;
    sign_in(&dashboard);

    Mock::given(method("GET"))
        .and(path("/api/teacher/list-select"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "7"}])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/teacher/delete"))
        .respond_with(ResponseTemplate::new(422).set_body_string("teacher has groups"))
        .expect(1)
        .mount(&server)
        .await;

    dashboard.fetch(&teachers()).await;
    let err = dashboard
        .run(OperationKind::DeleteTeacher, json!({}), Some("7"))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(422));
    assert!(err.to_string().starts_with("deleteTeacher failed"));
    let entry = dashboard.cache().entry(&teachers().key()).unwrap();
    assert!(!entry.is_invalidated());
    assert!(dashboard.fetch(&teachers()).await.is_success());
}

// ── Session lifecycle ───────────────────────────────────────────────

#[tokio::test]
async fn test_failed_refresh_keeps_reads_gated_until_new_tokens() {
    let (server, dashboard) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid refresh token"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/teacher/list-select"))
        .and(header("authorization", "Bearer tok-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    sign_in(&dashboard);
    assert!(dashboard.refresh().await.is_err());
    dashboard.logout();

    for _ in 0..2 {
        let entry = dashboard.fetch(&teachers()).await;
        assert!(entry.error.as_ref().unwrap().is_auth_required());
    }

    dashboard
        .session()
        .set_tokens(secret("tok-2"), Some(secret("ref-2")), Some("7".into()));
    let entry = dashboard.fetch(&teachers()).await;
    assert!(entry.is_success());
    assert!(entry.error.is_none());
}

#[tokio::test]
async fn test_login_persists_session_and_clears_cache() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_for(&server);
    config.session_file = Some(dir.path().join("session.json"));

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({"email": "admin@example.com", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-9",
            "refresh_token": "ref-9",
            "user_id": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dashboard = Dashboard::new(config.clone()).unwrap();
    dashboard.fetch(&teachers()).await;
    assert_eq!(dashboard.cache().len(), 1);

    let session = dashboard
        .login("admin@example.com", &secret("pw"))
        .await
        .unwrap();
    assert_eq!(session.user_id.as_deref(), Some("3"));
    assert!(dashboard.cache().is_empty());

    let restored = Dashboard::new(config).unwrap();
    assert!(restored.session().is_authenticated());
    assert_eq!(restored.session().user_id().as_deref(), Some("3"));

    restored.logout();
    assert!(!dir.path().join("session.json").exists());
}
