//! End-to-end session tests against a mocked analysis backend using wiremock

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{any, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use codefable::{
    project, AnalysisApi, AnalysisError, AnalysisSession, FilterError, GraphLink, HistoryItem,
    HttpApi, NotificationKind, SessionState,
};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

fn widgets_json() -> Value {
    serde_json::from_str(include_str!("../fixtures/widgets_result.json")).unwrap()
}

fn gears_json() -> Value {
    serde_json::from_str(include_str!("../fixtures/gears_result.json")).unwrap()
}

fn create_api(mock_server: &MockServer) -> HttpApi {
    HttpApi::new(&format!("{}/api/v1", mock_server.uri())).unwrap()
}

fn create_session(mock_server: &MockServer) -> AnalysisSession<HttpApi> {
    AnalysisSession::new(Arc::new(create_api(mock_server)), POLL_INTERVAL)
}

fn widgets_item() -> HistoryItem {
    HistoryItem {
        id: "r1".to_string(),
        owner: "acme".to_string(),
        name: "widgets".to_string(),
    }
}

async fn mount_job(mock_server: &MockServer, repo: &str, job_id: &str, repo_id: &str) {
    Mock::given(method("GET"))
        .and(path("/api/v1/analyze"))
        .and(query_param("repo", repo))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"job_id": job_id, "repo_id": repo_id})),
        )
        .mount(mock_server)
        .await;
}

async fn mount_status(mock_server: &MockServer, job_id: &str, status: &str, times: Option<u64>) {
    let mock = Mock::given(method("GET"))
        .and(path(format!("/api/v1/status/{}", job_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": status})));
    let mock = match times {
        Some(n) => mock.up_to_n_times(n),
        None => mock,
    };
    mock.mount(mock_server).await;
}

async fn mount_result(mock_server: &MockServer, id: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v1/results/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_submit_poll_fetch_displays_result() {
    let mock_server = MockServer::start().await;
    mount_job(&mock_server, "acme/widgets", "j1", "r1").await;
    mount_status(&mock_server, "j1", "pending", Some(1)).await;
    mount_status(&mock_server, "j1", "completed", None).await;
    mount_result(&mock_server, "r1", widgets_json()).await;

    let mut session = create_session(&mock_server);
    session.submit("https://github.com/acme/widgets");
    session.settle().await;

    let result = session.current_result().expect("result displayed");
    assert_eq!(result.id, "r1");
    assert_eq!(result.owner, "acme");
    assert_eq!(result.name, "widgets");
    assert_eq!(result.narrative, "...");
    assert_eq!(session.cluster_filter(), None);
    assert_eq!(session.history(), &[widgets_item()]);
    assert!(session.take_notifications().is_empty());
}

#[tokio::test]
async fn test_job_failed_returns_to_idle() {
    let mock_server = MockServer::start().await;
    mount_job(&mock_server, "acme/widgets", "j1", "r1").await;
    mount_status(&mock_server, "j1", "failed", None).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/results/r1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(widgets_json()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut session = create_session(&mock_server);
    session.submit("acme/widgets");
    session.settle().await;

    assert_eq!(session.state(), &SessionState::Idle);
    assert!(session.history().is_empty());
    let notes = session.take_notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].kind, NotificationKind::JobFailed);
}

#[tokio::test]
async fn test_job_timed_out_notification() {
    let mock_server = MockServer::start().await;
    mount_job(&mock_server, "acme/widgets", "j1", "r1").await;
    mount_status(&mock_server, "j1", "TIMED_OUT", None).await;

    let mut session = create_session(&mock_server);
    session.submit("acme/widgets");
    session.settle().await;

    assert!(session.state().is_idle());
    let notes = session.take_notifications();
    assert_eq!(notes[0].kind, NotificationKind::JobTimedOut);
    assert!(notes[0].message.contains("timed out"));
}

#[tokio::test]
async fn test_malformed_reference_sends_nothing() {
    let mock_server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut session = create_session(&mock_server);
    for input in ["acme", "https://github.com/acme", "https://github.com/"] {
        session.submit(input);
        session.settle().await;

        assert!(session.state().is_idle());
        assert_eq!(
            session.take_notifications()[0].kind,
            NotificationKind::Validation
        );
    }
}

#[tokio::test]
async fn test_submit_error_uses_backend_detail() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/analyze"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"detail": "Repository not found"})),
        )
        .mount(&mock_server)
        .await;

    let mut session = create_session(&mock_server);
    session.submit("acme/ghost");
    session.settle().await;

    assert!(session.state().is_idle());
    let notes = session.take_notifications();
    assert_eq!(notes[0].kind, NotificationKind::Transport);
    assert!(notes[0].message.contains("Repository not found"));
}

#[tokio::test]
async fn test_synchronous_result_skips_polling() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/analyze"))
        .and(query_param("repo", "acme/widgets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"repo": widgets_json()})))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/status/j1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut session = create_session(&mock_server);
    session.submit("git@github.com:acme/widgets.git");
    session.settle().await;

    assert_eq!(session.current_result().map(|r| r.id.as_str()), Some("r1"));
    assert_eq!(session.history(), &[widgets_item()]);
}

#[tokio::test]
async fn test_fetch_is_idempotent() {
    let mock_server = MockServer::start().await;
    mount_result(&mock_server, "r2", gears_json()).await;

    let api = create_api(&mock_server);
    let first = api.result("r2").await.unwrap();
    let second = api.result("r2").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_vec(&first).unwrap(),
        serde_json::to_vec(&second).unwrap()
    );
    // Order and duplicates of hotspots survive decoding.
    assert_eq!(
        first.metrics.hotspots,
        vec!["src/engine.rs", "src/gear.rs", "src/engine.rs"]
    );
    assert_eq!(first.metrics.churn.get("src/engine.rs"), Some(&412));
    assert_eq!(
        serde_json::to_value(&first.metrics).unwrap()["churn"],
        gears_json()["metrics"]["churn"]
    );
}

#[tokio::test]
async fn test_history_listing_and_failure() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([gears_json(), widgets_json()])))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/history"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let mut session = create_session(&mock_server);
    session.load_history().await;
    let names: Vec<String> = session.history().iter().map(|h| h.to_string()).collect();
    assert_eq!(names, vec!["acme/gears", "acme/widgets"]);

    let api = create_api(&mock_server);
    let err = api.history().await.unwrap_err();
    assert!(matches!(err, AnalysisError::HistoryLoad(_)));

    let mut fresh = create_session(&mock_server);
    fresh.load_history().await;
    assert!(fresh.history().is_empty());
    assert!(fresh.take_notifications().is_empty());
}

#[tokio::test]
async fn test_cluster_filter_on_displayed_result() {
    let mock_server = MockServer::start().await;
    mount_job(&mock_server, "acme/widgets", "j1", "r1").await;
    mount_status(&mock_server, "j1", "completed", None).await;
    mount_result(&mock_server, "r1", widgets_json()).await;

    let mut session = create_session(&mock_server);
    session.submit("acme/widgets");
    session.settle().await;
    let original = session.current_result().unwrap().graph.clone();

    session.select_cluster(Some("core")).unwrap();
    let view = session.visible_graph().unwrap();
    assert_eq!(view.nodes.len(), 1);
    assert_eq!(view.nodes[0].id, "a");
    assert!(view.links.is_empty());

    assert_eq!(
        session.select_cluster(Some("ui")),
        Err(FilterError::UnknownCluster("ui".to_string()))
    );

    session.select_cluster(None).unwrap();
    assert_eq!(session.visible_graph().unwrap(), original);
}

#[tokio::test]
async fn test_renderer_mutated_links_project_cleanly() {
    let mock_server = MockServer::start().await;
    mount_result(&mock_server, "r2", gears_json()).await;

    let mut session = create_session(&mock_server);
    session.open_shared("http://localhost:5173/?repo_id=r2");
    session.settle().await;

    let result = session.current_result().unwrap().clone();
    assert_eq!(result.graph.dangling_links(), 1);
    assert!(session.history().is_empty());

    let unfiltered = session.visible_graph().unwrap();
    assert_eq!(unfiltered.links.len(), 3);
    assert_eq!(unfiltered.dangling_links(), 0);

    session.select_cluster(Some("engine")).unwrap();
    let view = session.visible_graph().unwrap();
    assert_eq!(
        view.links,
        vec![
            GraphLink::new("src/engine.rs", "src/gear.rs"),
            GraphLink::new("src/gear.rs", "src/engine.rs"),
        ]
    );
    assert_eq!(project(&result.graph, Some("engine")), view);
    assert_eq!(session.current_result().unwrap(), &result);
}

#[tokio::test]
async fn test_latest_submission_wins() {
    let mock_server = MockServer::start().await;
    mount_job(&mock_server, "acme/slow", "ja", "ra").await;
    mount_status(&mock_server, "ja", "pending", None).await;
    mount_result(&mock_server, "ra", json!({"id": "ra", "owner": "acme", "name": "slow"})).await;

    mount_job(&mock_server, "acme/widgets", "jb", "r1").await;
    mount_status(&mock_server, "jb", "completed", None).await;
    mount_result(&mock_server, "r1", widgets_json()).await;

    let mut session = create_session(&mock_server);
    session.submit("acme/slow");
    assert!(session.step().await);

    session.submit("acme/widgets");
    session.settle().await;
    tokio::time::sleep(POLL_INTERVAL * 10).await;

    assert!(!session.step().await);
    assert_eq!(session.current_result().map(|r| r.id.as_str()), Some("r1"));
    assert_eq!(session.history(), &[widgets_item()]);
}
