//! Session setup, team directory, workflow pruning and runner groups.

mod common;

use common::{connect, mount_session, not_found, params, BOOTSTRAP, ORG};
use repo_bootstrap::workflows::BOOTSTRAP_WORKFLOW_NAME;
use repo_bootstrap::{ProvisionError, Session};
use serde_json::{json, Value};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Session
// =============================================================================

#[tokio::test]
async fn test_connect_fails_when_org_cannot_be_resolved() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/orgs/{ORG}")))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Bad credentials"})))
        .mount(&server)
        .await;

    let err = Session::connect(params(&server)).await.err().unwrap();
    match err {
        ProvisionError::Session { org, source, .. } => {
            assert_eq!(org, ORG);
            assert_eq!(source.status(), Some(401));
        }
        other => panic!("Expected Session error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_connect_resolves_bootstrap_repo() {
    let server = MockServer::start().await;
    mount_session(&server).await;

    let session = Session::connect(params(&server)).await.unwrap();
    assert_eq!(session.org().login, ORG);
    assert_eq!(session.bootstrap_repo().name, BOOTSTRAP);
}

// =============================================================================
// Teams
// =============================================================================

#[tokio::test]
async fn test_load_teams_collects_slugs() {
    let server = MockServer::start().await;
    let (mut session, _) = connect(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("/orgs/{ORG}/teams")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "slug": "payments", "name": "Payments"},
            {"id": 2, "slug": "platform-sre", "name": "Platform SRE"}
        ])))
        .mount(&server)
        .await;

    assert_eq!(session.has_team("payments"), None);
    assert!(session.load_teams().await);

    let slugs: Vec<&str> = session
        .team_slugs()
        .unwrap()
        .iter()
        .map(String::as_str)
        .collect();
    assert_eq!(slugs, vec!["payments", "platform-sre"]);
    assert_eq!(session.has_team("payments"), Some(true));
    assert_eq!(session.has_team("marketing"), Some(false));
}

#[tokio::test]
async fn test_load_teams_failure_is_soft() {
    let server = MockServer::start().await;
    let (mut session, _) = connect(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("/orgs/{ORG}/teams")))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "Forbidden"})))
        .mount(&server)
        .await;

    assert!(!session.load_teams().await);
    assert!(session.team_slugs().is_none());
}

// =============================================================================
// Workflow pruning
// =============================================================================

async fn mount_workflow_runs(server: &MockServer, run_count: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{ORG}/{BOOTSTRAP}/actions/workflows")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 2,
            "workflows": [
                {"id": 7, "name": "CI"},
                {"id": 8, "name": BOOTSTRAP_WORKFLOW_NAME}
            ]
        })))
        .mount(server)
        .await;

    // Newest first, like GitHub
    let runs: Vec<Value> = (1..=run_count)
        .rev()
        .map(|id| json!({"id": id, "created_at": "2024-05-01T10:00:00Z"}))
        .collect();
    Mock::given(method("GET"))
        .and(path(format!(
            "/repos/{ORG}/{BOOTSTRAP}/actions/workflows/8/runs"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": run_count,
            "workflow_runs": runs
        })))
        .mount(server)
        .await;
}

fn run_delete() -> wiremock::MockBuilder {
    Mock::given(method("DELETE")).and(path_regex(format!(
        r"^/repos/{ORG}/{BOOTSTRAP}/actions/runs/\d+$"
    )))
}

#[tokio::test]
async fn test_prune_deletes_runs_beyond_retention() {
    let server = MockServer::start().await;
    let (session, _) = connect(&server).await;
    mount_workflow_runs(&server, 15).await;
    run_delete()
        .respond_with(ResponseTemplate::new(204))
        .expect(3)
        .mount(&server)
        .await;

    assert_eq!(session.delete_old_workflows().await, 3);

    // The three oldest runs go
    let mut deleted: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method.as_str() == "DELETE")
        .map(|r| r.url.path().rsplit('/').next().unwrap().to_string())
        .collect();
    deleted.sort();
    assert_eq!(deleted, vec!["1", "2", "3"]);
}

#[tokio::test]
async fn test_prune_keeps_history_within_retention() {
    let server = MockServer::start().await;
    let (session, _) = connect(&server).await;
    mount_workflow_runs(&server, 12).await;
    run_delete()
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    assert_eq!(session.delete_old_workflows().await, 0);
}

#[tokio::test]
async fn test_prune_without_bootstrap_workflow_is_a_no_op() {
    let server = MockServer::start().await;
    let (session, _) = connect(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("/repos/{ORG}/{BOOTSTRAP}/actions/workflows")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 1,
            "workflows": [{"id": 7, "name": "Bootstrap - poll for repo requests (old)"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"/actions/workflows/\d+/runs$"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    assert_eq!(session.delete_old_workflows().await, 0);
}

#[tokio::test]
async fn test_prune_failure_is_swallowed() {
    let server = MockServer::start().await;
    let (session, _) = connect(&server).await;
    mount_workflow_runs(&server, 15).await;
    run_delete()
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(session.delete_old_workflows().await, 0);
}

// =============================================================================
// Runner groups
// =============================================================================

async fn mount_repo_and_groups(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{ORG}/payments-api")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 555,
            "name": "payments-api",
            "full_name": format!("{ORG}/payments-api")
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/orgs/{ORG}/actions/runner-groups")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 2,
            "runner_groups": [
                {"id": 1, "name": "Default", "visibility": "all"},
                {"id": 4, "name": "linux-large", "visibility": "selected"}
            ]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_runner_group_attach_succeeds() {
    let server = MockServer::start().await;
    let (session, _) = connect(&server).await;
    mount_repo_and_groups(&server).await;

    Mock::given(method("PUT"))
        .and(path(format!(
            "/orgs/{ORG}/actions/runner-groups/4/repositories/555"
        )))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    assert!(
        session
            .add_repo_to_runner_group("payments-api", "linux-large")
            .await
    );
}

#[tokio::test]
async fn test_runner_group_not_found_skips_bind() {
    let server = MockServer::start().await;
    let (session, _) = connect(&server).await;
    mount_repo_and_groups(&server).await;

    Mock::given(method("PUT"))
        .and(path_regex(r"/actions/runner-groups/\d+/repositories/\d+$"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    assert!(
        !session
            .add_repo_to_runner_group("payments-api", "gpu-runners")
            .await
    );
}

#[tokio::test]
async fn test_runner_group_missing_repo_returns_false() {
    let server = MockServer::start().await;
    let (session, _) = connect(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("/repos/{ORG}/ghost")))
        .respond_with(not_found())
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/orgs/{ORG}/actions/runner-groups")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    assert!(!session.add_repo_to_runner_group("ghost", "linux-large").await);
}

#[tokio::test]
async fn test_runner_group_bind_failure_returns_false() {
    let server = MockServer::start().await;
    let (session, _) = connect(&server).await;
    mount_repo_and_groups(&server).await;

    Mock::given(method("PUT"))
        .and(path(format!(
            "/orgs/{ORG}/actions/runner-groups/4/repositories/555"
        )))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "Forbidden"})))
        .expect(1)
        .mount(&server)
        .await;

    assert!(
        !session
            .add_repo_to_runner_group("payments-api", "linux-large")
            .await
    );
}
