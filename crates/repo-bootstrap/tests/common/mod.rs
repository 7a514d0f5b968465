//! Shared fixtures for the wiremock-backed tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use repo_bootstrap::{GithubParams, ReadinessPolicy, Session, Sleeper};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ORG: &str = "acme";
pub const BOOTSTRAP: &str = "bootstrap";

/// Sleeper that records requested delays without waiting.
#[derive(Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn calls(&self) -> usize {
        self.slept.lock().unwrap().len()
    }

    pub fn total(&self) -> Duration {
        self.slept.lock().unwrap().iter().sum()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

pub fn params(server: &MockServer) -> GithubParams {
    GithubParams::new(BOOTSTRAP, ORG, "test-token")
        .unwrap()
        .with_api_url(server.uri())
}

/// Mount the two lookups `Session::connect` performs.
pub async fn mount_session(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("/orgs/{ORG}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "login": ORG
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/repos/{ORG}/{BOOTSTRAP}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 100,
            "name": BOOTSTRAP,
            "full_name": format!("{ORG}/{BOOTSTRAP}"),
            "default_branch": "main"
        })))
        .mount(server)
        .await;
}

/// Connected session using the default readiness policy and a recording sleeper.
pub async fn connect(server: &MockServer) -> (Session, Arc<RecordingSleeper>) {
    connect_with(server, ReadinessPolicy::default()).await
}

pub async fn connect_with(
    server: &MockServer,
    policy: ReadinessPolicy,
) -> (Session, Arc<RecordingSleeper>) {
    mount_session(server).await;
    let sleeper = Arc::new(RecordingSleeper::default());
    let session = Session::connect(params(server))
        .await
        .unwrap()
        .with_readiness(policy, sleeper.clone());
    (session, sleeper)
}

pub fn not_found() -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(json!({
        "message": "Not Found",
        "documentation_url": "https://docs.github.com/rest"
    }))
}
