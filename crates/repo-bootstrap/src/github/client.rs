//! GitHub REST/GraphQL client for the provisioning endpoints.

use std::time::Duration;

use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument};

use super::models::{
    Branch, Contents, ContentsResponse, CreateRef, CreationResponse, FileWrite, GenerateRepository,
    GitHubErrorBody, GraphQlResponse, MergeMethod, NewPullRequest, NewRepository, Organization,
    PullFilter, PullRequest, PutContents, Repository, RunnerGroup, RunnerGroupPage, Team,
    Workflow, WorkflowPage, WorkflowRun, WorkflowRunPage,
};
use crate::config::{graphql_url_for, GithubParams};
use crate::error::ApiError;

const PER_PAGE: usize = 100;

const ENABLE_AUTO_MERGE: &str = "mutation($pullRequestId: ID!, $mergeMethod: PullRequestMergeMethod!) {
  enablePullRequestAutoMerge(input: {pullRequestId: $pullRequestId, mergeMethod: $mergeMethod}) {
    clientMutationId
  }
}";

/// Percent-encode each segment of a repository path, keeping `/` separators.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

/// GitHub API client.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    api_url: String,
    graphql_url: String,
    token: String,
}

impl GitHubClient {
    /// Create a new GitHub client. The GraphQL endpoint is derived from
    /// `api_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(token: &str, api_url: &str) -> Result<Self, ApiError> {
        Self::with_endpoints(token, api_url, &graphql_url_for(api_url))
    }

    /// Create a client with explicit REST and GraphQL endpoints.
    pub fn with_endpoints(token: &str, api_url: &str, graphql_url: &str) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("repo-bootstrap/1.0"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            graphql_url: graphql_url.to_string(),
            token: token.to_string(),
        })
    }

    /// Create a client from connection params.
    pub fn from_params(params: &GithubParams) -> Result<Self, ApiError> {
        Self::with_endpoints(&params.access_token, &params.api_url, &params.graphql_url)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(AUTHORIZATION, format!("Bearer {}", self.token))
    }

    /// Send a request and turn any non-2xx answer into [`ApiError::Status`].
    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = self.authorized(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GitHubErrorBody>(&body)
            .map(|e| e.message)
            .unwrap_or(body);
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(self.client.get(self.url(path))).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch every page of a list endpoint.
    ///
    /// `extract` pulls the items out of one page (some endpoints wrap the list
    /// in an object). Stops at the first short page.
    async fn get_all_pages<P, T, F>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        extract: F,
    ) -> Result<Vec<T>, ApiError>
    where
        P: DeserializeOwned,
        F: Fn(P) -> Vec<T>,
    {
        let mut items = Vec::new();
        let per_page = PER_PAGE.to_string();
        let mut page = 1_u32;

        loop {
            let page_str = page.to_string();
            let request = self
                .client
                .get(self.url(path))
                .query(query)
                .query(&[("per_page", per_page.as_str()), ("page", page_str.as_str())]);
            let body = self.send(request).await?.text().await?;
            let batch = extract(serde_json::from_str(&body)?);
            let fetched = batch.len();
            items.extend(batch);

            if fetched < PER_PAGE {
                break;
            }
            page += 1;
        }

        debug!(path = %path, count = items.len(), "Fetched paginated list");
        Ok(items)
    }

    async fn post_for_status<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<CreationResponse, ApiError> {
        let response = self
            .authorized(self.client.post(self.url(path)).json(body))
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok(CreationResponse { status, body })
    }

    // ------------------------------------------------------------------
    // Organizations, repositories, teams
    // ------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn get_org(&self, org: &str) -> Result<Organization, ApiError> {
        self.get_json(&format!("/orgs/{org}")).await
    }

    #[instrument(skip(self))]
    pub async fn get_repo(&self, owner: &str, repo: &str) -> Result<Repository, ApiError> {
        self.get_json(&format!("/repos/{owner}/{repo}")).await
    }

    #[instrument(skip(self))]
    pub async fn list_teams(&self, org: &str) -> Result<Vec<Team>, ApiError> {
        self.get_all_pages(&format!("/orgs/{org}/teams"), &[], |page: Vec<Team>| page)
            .await
    }

    // ------------------------------------------------------------------
    // Branches and contents
    // ------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn list_branches(&self, owner: &str, repo: &str) -> Result<Vec<Branch>, ApiError> {
        self.get_all_pages(
            &format!("/repos/{owner}/{repo}/branches"),
            &[],
            |page: Vec<Branch>| page,
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn get_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<Branch, ApiError> {
        let branch = urlencoding::encode(branch);
        self.get_json(&format!("/repos/{owner}/{repo}/branches/{branch}"))
            .await
    }

    /// Create `ref_name` (fully qualified, e.g. `refs/heads/x`) at `sha`.
    #[instrument(skip(self))]
    pub async fn create_ref(
        &self,
        owner: &str,
        repo: &str,
        ref_name: &str,
        sha: &str,
    ) -> Result<(), ApiError> {
        let body = CreateRef { ref_name, sha };
        self.send(
            self.client
                .post(self.url(&format!("/repos/{owner}/{repo}/git/refs")))
                .json(&body),
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_contents(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<Contents, ApiError> {
        let request = self
            .client
            .get(self.url(&format!(
                "/repos/{owner}/{repo}/contents/{}",
                encode_path(path)
            )))
            .query(&[("ref", git_ref)]);
        let body = self.send(request).await?.text().await?;

        Ok(match serde_json::from_str(&body)? {
            ContentsResponse::File(file) => Contents::File(file),
            ContentsResponse::Directory(_) => Contents::Directory,
        })
    }

    /// Create or replace a file. Set `write.sha` to replace.
    #[instrument(skip(self, write), fields(branch = ?write.branch, replace = write.sha.is_some()))]
    pub async fn put_contents(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        write: &FileWrite<'_>,
    ) -> Result<(), ApiError> {
        let body = PutContents {
            message: write.message,
            content: base64::engine::general_purpose::STANDARD.encode(write.content),
            sha: write.sha,
            branch: write.branch,
        };
        let url = self.url(&format!(
            "/repos/{owner}/{repo}/contents/{}",
            encode_path(path)
        ));
        self.send(self.client.put(url).json(&body)).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Pull requests
    // ------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn list_pulls(
        &self,
        owner: &str,
        repo: &str,
        filter: &PullFilter<'_>,
    ) -> Result<Vec<PullRequest>, ApiError> {
        self.get_all_pages(
            &format!("/repos/{owner}/{repo}/pulls"),
            &[
                ("state", filter.state),
                ("sort", filter.sort),
                ("base", filter.base),
                ("head", filter.head),
            ],
            |page: Vec<PullRequest>| page,
        )
        .await
    }

    #[instrument(skip(self, pull), fields(head = %pull.head, base = %pull.base))]
    pub async fn create_pull(
        &self,
        owner: &str,
        repo: &str,
        pull: &NewPullRequest<'_>,
    ) -> Result<PullRequest, ApiError> {
        let response = self
            .send(
                self.client
                    .post(self.url(&format!("/repos/{owner}/{repo}/pulls")))
                    .json(pull),
            )
            .await?;
        Ok(serde_json::from_str(&response.text().await?)?)
    }

    /// Enable auto-merge through GraphQL (REST has no equivalent).
    #[instrument(skip(self))]
    pub async fn enable_auto_merge(
        &self,
        pull_request_node_id: &str,
        merge_method: MergeMethod,
    ) -> Result<(), ApiError> {
        let body = serde_json::json!({
            "query": ENABLE_AUTO_MERGE,
            "variables": {
                "pullRequestId": pull_request_node_id,
                "mergeMethod": merge_method,
            },
        });
        let response = self
            .send(self.client.post(&self.graphql_url).json(&body))
            .await?;
        let parsed: GraphQlResponse = serde_json::from_str(&response.text().await?)?;

        if parsed.errors.is_empty() {
            Ok(())
        } else {
            let messages: Vec<String> = parsed.errors.into_iter().map(|e| e.message).collect();
            Err(ApiError::GraphQl(messages.join("; ")))
        }
    }

    // ------------------------------------------------------------------
    // Actions workflows
    // ------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn list_workflows(&self, owner: &str, repo: &str) -> Result<Vec<Workflow>, ApiError> {
        self.get_all_pages(
            &format!("/repos/{owner}/{repo}/actions/workflows"),
            &[],
            |page: WorkflowPage| page.workflows,
        )
        .await
    }

    /// Runs of a workflow, newest first as returned by GitHub.
    #[instrument(skip(self))]
    pub async fn list_workflow_runs(
        &self,
        owner: &str,
        repo: &str,
        workflow_id: u64,
    ) -> Result<Vec<WorkflowRun>, ApiError> {
        self.get_all_pages(
            &format!("/repos/{owner}/{repo}/actions/workflows/{workflow_id}/runs"),
            &[],
            |page: WorkflowRunPage| page.workflow_runs,
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn delete_workflow_run(
        &self,
        owner: &str,
        repo: &str,
        run_id: u64,
    ) -> Result<(), ApiError> {
        self.send(
            self.client
                .delete(self.url(&format!("/repos/{owner}/{repo}/actions/runs/{run_id}"))),
        )
        .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Repository creation and settings
    // ------------------------------------------------------------------

    #[instrument(skip(self, body), fields(name = %body.name))]
    pub async fn generate_from_template(
        &self,
        template_owner: &str,
        template: &str,
        body: &GenerateRepository<'_>,
    ) -> Result<CreationResponse, ApiError> {
        self.post_for_status(&format!("/repos/{template_owner}/{template}/generate"), body)
            .await
    }

    #[instrument(skip(self, body), fields(name = %body.name))]
    pub async fn create_org_repo(
        &self,
        org: &str,
        body: &NewRepository<'_>,
    ) -> Result<CreationResponse, ApiError> {
        self.post_for_status(&format!("/orgs/{org}/repos"), body)
            .await
    }

    #[instrument(skip(self))]
    pub async fn set_default_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<(), ApiError> {
        let body = serde_json::json!({ "default_branch": branch });
        self.send(
            self.client
                .patch(self.url(&format!("/repos/{owner}/{repo}")))
                .json(&body),
        )
        .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Runner groups
    // ------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn list_runner_groups(&self, org: &str) -> Result<Vec<RunnerGroup>, ApiError> {
        self.get_all_pages(
            &format!("/orgs/{org}/actions/runner-groups"),
            &[],
            |page: RunnerGroupPage| page.runner_groups,
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn add_repo_to_runner_group(
        &self,
        org: &str,
        runner_group_id: u64,
        repo_id: u64,
    ) -> Result<(), ApiError> {
        self.send(self.client.put(self.url(&format!(
            "/orgs/{org}/actions/runner-groups/{runner_group_id}/repositories/{repo_id}"
        ))))
        .await?;
        Ok(())
    }
}
