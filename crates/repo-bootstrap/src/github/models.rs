//! GitHub API payloads (only the fields this crate reads or sends).

use serde::{Deserialize, Serialize};

/// Organization
#[derive(Debug, Clone, Deserialize)]
pub struct Organization {
    pub id: u64,
    pub login: String,
}

/// Repository
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub default_branch: Option<String>,
}

/// Team
#[derive(Debug, Clone, Deserialize)]
pub struct Team {
    pub id: u64,
    pub slug: String,
}

/// Commit pointer on a branch
#[derive(Debug, Clone, Deserialize)]
pub struct BranchCommit {
    pub sha: String,
}

/// Branch
#[derive(Debug, Clone, Deserialize)]
pub struct Branch {
    pub name: String,
    pub commit: BranchCommit,
}

/// Body for `POST /repos/{owner}/{repo}/git/refs`
#[derive(Debug, Serialize)]
pub(crate) struct CreateRef<'a> {
    #[serde(rename = "ref")]
    pub ref_name: &'a str,
    pub sha: &'a str,
}

/// A file returned by the contents API
#[derive(Debug, Clone, Deserialize)]
pub struct FileContent {
    pub path: String,
    pub sha: String,
}

/// Result of looking a path up with the contents API
#[derive(Debug, Clone)]
pub enum Contents {
    File(FileContent),
    /// The path is a directory; GitHub answers with a listing
    Directory,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ContentsResponse {
    Directory(Vec<serde_json::Value>),
    File(FileContent),
}

/// A file create-or-replace on a branch.
#[derive(Debug, Clone)]
pub struct FileWrite<'a> {
    pub message: &'a str,
    /// Plain file body; encoded by the client
    pub content: &'a str,
    /// Blob sha of the file being replaced; `None` creates the file
    pub sha: Option<&'a str>,
    /// Target branch; `None` means the default branch
    pub branch: Option<&'a str>,
}

/// Body for `PUT /repos/{owner}/{repo}/contents/{path}`
#[derive(Debug, Serialize)]
pub(crate) struct PutContents<'a> {
    pub message: &'a str,
    /// Base64-encoded file body
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<&'a str>,
}

/// Pull request
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    /// GraphQL node id, needed for auto-merge
    pub node_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// Filter for listing pull requests
#[derive(Debug, Clone)]
pub struct PullFilter<'a> {
    pub state: &'a str,
    pub sort: &'a str,
    pub base: &'a str,
    /// `{owner}:{branch}`
    pub head: &'a str,
}

/// Body for `POST /repos/{owner}/{repo}/pulls`
#[derive(Debug, Serialize)]
pub struct NewPullRequest<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub head: &'a str,
    pub base: &'a str,
}

/// Auto-merge strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MergeMethod {
    Merge,
    Squash,
    Rebase,
}

/// Actions workflow
#[derive(Debug, Clone, Deserialize)]
pub struct Workflow {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WorkflowPage {
    pub workflows: Vec<Workflow>,
}

/// Actions workflow run
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRun {
    pub id: u64,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WorkflowRunPage {
    pub workflow_runs: Vec<WorkflowRun>,
}

/// Body for `POST /repos/{owner}/{template}/generate`
#[derive(Debug, Serialize)]
pub struct GenerateRepository<'a> {
    pub owner: &'a str,
    pub name: &'a str,
    pub description: &'a str,
}

/// Body for `POST /orgs/{org}/repos`
#[derive(Debug, Serialize)]
pub struct NewRepository<'a> {
    pub name: &'a str,
    pub description: &'a str,
}

/// Raw answer to a repository creation call.
///
/// Creation is judged on the exact status code, so the client hands it back
/// instead of turning non-2xx into an error.
#[derive(Debug, Clone)]
pub struct CreationResponse {
    pub status: u16,
    pub body: String,
}

impl CreationResponse {
    #[must_use]
    pub fn is_created(&self) -> bool {
        self.status == 201
    }
}

/// Self-hosted runner group
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerGroup {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RunnerGroupPage {
    #[serde(default)]
    pub runner_groups: Vec<RunnerGroup>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GitHubErrorBody {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlResponse {
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}
