//! Project request records and the descriptor written to the bootstrap repo.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Outcome of a reconciliation, as recorded on the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputStatus {
    New,
    Updated,
}

/// State of the request's pull request, as recorded on the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrStatus {
    Raised,
    Updated,
}

/// Request identifier. Kept in the form the caller sent it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<u64> for RequestId {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

/// A request to provision one repository.
///
/// Allow-listed fields are kept as raw JSON: a key that is present, even as
/// `null`, is `Some` and is written to the descriptor unchanged. Fields
/// outside the allow-list are kept in `extra` so the caller gets its record
/// back intact, but they are never written to the bootstrap repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRequest {
    pub id: RequestId,
    /// Name of the repository to provision
    pub github_repo: String,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub repo_description: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub base_template: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub jira_project_keys: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub github_project_visibility: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub product: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub github_project_teams_write: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub github_projects_teams_admin: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub github_project_branch_protection_restricted_teams: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub prod_alerts_severity_label: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub nonprod_alerts_severity_label: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub slack_channel_nonprod_release_notify: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub slack_channel_prod_release_notify: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub slack_channel_security_scans_notify: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub requester_name: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub requester_email: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub requester_team: Option<Value>,

    /// Set by reconciliation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_status: Option<OutputStatus>,
    /// Set by reconciliation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_github_pr_number: Option<u64>,
    /// Set by reconciliation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_github_pr_status: Option<PrStatus>,

    /// Everything else the caller sent
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Present keys map to `Some`, including an explicit `null`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// The allow-listed subset of a request, in the order it is written.
///
/// Keys the request did not carry are omitted; keys it carried as `null`
/// are written as `null`.
#[derive(Debug, Serialize)]
pub struct RequestDescriptor<'a> {
    pub github_repo: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_description: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_template: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jira_project_keys: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_project_visibility: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_project_teams_write: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_projects_teams_admin: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_project_branch_protection_restricted_teams: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prod_alerts_severity_label: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonprod_alerts_severity_label: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slack_channel_nonprod_release_notify: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slack_channel_prod_release_notify: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slack_channel_security_scans_notify: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester_name: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester_email: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester_team: Option<&'a Value>,
}

impl ProjectRequest {
    /// Branch carrying this request: `REQ_{id}_{repo}`.
    #[must_use]
    pub fn branch_name(&self) -> String {
        branch_name(&self.id.to_string(), &self.github_repo)
    }

    /// Path of the descriptor file inside the bootstrap repository.
    #[must_use]
    pub fn descriptor_path(&self) -> String {
        format!("requests/{}.json", self.branch_name())
    }

    /// Allow-listed view of the request.
    #[must_use]
    pub fn descriptor(&self) -> RequestDescriptor<'_> {
        RequestDescriptor {
            github_repo: &self.github_repo,
            repo_description: self.repo_description.as_ref(),
            base_template: self.base_template.as_ref(),
            jira_project_keys: self.jira_project_keys.as_ref(),
            github_project_visibility: self.github_project_visibility.as_ref(),
            product: self.product.as_ref(),
            github_project_teams_write: self.github_project_teams_write.as_ref(),
            github_projects_teams_admin: self.github_projects_teams_admin.as_ref(),
            github_project_branch_protection_restricted_teams: self
                .github_project_branch_protection_restricted_teams
                .as_ref(),
            prod_alerts_severity_label: self.prod_alerts_severity_label.as_ref(),
            nonprod_alerts_severity_label: self.nonprod_alerts_severity_label.as_ref(),
            slack_channel_nonprod_release_notify: self.slack_channel_nonprod_release_notify.as_ref(),
            slack_channel_prod_release_notify: self.slack_channel_prod_release_notify.as_ref(),
            slack_channel_security_scans_notify: self.slack_channel_security_scans_notify.as_ref(),
            requester_name: self.requester_name.as_ref(),
            requester_email: self.requester_email.as_ref(),
            requester_team: self.requester_team.as_ref(),
        }
    }

    /// Descriptor rendered as 2-space indented JSON.
    pub fn descriptor_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.descriptor())
    }
}

/// `REQ_{id}_{repo}`. The idempotency key for reconciliation.
#[must_use]
pub fn branch_name(id: &str, repo: &str) -> String {
    format!("REQ_{id}_{repo}")
}

/// Input for repository creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSpec {
    pub name: String,
    pub description: String,
    /// Template repository in the same org; `None` creates a blank repo.
    pub template: Option<String>,
}

impl RepoSpec {
    /// Derive creation input from a request. A blank template means blank repo.
    #[must_use]
    pub fn from_request(request: &ProjectRequest) -> Self {
        Self {
            name: request.github_repo.clone(),
            description: request
                .repo_description
                .as_ref()
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            template: request
                .base_template
                .as_ref()
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
        }
    }
}
