//! Request reconciliation: one branch, one descriptor file and one open pull
//! request per request in the bootstrap repository.
//!
//! Re-running with the same request converges on the same state. The branch
//! check and create are not atomic; two processes racing on the same request
//! can both try to create the branch, and the loser fails with a
//! [`ProvisionError::Branch`].

use tracing::{debug, info};

use crate::error::{ApiError, ProvisionError};
use crate::github::{Contents, FileWrite, MergeMethod, NewPullRequest, PullFilter};
use crate::request::{OutputStatus, PrStatus, ProjectRequest};
use crate::session::Session;

/// Branch every request PR targets.
pub const BASE_BRANCH: &str = "main";

impl Session {
    /// Ensure the request's branch, descriptor file and pull request exist
    /// and are current, and record the outcome on the request.
    ///
    /// An existing pull request is left untouched (title, body and auto-merge
    /// state included); only the descriptor on its branch is replaced.
    pub async fn create_update_pr(
        &self,
        mut request: ProjectRequest,
    ) -> Result<ProjectRequest, ProvisionError> {
        let branch = request.branch_name();

        self.ensure_branch(&branch).await?;
        self.write_descriptor(&request, &branch).await?;

        let owner = self.params.org.as_str();
        let repo = self.params.bootstrap_repo.as_str();
        let head = format!("{owner}:{branch}");
        let pr_error = |source| ProvisionError::PullRequest {
            branch: branch.clone(),
            source,
        };

        let open = self
            .client
            .list_pulls(
                owner,
                repo,
                &PullFilter {
                    state: "open",
                    sort: "created",
                    base: BASE_BRANCH,
                    head: &head,
                },
            )
            .await
            .map_err(pr_error)?;
        debug!(branch = %branch, count = open.len(), "Current pulls for branch");

        if let Some(existing) = open.first() {
            info!(branch = %branch, pr_number = existing.number, "PR already exists");
            request.request_github_pr_number = Some(existing.number);
            request.output_status = Some(OutputStatus::Updated);
            request.request_github_pr_status = Some(PrStatus::Updated);
            return Ok(request);
        }

        info!(branch = %branch, "Creating PR");
        let title = format!("Project request for {}", request.github_repo);
        let body = format!("Project request raised for {}", request.github_repo);
        let pr = self
            .client
            .create_pull(
                owner,
                repo,
                &NewPullRequest {
                    title: &title,
                    body: &body,
                    head: &branch,
                    base: BASE_BRANCH,
                },
            )
            .await
            .map_err(pr_error)?;

        self.client
            .enable_auto_merge(&pr.node_id, MergeMethod::Merge)
            .await
            .map_err(pr_error)?;

        info!(branch = %branch, pr_number = pr.number, "Raised PR with auto-merge enabled");
        request.request_github_pr_number = Some(pr.number);
        request.output_status = Some(OutputStatus::New);
        request.request_github_pr_status = Some(PrStatus::Raised);
        Ok(request)
    }

    /// Create `branch` from the tip of `main` unless it already exists.
    async fn ensure_branch(&self, branch: &str) -> Result<(), ProvisionError> {
        let owner = self.params.org.as_str();
        let repo = self.params.bootstrap_repo.as_str();
        let branch_error = |source| ProvisionError::Branch {
            branch: branch.to_string(),
            source,
        };

        let branches = self
            .client
            .list_branches(owner, repo)
            .await
            .map_err(branch_error)?;
        if branches.iter().any(|b| b.name == branch) {
            debug!(branch = %branch, "Branch already exists");
            return Ok(());
        }

        info!(branch = %branch, "Branch not found - creating");
        let base = self
            .client
            .get_branch(owner, repo, BASE_BRANCH)
            .await
            .map_err(branch_error)?;
        self.client
            .create_ref(owner, repo, &format!("refs/heads/{branch}"), &base.commit.sha)
            .await
            .map_err(branch_error)
    }

    /// Replace the descriptor on `branch`, or create it when missing.
    async fn write_descriptor(
        &self,
        request: &ProjectRequest,
        branch: &str,
    ) -> Result<(), ProvisionError> {
        let owner = self.params.org.as_str();
        let repo = self.params.bootstrap_repo.as_str();
        let path = request.descriptor_path();
        let file_name = format!("{branch}.json");
        let descriptor_error = |source| ProvisionError::Descriptor {
            repo: repo.to_string(),
            path: path.clone(),
            source,
        };

        let content = request
            .descriptor_json()
            .map_err(|e| descriptor_error(ApiError::from(e)))?;

        match self.client.get_contents(owner, repo, &path, branch).await {
            Ok(Contents::File(existing)) => {
                let message = format!(
                    "Updating {file_name} with details for {}",
                    request.github_repo
                );
                debug!(path = %existing.path, sha = %existing.sha, "Replacing request file");
                self.client
                    .put_contents(
                        owner,
                        repo,
                        &existing.path,
                        &FileWrite {
                            message: &message,
                            content: &content,
                            sha: Some(&existing.sha),
                            branch: Some(branch),
                        },
                    )
                    .await
                    .map_err(descriptor_error)
            }
            Ok(Contents::Directory) => Err(descriptor_error(ApiError::Unexpected(format!(
                "{path} is a directory"
            )))),
            Err(e) if e.is_not_found() => {
                let message = format!(
                    "Creating requests/{file_name} with details for {}",
                    request.github_repo
                );
                debug!(path = %path, "Creating request file");
                self.client
                    .put_contents(
                        owner,
                        repo,
                        &path,
                        &FileWrite {
                            message: &message,
                            content: &content,
                            sha: None,
                            branch: Some(branch),
                        },
                    )
                    .await
                    .map_err(descriptor_error)
            }
            Err(e) => Err(descriptor_error(e)),
        }
    }
}
