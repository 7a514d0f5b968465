//! Housekeeping for the bootstrap repository's polling workflow.

use tracing::{debug, info, warn};

use crate::session::Session;

/// Workflow whose run history is trimmed.
pub const BOOTSTRAP_WORKFLOW_NAME: &str = "Bootstrap - poll for repo requests";

/// Runs kept, newest first.
pub const RUN_RETENTION: usize = 12;

impl Session {
    /// Delete every run of the bootstrap workflow beyond the newest
    /// [`RUN_RETENTION`]. Best effort: failures are logged and the pass stops.
    ///
    /// Returns how many runs were deleted.
    pub async fn delete_old_workflows(&self) -> usize {
        let owner = self.params.org.as_str();
        let repo = self.params.bootstrap_repo.as_str();

        let workflows = match self.client.list_workflows(owner, repo).await {
            Ok(workflows) => workflows,
            Err(e) => {
                warn!(repo = %repo, error = %e, "Encountered an issue listing workflows");
                return 0;
            }
        };

        let Some(workflow) = workflows
            .into_iter()
            .find(|w| w.name == BOOTSTRAP_WORKFLOW_NAME)
        else {
            debug!(repo = %repo, "Bootstrap workflow not found, nothing to prune");
            return 0;
        };

        let runs = match self.client.list_workflow_runs(owner, repo, workflow.id).await {
            Ok(runs) => runs,
            Err(e) => {
                warn!(
                    repo = %repo,
                    workflow = %workflow.name,
                    error = %e,
                    "Encountered an issue listing workflow runs"
                );
                return 0;
            }
        };

        if runs.len() <= RUN_RETENTION {
            debug!(workflow = %workflow.name, runs = runs.len(), "Run history within retention");
            return 0;
        }

        debug!(
            workflow = %workflow.name,
            runs = runs.len(),
            keep = RUN_RETENTION,
            "Cropping workflow run history"
        );

        let mut deleted = 0;
        for run in &runs[RUN_RETENTION..] {
            if let Err(e) = self.client.delete_workflow_run(owner, repo, run.id).await {
                warn!(
                    repo = %repo,
                    run_id = run.id,
                    error = %e,
                    "Encountered an issue removing old workflow runs"
                );
                break;
            }
            deleted += 1;
        }

        info!(workflow = %workflow.name, deleted, "Pruned old workflow runs");
        deleted
    }
}
