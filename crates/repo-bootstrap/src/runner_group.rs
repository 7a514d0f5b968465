//! Binding repositories to self-hosted runner groups.

use tracing::{error, info};

use crate::session::Session;

impl Session {
    /// Attach `repo_name` to the org runner group called `runner_group_name`.
    ///
    /// Never fatal: every failure is logged and reported as `false`, so it is
    /// safe to call speculatively. A missing group is not created.
    pub async fn add_repo_to_runner_group(&self, repo_name: &str, runner_group_name: &str) -> bool {
        let org = self.params.org.as_str();

        let repo = match self.client.get_repo(org, repo_name).await {
            Ok(repo) => repo,
            Err(e) => {
                error!(
                    repo = %repo_name,
                    error = %e,
                    "Could not find repo - not trying to add it to the runner group"
                );
                return false;
            }
        };

        let groups = match self.client.list_runner_groups(org).await {
            Ok(groups) => groups,
            Err(e) => {
                error!(org = %org, error = %e, "Unable to get a list of runner groups");
                return false;
            }
        };

        let Some(group) = groups.iter().find(|g| g.name == runner_group_name) else {
            error!(
                runner_group = %runner_group_name,
                repo = %repo_name,
                "Runner group not found - not possible to add repository to runner group"
            );
            return false;
        };

        match self
            .client
            .add_repo_to_runner_group(org, group.id, repo.id)
            .await
        {
            Ok(()) => {
                info!(
                    repo = %repo_name,
                    runner_group = %runner_group_name,
                    runner_group_id = group.id,
                    "Repo added to runner group"
                );
                true
            }
            Err(e) => {
                error!(
                    repo = %repo_name,
                    runner_group = %runner_group_name,
                    error = %e,
                    "Unable to add repository to runner group"
                );
                false
            }
        }
    }
}
