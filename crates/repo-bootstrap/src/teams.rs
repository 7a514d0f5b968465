//! Team directory.

use std::collections::BTreeSet;

use tracing::{debug, error};

use crate::session::Session;

impl Session {
    /// Load the slugs of every team in the organization.
    ///
    /// Returns `false` (and logs) when the directory cannot be read; the
    /// previously loaded slugs, if any, are kept.
    pub async fn load_teams(&mut self) -> bool {
        match self.client.list_teams(&self.params.org).await {
            Ok(teams) => {
                let slugs: BTreeSet<String> = teams.into_iter().map(|t| t.slug).collect();
                debug!(count = slugs.len(), "Loaded list of team slugs");
                self.team_slugs = Some(slugs);
                true
            }
            Err(e) => {
                error!(org = %self.params.org, error = %e, "Unable to load GitHub teams");
                false
            }
        }
    }

    /// Team slugs from the last successful [`Session::load_teams`].
    #[must_use]
    pub fn team_slugs(&self) -> Option<&BTreeSet<String>> {
        self.team_slugs.as_ref()
    }

    /// Whether `slug` names a team in the organization. `None` until loaded.
    #[must_use]
    pub fn has_team(&self, slug: &str) -> Option<bool> {
        self.team_slugs.as_ref().map(|slugs| slugs.contains(slug))
    }
}
