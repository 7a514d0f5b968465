//! Session context shared by every provisioning operation.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::config::GithubParams;
use crate::error::ProvisionError;
use crate::github::{GitHubClient, Organization, Repository};
use crate::provision::{ReadinessPolicy, Sleeper, TokioSleeper};

/// Organization identity, credentials and the bootstrap repository.
///
/// Built once per process with [`Session::connect`]; the reconciler,
/// provisioner, pruner and runner-group attacher are methods on it.
pub struct Session {
    pub(crate) params: GithubParams,
    pub(crate) client: GitHubClient,
    org: Organization,
    bootstrap_repo: Repository,
    pub(crate) team_slugs: Option<BTreeSet<String>>,
    pub(crate) readiness: ReadinessPolicy,
    pub(crate) sleeper: Arc<dyn Sleeper>,
}

impl Session {
    /// Authenticate and resolve the organization and bootstrap repository.
    ///
    /// Any failure is fatal: nothing else can run without this context.
    pub async fn connect(params: GithubParams) -> Result<Self, ProvisionError> {
        let session_error = |source| ProvisionError::Session {
            org: params.org.clone(),
            bootstrap_repo: params.bootstrap_repo.clone(),
            source,
        };

        let client = GitHubClient::from_params(&params).map_err(session_error)?;
        let org = client.get_org(&params.org).await.map_err(session_error)?;
        let bootstrap_repo = client
            .get_repo(&params.org, &params.bootstrap_repo)
            .await
            .map_err(session_error)?;

        debug!(
            org = %org.login,
            bootstrap_repo = %bootstrap_repo.full_name,
            "Initialised GitHub session"
        );

        Ok(Self {
            params,
            client,
            org,
            bootstrap_repo,
            team_slugs: None,
            readiness: ReadinessPolicy::default(),
            sleeper: Arc::new(TokioSleeper),
        })
    }

    /// Override the readiness poll used after repository creation.
    #[must_use]
    pub fn with_readiness(mut self, policy: ReadinessPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        debug!(
            max_attempts = policy.max_attempts,
            delay = ?policy.delay,
            "Using custom readiness poll"
        );
        self.readiness = policy;
        self.sleeper = sleeper;
        self
    }

    /// Organization login as configured.
    #[must_use]
    pub fn org_name(&self) -> &str {
        &self.params.org
    }

    #[must_use]
    pub fn org(&self) -> &Organization {
        &self.org
    }

    #[must_use]
    pub fn bootstrap_repo(&self) -> &Repository {
        &self.bootstrap_repo
    }

    #[must_use]
    pub fn client(&self) -> &GitHubClient {
        &self.client
    }

    #[must_use]
    pub fn params(&self) -> &GithubParams {
        &self.params
    }
}
