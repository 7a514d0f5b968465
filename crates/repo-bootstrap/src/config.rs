//! GitHub connection parameters.

use std::fmt;

use thiserror::Error;

/// Default GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const ENV_BOOTSTRAP_REPO: &str = "GITHUB_BOOTSTRAP_REPO";
const ENV_ORG: &str = "GITHUB_ORG";
const ENV_ACCESS_TOKEN: &str = "GITHUB_ACCESS_TOKEN";
const ENV_API_URL: &str = "GITHUB_API_URL";
const ENV_GRAPHQL_URL: &str = "GITHUB_GRAPHQL_URL";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required value is missing or empty
    #[error("Missing required configuration: {0}")]
    Missing(&'static str),
}

/// Credentials and coordinates for the bootstrap repository.
#[derive(Clone)]
pub struct GithubParams {
    /// Name of the bootstrap repository (without the org prefix)
    pub bootstrap_repo: String,
    /// Organization login
    pub org: String,
    /// Personal access token or app installation token
    pub access_token: String,
    /// REST base URL, `https://api.github.com` unless overridden
    pub api_url: String,
    /// GraphQL endpoint, derived from `api_url` unless overridden
    pub graphql_url: String,
}

/// GraphQL endpoint for a REST root.
///
/// GitHub Enterprise Server serves REST under `/api/v3` and GraphQL at
/// `/api/graphql`; github.com serves GraphQL at `{api_url}/graphql`.
#[must_use]
pub fn graphql_url_for(api_url: &str) -> String {
    let api_url = api_url.trim_end_matches('/');
    match api_url.strip_suffix("/api/v3") {
        Some(host) => format!("{host}/api/graphql"),
        None => format!("{api_url}/graphql"),
    }
}

impl GithubParams {
    /// Build params, rejecting empty values.
    pub fn new(
        bootstrap_repo: impl Into<String>,
        org: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let params = Self {
            bootstrap_repo: bootstrap_repo.into(),
            org: org.into(),
            access_token: access_token.into(),
            api_url: DEFAULT_API_URL.to_string(),
            graphql_url: graphql_url_for(DEFAULT_API_URL),
        };
        params.validate()?;
        Ok(params)
    }

    /// Load params from `GITHUB_BOOTSTRAP_REPO`, `GITHUB_ORG`,
    /// `GITHUB_ACCESS_TOKEN` and optionally `GITHUB_API_URL` and
    /// `GITHUB_GRAPHQL_URL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let read = |key: &'static str| {
            std::env::var(key)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let params = Self::new(read(ENV_BOOTSTRAP_REPO)?, read(ENV_ORG)?, read(ENV_ACCESS_TOKEN)?)?;
        let params = match std::env::var(ENV_API_URL) {
            Ok(url) if !url.trim().is_empty() => params.with_api_url(url),
            _ => params,
        };
        Ok(match std::env::var(ENV_GRAPHQL_URL) {
            Ok(url) if !url.trim().is_empty() => params.with_graphql_url(url),
            _ => params,
        })
    }

    /// Point the client at a different API root (GitHub Enterprise, tests).
    ///
    /// Also resets the GraphQL endpoint to the one derived from `api_url`.
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self.graphql_url = graphql_url_for(&self.api_url);
        self
    }

    /// Use an explicit GraphQL endpoint.
    #[must_use]
    pub fn with_graphql_url(mut self, graphql_url: impl Into<String>) -> Self {
        self.graphql_url = graphql_url.into().trim_end_matches('/').to_string();
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.bootstrap_repo.trim().is_empty() {
            return Err(ConfigError::Missing("github_bootstrap_repo"));
        }
        if self.org.trim().is_empty() {
            return Err(ConfigError::Missing("github_org"));
        }
        if self.access_token.trim().is_empty() {
            return Err(ConfigError::Missing("github_access_token"));
        }
        Ok(())
    }
}

impl fmt::Debug for GithubParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubParams")
            .field("bootstrap_repo", &self.bootstrap_repo)
            .field("org", &self.org)
            .field("access_token", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("graphql_url", &self.graphql_url)
            .finish()
    }
}
