//! Error types for repository provisioning.
//!
//! Two layers:
//!
//! - [`ApiError`] is what a single GitHub call can fail with. Callers decide
//!   what to do with it by looking at [`ApiError::kind`].
//! - [`ProvisionError`] is a fatal outcome. Nothing inside the crate tries to
//!   recover from it; it is handed to the top-level caller, which normally
//!   exits the process.

use reqwest::StatusCode;
use thiserror::Error;

/// How a failed GitHub call should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The resource does not exist (HTTP 404).
    NotFound,
    /// Rate limiting, server-side errors and transport hiccups.
    Transient,
    /// Anything else: validation errors, permissions, malformed payloads.
    Fatal,
}

/// Errors from a single GitHub REST or GraphQL call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// GitHub answered with a non-success status
    #[error("GitHub API error: {status} - {message}")]
    Status { status: u16, message: String },

    /// GraphQL call returned an `errors` array
    #[error("GitHub GraphQL error: {0}")]
    GraphQl(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Response was well-formed but not what the endpoint documents
    #[error("Unexpected GitHub response: {0}")]
    Unexpected(String),
}

impl ApiError {
    /// Classify the failure.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Status { status, .. } => match StatusCode::from_u16(*status) {
                Ok(StatusCode::NOT_FOUND) => FailureKind::NotFound,
                Ok(StatusCode::TOO_MANY_REQUESTS) => FailureKind::Transient,
                Ok(code) if code.is_server_error() => FailureKind::Transient,
                _ => FailureKind::Fatal,
            },
            Self::Http(e) if e.is_timeout() || e.is_connect() => FailureKind::Transient,
            Self::Http(e) => match e.status() {
                Some(StatusCode::NOT_FOUND) => FailureKind::NotFound,
                Some(code) if code.is_server_error() => FailureKind::Transient,
                _ => FailureKind::Fatal,
            },
            Self::GraphQl(_) | Self::Serialization(_) | Self::Unexpected(_) => FailureKind::Fatal,
        }
    }

    /// Shorthand for `kind() == FailureKind::NotFound`.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == FailureKind::NotFound
    }

    /// HTTP status code, when GitHub answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Fatal provisioning outcomes.
///
/// Every variant leaves whatever was already written (branch, descriptor
/// file, half-created repository) in place for manual inspection or a re-run.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Organization or bootstrap repository could not be resolved
    #[error("Unable to initialise GitHub session for {org}/{bootstrap_repo}: {source}")]
    Session {
        org: String,
        bootstrap_repo: String,
        #[source]
        source: ApiError,
    },

    /// Request branch could not be listed or created
    #[error("Failed to prepare branch {branch}: {source}")]
    Branch {
        branch: String,
        #[source]
        source: ApiError,
    },

    /// Descriptor file could not be read or written
    #[error("Failed to write {path} in {repo} - please fix this and re-run: {source}")]
    Descriptor {
        repo: String,
        path: String,
        #[source]
        source: ApiError,
    },

    /// Pull request could not be listed, created or set to auto-merge
    #[error("Failed to raise pull request for {branch}: {source}")]
    PullRequest {
        branch: String,
        #[source]
        source: ApiError,
    },

    /// Repository lookup failed with something other than 404
    #[error("Failed to get GitHub repository information for {repo} - please correct this and re-run: {source}")]
    RepoLookup {
        repo: String,
        #[source]
        source: ApiError,
    },

    /// Repository creation did not answer 201
    #[error("Failed to create repository {repo}: {status} - {body}")]
    RepoCreation {
        repo: String,
        status: u16,
        body: String,
    },

    /// README seeding of a blank repository failed
    #[error("Failed to create README.md in {repo} - please correct this and re-run: {source}")]
    Readme {
        repo: String,
        #[source]
        source: ApiError,
    },

    /// Repository never accepted configuration
    #[error("Repository {repo} not ready after {attempts} attempts - please check and re-run")]
    NotReady { repo: String, attempts: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> ApiError {
        ApiError::Status {
            status: code,
            message: "boom".to_string(),
        }
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(status(404).kind(), FailureKind::NotFound);
        assert_eq!(status(429).kind(), FailureKind::Transient);
        assert_eq!(status(502).kind(), FailureKind::Transient);
        assert_eq!(status(422).kind(), FailureKind::Fatal);
        assert_eq!(status(403).kind(), FailureKind::Fatal);
        assert!(status(404).is_not_found());
        assert_eq!(status(409).status(), Some(409));
    }

    #[test]
    fn test_graphql_errors_are_fatal() {
        let err = ApiError::GraphQl("Pull request is in clean status".to_string());
        assert_eq!(err.kind(), FailureKind::Fatal);
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_not_ready_message() {
        let err = ProvisionError::NotReady {
            repo: "payments-api".to_string(),
            attempts: 10,
        };
        assert_eq!(
            err.to_string(),
            "Repository payments-api not ready after 10 attempts - please check and re-run"
        );
    }
}
