//! GitHub repository provisioning driven by project requests.
//!
//! Each request lands in a *bootstrap repository* as a branch
//! (`REQ_{id}_{repo}`) holding a JSON descriptor, with one open pull request
//! set to auto-merge. Separately, the crate can create the requested
//! repository (from a template or blank), wait for GitHub to make it
//! configurable, attach it to a self-hosted runner group and trim old runs of
//! the bootstrap polling workflow.
//!
//! # Usage
//!
//! ```no_run
//! use repo_bootstrap::{GithubParams, ProjectRequest, RepoSpec, Session};
//!
//! # async fn run(request: ProjectRequest) -> Result<(), Box<dyn std::error::Error>> {
//! let params = GithubParams::from_env()?;
//! let session = Session::connect(params).await?;
//!
//! let request = session.create_update_pr(request).await?;
//! if !session.repo_exists(&request.github_repo).await? {
//!     session.create_repo(&RepoSpec::from_request(&request)).await?;
//! }
//! session.add_repo_to_runner_group(&request.github_repo, "linux-runners").await;
//! session.delete_old_workflows().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Errors
//!
//! Operations that cannot leave the bootstrap repository in a safe state
//! return [`ProvisionError`] and attempt no cleanup. Housekeeping and
//! speculative operations log and report through their return value instead.

pub mod config;
pub mod error;
pub mod github;
pub mod provision;
pub mod reconcile;
pub mod request;
pub mod runner_group;
pub mod session;
pub mod teams;
pub mod workflows;

pub use config::{ConfigError, GithubParams};
pub use error::{ApiError, FailureKind, ProvisionError};
pub use provision::{ReadinessPolicy, Sleeper, TokioSleeper};
pub use request::{branch_name, OutputStatus, PrStatus, ProjectRequest, RepoSpec, RequestId};
pub use session::Session;
