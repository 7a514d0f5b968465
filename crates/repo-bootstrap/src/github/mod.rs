//! GitHub transport: a thin reqwest client over the endpoints provisioning
//! needs, plus their payload types.

mod client;
pub mod models;

pub use client::GitHubClient;
pub use models::{
    Branch, Contents, CreationResponse, FileContent, FileWrite, GenerateRepository, MergeMethod,
    NewPullRequest, NewRepository, Organization, PullFilter, PullRequest, Repository,
    RunnerGroup, Team, Workflow, WorkflowRun,
};
