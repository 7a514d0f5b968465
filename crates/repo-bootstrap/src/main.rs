//! repo-bootstrap CLI - raise project request PRs and provision repositories.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use repo_bootstrap::config::DEFAULT_API_URL;
use repo_bootstrap::{GithubParams, ProjectRequest, RepoSpec, Session};

/// repo-bootstrap - GitHub repository provisioning via a bootstrap repository.
#[derive(Parser)]
#[command(name = "repo-bootstrap")]
#[command(about = "Provision GitHub repositories from project requests")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(flatten)]
    github: GithubArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GithubArgs {
    /// Organization owning the bootstrap repository
    #[arg(long, env = "GITHUB_ORG", global = true)]
    org: Option<String>,

    /// Bootstrap repository name (without org)
    #[arg(long, env = "GITHUB_BOOTSTRAP_REPO", global = true)]
    bootstrap_repo: Option<String>,

    /// Access token
    #[arg(long, env = "GITHUB_ACCESS_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// GitHub REST API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL, global = true)]
    api_url: String,

    /// GitHub GraphQL endpoint (derived from the API URL when omitted)
    #[arg(long, env = "GITHUB_GRAPHQL_URL", global = true)]
    graphql_url: Option<String>,
}

impl GithubArgs {
    fn params(&self) -> Result<GithubParams> {
        let params = GithubParams::new(
            self.bootstrap_repo.clone().unwrap_or_default(),
            self.org.clone().unwrap_or_default(),
            self.token.clone().unwrap_or_default(),
        )
        .context("GitHub connection is not configured")?
        .with_api_url(&self.api_url);
        Ok(match &self.graphql_url {
            Some(url) => params.with_graphql_url(url),
            None => params,
        })
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create or update the bootstrap PR for a project request
    Request {
        /// Project request JSON file
        #[arg(long)]
        file: PathBuf,

        /// Where to write the updated request (stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Create a repository in the organization
    CreateRepo {
        /// Repository name
        #[arg(long)]
        name: String,

        /// Repository description
        #[arg(long, default_value = "")]
        description: String,

        /// Template repository in the same organization
        #[arg(long)]
        template: Option<String>,
    },

    /// Create the repository a project request describes, if missing
    Provision {
        /// Project request JSON file
        #[arg(long)]
        file: PathBuf,

        /// Runner group to attach the repository to
        #[arg(long)]
        runner_group: Option<String>,
    },

    /// Attach a repository to a self-hosted runner group
    RunnerGroup {
        /// Repository name
        #[arg(long)]
        repo: String,

        /// Runner group name
        #[arg(long)]
        group: String,
    },

    /// Trim the bootstrap polling workflow's run history
    PruneWorkflows,

    /// List team slugs in the organization
    Teams,
}

fn init_tracing(verbose: bool, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            std::env::var("LOG_LEVEL")
                .map_err(|e| e.to_string())
                .and_then(|level| {
                    EnvFilter::try_new(level.to_lowercase()).map_err(|e| e.to_string())
                })
        })
        .unwrap_or_else(|_| {
            if verbose {
                EnvFilter::new("repo_bootstrap=debug,info")
            } else {
                EnvFilter::new("repo_bootstrap=info,warn")
            }
        });

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

fn read_request(path: &Path) -> Result<ProjectRequest> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read request file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse request file {}", path.display()))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Provisioning failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let params = cli.github.params()?;
    let mut session = Session::connect(params).await?;

    match cli.command {
        Commands::Request { file, output } => {
            let request = read_request(&file)?;
            tracing::info!(id = %request.id, repo = %request.github_repo, "Reconciling project request");
            let request = session.create_update_pr(request).await?;

            let rendered = serde_json::to_string_pretty(&request)?;
            match output {
                Some(path) => std::fs::write(&path, rendered)
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => println!("{rendered}"),
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::CreateRepo {
            name,
            description,
            template,
        } => {
            let spec = RepoSpec {
                name,
                description,
                template,
            };
            session.create_repo(&spec).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Provision { file, runner_group } => {
            let request = read_request(&file)?;
            let spec = RepoSpec::from_request(&request);

            if session.repo_exists(&spec.name).await? {
                tracing::info!(repo = %spec.name, "Repository already exists, skipping creation");
            } else {
                session.create_repo(&spec).await?;
            }

            if let Some(group) = runner_group {
                if !session.add_repo_to_runner_group(&spec.name, &group).await {
                    return Ok(ExitCode::from(2));
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::RunnerGroup { repo, group } => {
            if session.add_repo_to_runner_group(&repo, &group).await {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(2))
            }
        }
        Commands::PruneWorkflows => {
            let deleted = session.delete_old_workflows().await;
            println!("Deleted {deleted} workflow runs");
            Ok(ExitCode::SUCCESS)
        }
        Commands::Teams => {
            if !session.load_teams().await {
                return Ok(ExitCode::FAILURE);
            }
            for slug in session.team_slugs().into_iter().flatten() {
                println!("{slug}");
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
