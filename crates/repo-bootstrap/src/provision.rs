//! Repository creation and the readiness poll that follows it.
//!
//! GitHub does not make a freshly created repository configurable right
//! away. After creation the default branch is set to `main` repeatedly, with
//! a fixed delay before every attempt, until GitHub accepts it or the attempt
//! budget runs out.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::error::ProvisionError;
use crate::github::{FileWrite, GenerateRepository, NewRepository};
use crate::reconcile::BASE_BRANCH;
use crate::request::RepoSpec;
use crate::session::Session;

/// Something that can wait. Injected so tests do not sleep for real.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Bounded retry with a fixed delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub max_attempts: u32,
    /// Wait before each attempt
    pub delay: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            delay: Duration::from_secs(5),
        }
    }
}

impl ReadinessPolicy {
    /// Run `attempt` until it succeeds or the budget is spent.
    ///
    /// Every error counts as "not ready yet". Returns the 1-based attempt
    /// that succeeded, or `None` once `max_attempts` attempts have failed.
    pub async fn poll<F, Fut, E>(&self, sleeper: &dyn Sleeper, mut attempt: F) -> Option<u32>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Display,
    {
        for n in 1..=self.max_attempts {
            sleeper.sleep(self.delay).await;
            match attempt(n).await {
                Ok(()) => return Some(n),
                Err(e) => debug!(attempt = n, error = %e, "Repository not ready yet"),
            }
        }
        None
    }
}

impl Session {
    /// Whether `repo_name` exists in the organization.
    ///
    /// A 404 means no; any other failure is fatal.
    pub async fn repo_exists(&self, repo_name: &str) -> Result<bool, ProvisionError> {
        match self.client.get_repo(&self.params.org, repo_name).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(source) => Err(ProvisionError::RepoLookup {
                repo: repo_name.to_string(),
                source,
            }),
        }
    }

    /// Create a repository, from a template when `spec.template` is set,
    /// otherwise blank with a seeded README, then wait until it accepts
    /// configuration.
    ///
    /// Creation is not retried: a rejected call is usually a name clash or
    /// a permission problem.
    pub async fn create_repo(&self, spec: &RepoSpec) -> Result<(), ProvisionError> {
        let org = self.params.org.as_str();
        let creation_error = |e: crate::error::ApiError| ProvisionError::RepoCreation {
            repo: spec.name.clone(),
            status: e.status().unwrap_or_default(),
            body: e.to_string(),
        };

        let response = if let Some(template) = &spec.template {
            info!(repo = %spec.name, template = %template, "Creating repository from template");
            self.client
                .generate_from_template(
                    org,
                    template,
                    &GenerateRepository {
                        owner: org,
                        name: &spec.name,
                        description: &spec.description,
                    },
                )
                .await
                .map_err(creation_error)?
        } else {
            info!(repo = %spec.name, "Creating blank repository");
            self.client
                .create_org_repo(
                    org,
                    &NewRepository {
                        name: &spec.name,
                        description: &spec.description,
                    },
                )
                .await
                .map_err(creation_error)?
        };

        if !response.is_created() {
            error!(
                repo = %spec.name,
                status = response.status,
                body = %response.body,
                "Failed to create repository"
            );
            return Err(ProvisionError::RepoCreation {
                repo: spec.name.clone(),
                status: response.status,
                body: response.body,
            });
        }
        info!(repo = %spec.name, "Repository created successfully");

        if spec.template.is_none() {
            self.seed_readme(spec).await?;
        }

        self.wait_until_ready(&spec.name).await
    }

    async fn seed_readme(&self, spec: &RepoSpec) -> Result<(), ProvisionError> {
        let content = format!("# {}\n{}", spec.name, spec.description);
        self.client
            .put_contents(
                &self.params.org,
                &spec.name,
                "README.md",
                &FileWrite {
                    message: "Add README.md",
                    content: &content,
                    sha: None,
                    branch: None,
                },
            )
            .await
            .map_err(|source| ProvisionError::Readme {
                repo: spec.name.clone(),
                source,
            })
    }

    async fn wait_until_ready(&self, repo_name: &str) -> Result<(), ProvisionError> {
        debug!(repo = %repo_name, "Checking to see if the repo is ready yet");
        let org = self.params.org.as_str();
        let client = &self.client;

        let ready = self
            .readiness
            .poll(self.sleeper.as_ref(), move |_| {
                client.set_default_branch(org, repo_name, BASE_BRANCH)
            })
            .await;

        match ready {
            Some(attempt) => {
                info!(repo = %repo_name, attempt, "Repository ready");
                Ok(())
            }
            None => {
                error!(
                    repo = %repo_name,
                    attempts = self.readiness.max_attempts,
                    "Repository not ready - please check and re-run"
                );
                Err(ProvisionError::NotReady {
                    repo: repo_name.to_string(),
                    attempts: self.readiness.max_attempts,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSleeper {
        slept: Mutex<Vec<Duration>>,
    }

    impl RecordingSleeper {
        fn total(&self) -> Duration {
            self.slept.lock().unwrap().iter().sum()
        }

        fn calls(&self) -> usize {
            self.slept.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.slept.lock().unwrap().push(duration);
        }
    }

    #[test]
    fn test_default_policy() {
        let policy = ReadinessPolicy::default();
        assert_eq!(policy.max_attempts, 10);
        assert_eq!(policy.delay, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_poll_returns_on_third_attempt() {
        let sleeper = RecordingSleeper::default();
        let calls = AtomicU32::new(0);

        let result = ReadinessPolicy::default()
            .poll(&sleeper, |n| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 3 {
                        Err("422 Unprocessable Entity")
                    } else {
                        Ok(())
                    }
                }
            })
            .await;

        assert_eq!(result, Some(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(sleeper.calls(), 3);
    }

    #[tokio::test]
    async fn test_poll_exhausts_after_ten_attempts() {
        let sleeper = RecordingSleeper::default();
        let calls = AtomicU32::new(0);

        let result = ReadinessPolicy::default()
            .poll(&sleeper, |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>("404 Not Found") }
            })
            .await;

        assert_eq!(result, None);
        assert_eq!(calls.load(Ordering::SeqCst), 10);
        assert!(sleeper.total() >= Duration::from_secs(45));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_sleeper_waits_full_budget() {
        let start = tokio::time::Instant::now();
        let result = ReadinessPolicy::default()
            .poll(&TokioSleeper, |_| async { Err::<(), _>("not ready") })
            .await;

        assert_eq!(result, None);
        assert!(start.elapsed() >= Duration::from_secs(45));
    }
}
