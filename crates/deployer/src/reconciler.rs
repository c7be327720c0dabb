//! Repository reconciliation: drive a GitHub repository toward the state
//! described by a task request.
//!
//! The sequence is a handful of idempotent upserts: ensure the repository
//! exists, write README.md and index.html, upload inline-data attachments,
//! enable Pages once per repository lifetime, and report the result. Only
//! the secret check and required file writes can fail the call; attachments
//! and Pages enablement are best-effort.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::ReconcileError;
use crate::github::{GitHubClient, GitHubError};
use crate::models::{derive_repo_name, pages_url, ReconcileOutcome, TaskRequest};

/// Reconciles task requests against remote GitHub state.
///
/// Holds no state of its own; the remote repository is the source of truth
/// and is re-read on every invocation.
#[derive(Debug, Clone)]
pub struct Reconciler {
    config: Config,
    github: GitHubClient,
}

impl Reconciler {
    /// Create a reconciler with explicit configuration and client.
    #[must_use]
    pub fn new(config: Config, github: GitHubClient) -> Self {
        Self { config, github }
    }

    /// Run the full reconciliation for one task request.
    ///
    /// # Errors
    ///
    /// Fails on secret mismatch (before any remote call), on a missing
    /// GitHub token, and on required mutations: repository creation and the
    /// README/index upserts. Attachment uploads, Pages enablement and the
    /// commit lookup degrade to log entries.
    pub async fn reconcile(&self, request: &TaskRequest) -> Result<ReconcileOutcome, ReconcileError> {
        if !secret_matches(self.config.student_secret.as_deref(), &request.secret) {
            warn!(task = %request.task, "Rejected request with invalid secret");
            return Err(ReconcileError::Auth);
        }
        if self.config.github_token.is_none() {
            return Err(ReconcileError::MissingToken);
        }

        let repo_name = derive_repo_name(&request.task);
        let owner = &self.config.owner;
        let pages = pages_url(owner, &repo_name);

        let (repo, is_new) = match self.github.get_repo(owner, &repo_name).await {
            Ok(Some(repo)) => {
                info!(repo = %repo_name, round = request.round, "Using existing repository");
                (repo, false)
            }
            Ok(None) => {
                let repo = self
                    .github
                    .create_repo(&repo_name, &pages)
                    .await
                    .map_err(into_reconcile)?;
                info!(repo = %repo_name, round = request.round, "Created new repository");
                (repo, true)
            }
            Err(e) => return Err(into_reconcile(e)),
        };

        let readme = render_readme(&repo_name, &request.brief, request.round);
        self.upsert_file(
            &repo_name,
            "README.md",
            &format!("init commit round {}", request.round),
            &format!("update README round {}", request.round),
            readme.as_bytes(),
        )
        .await
        .map_err(into_reconcile)?;

        let index = render_index(&repo_name, &request.brief, request.round, Utc::now());
        self.upsert_file(
            &repo_name,
            "index.html",
            &format!("add index round {}", request.round),
            &format!("update HTML round {}", request.round),
            index.as_bytes(),
        )
        .await
        .map_err(into_reconcile)?;

        for attachment in &request.attachments {
            let Some(decoded) = decode_inline_data(&attachment.url) else {
                debug!(name = %attachment.name, "Skipping attachment without inline data");
                continue;
            };
            let bytes = match decoded {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(name = %attachment.name, error = %e, "Failed to decode attachment");
                    continue;
                }
            };
            let result = self
                .upsert_file(
                    &repo_name,
                    &attachment.name,
                    &format!("add attachment {}", attachment.name),
                    &format!("update attachment {}", attachment.name),
                    &bytes,
                )
                .await;
            match result {
                Ok(()) => info!(name = %attachment.name, "Attached file"),
                Err(e) => {
                    warn!(name = %attachment.name, error = %e, "Failed to upload attachment");
                }
            }
        }

        // Pages enablement is gated on the create edge only; if it fails
        // here it is never retried on later rounds.
        if is_new {
            let branch = repo.default_branch.as_deref().unwrap_or("main");
            if let Err(e) = self
                .github
                .enable_pages(owner, &repo_name, branch, &pages)
                .await
            {
                warn!(repo = %repo_name, error = %e, "Failed to enable GitHub Pages");
            }
        }

        let commit_sha = match self.github.latest_commit(owner, &repo_name).await {
            Ok(Some(sha)) => sha,
            Ok(None) => {
                warn!(repo = %repo_name, "Repository has no commits yet");
                String::new()
            }
            Err(e) => {
                warn!(repo = %repo_name, error = %e, "Failed to fetch latest commit");
                String::new()
            }
        };

        Ok(ReconcileOutcome {
            repo_url: repo.html_url,
            pages_url: pages,
            commit_sha,
            is_new,
        })
    }

    /// Create the file if absent, otherwise update it using the current sha
    /// as the precondition.
    async fn upsert_file(
        &self,
        repo: &str,
        path: &str,
        create_message: &str,
        update_message: &str,
        content: &[u8],
    ) -> Result<(), GitHubError> {
        let owner = &self.config.owner;
        match self.github.get_file(owner, repo, path).await? {
            Some(existing) => {
                self.github
                    .put_file(
                        owner,
                        repo,
                        path,
                        update_message,
                        content,
                        Some(&existing.sha),
                    )
                    .await
            }
            None => {
                self.github
                    .put_file(owner, repo, path, create_message, content, None)
                    .await
            }
        }
    }
}

/// Constant-time comparison of the provided secret against the configured
/// one; an unconfigured secret rejects everything.
fn secret_matches(expected: Option<&str>, provided: &str) -> bool {
    let Some(expected) = expected else {
        return false;
    };
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

/// Decode the payload of an inline-data URL.
///
/// Returns `None` for anything that is not a `data:` URL (those attachments
/// are skipped, not failed).
fn decode_inline_data(url: &str) -> Option<anyhow::Result<Vec<u8>>> {
    if !url.starts_with("data:") {
        return None;
    }
    let Some((_, payload)) = url.split_once(',') else {
        return Some(Err(anyhow::anyhow!("data URL has no payload separator")));
    };
    Some(BASE64.decode(payload).map_err(Into::into))
}

/// Render the README content for a round.
fn render_readme(repo_name: &str, brief: &str, round: i64) -> String {
    format!("# {repo_name}\n\n{brief}\n\nRound {round} | MIT License")
}

/// Render the index page embedding the brief and a generation timestamp.
fn render_index(repo_name: &str, brief: &str, round: i64, generated_at: DateTime<Utc>) -> String {
    let timestamp = generated_at.format("%Y-%m-%d %H:%M:%S");
    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head><title>{repo_name}</title></head>\n\
         <body>\n\
         <h1>{brief}</h1>\n\
         <p>Round {round} | Generated {timestamp} UTC</p>\n\
         </body>\n\
         </html>\n"
    )
}

fn into_reconcile(err: GitHubError) -> ReconcileError {
    match err {
        GitHubError::Conflict { path } => ReconcileError::Conflict { path },
        other => ReconcileError::Remote(other.to_string()),
    }
}
