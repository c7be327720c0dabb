//! GitHub REST client for repository and file reconciliation.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

const GITHUB_API_URL: &str = "https://api.github.com";

/// Errors from the GitHub API client.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// GitHub returned a non-success status
    #[error("GitHub API error: {status} - {body}")]
    Api { status: StatusCode, body: String },

    /// A file write was rejected because its sha precondition was stale
    #[error("Conflicting update for {path}: sha precondition rejected")]
    Conflict { path: String },
}

/// GitHub API client for repository reconciliation.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

/// A repository as returned by the GitHub API.
#[derive(Debug, Clone, Deserialize)]
pub struct Repo {
    /// Repository name
    pub name: String,
    /// HTML URL
    pub html_url: String,
    /// Default branch (absent on freshly created repos in some responses)
    #[serde(default)]
    pub default_branch: Option<String>,
}

/// A file tracked in a repository, as returned by the contents API.
///
/// The sha is the optimistic-concurrency token required to update the file.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteFile {
    /// Path within the repository
    pub path: String,
    /// Content sha, used as the precondition for updates
    pub sha: String,
}

/// Request to create a repository.
#[derive(Debug, Serialize)]
struct CreateRepoRequest<'a> {
    name: &'a str,
    private: bool,
    license_template: &'a str,
    auto_init: bool,
    homepage: &'a str,
}

/// Request to create or update a file via the contents API.
#[derive(Debug, Serialize)]
struct PutFileRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct CommitEntry {
    sha: String,
}

impl GitHubClient {
    /// Create a new GitHub client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(token: &str) -> anyhow::Result<Self> {
        Self::with_base_url(token, GITHUB_API_URL)
    }

    /// Create a client with a custom API base URL (for testing against a
    /// mock server).
    pub fn with_base_url(token: &str, base_url: &str) -> anyhow::Result<Self> {
        use anyhow::Context;

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("task-deployer/1.0"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            token: token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch a repository by owner and name; `None` if it does not exist.
    pub async fn get_repo(&self, owner: &str, name: &str) -> Result<Option<Repo>, GitHubError> {
        let url = format!("{}/repos/{owner}/{name}", self.base_url);

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(owner = %owner, repo = %name, "Repository not found");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        Ok(Some(response.json().await?))
    }

    /// Create a public MIT-licensed repository for the authenticated user,
    /// with an initial README and the homepage set to its Pages URL.
    pub async fn create_repo(&self, name: &str, homepage: &str) -> Result<Repo, GitHubError> {
        let url = format!("{}/user/repos", self.base_url);

        let request = CreateRepoRequest {
            name,
            private: false,
            license_template: "mit",
            auto_init: true,
            homepage,
        };

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let repo: Repo = response.json().await?;
        info!(repo = %repo.name, "Created repository");
        Ok(repo)
    }

    /// Fetch a file's metadata via the contents API; `None` if absent.
    pub async fn get_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Option<RemoteFile>, GitHubError> {
        let url = format!("{}/repos/{owner}/{repo}/contents/{path}", self.base_url);

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        Ok(Some(response.json().await?))
    }

    /// Create or update a file via the contents API.
    ///
    /// Pass the current sha to update an existing file; omit it to create.
    /// A rejected sha precondition surfaces as [`GitHubError::Conflict`].
    pub async fn put_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        message: &str,
        content: &[u8],
        sha: Option<&str>,
    ) -> Result<(), GitHubError> {
        let url = format!("{}/repos/{owner}/{repo}/contents/{path}", self.base_url);

        let request = PutFileRequest {
            message,
            content: BASE64.encode(content),
            sha,
        };

        let response = self
            .client
            .put(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::CONFLICT {
            return Err(GitHubError::Conflict {
                path: path.to_string(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // The contents API reports a stale sha as a 422 with a
            // "does not match" message rather than a 409.
            if status == StatusCode::UNPROCESSABLE_ENTITY && body.contains("does not match") {
                return Err(GitHubError::Conflict {
                    path: path.to_string(),
                });
            }
            return Err(GitHubError::Api { status, body });
        }

        debug!(repo = %repo, path = %path, updated = sha.is_some(), "Wrote file");
        Ok(())
    }

    /// Enable GitHub Pages for a repository: set the homepage, turn on
    /// issues, and request a Pages build from the default branch root.
    pub async fn enable_pages(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        homepage: &str,
    ) -> Result<(), GitHubError> {
        let url = format!("{}/repos/{owner}/{repo}", self.base_url);

        let response = self
            .client
            .patch(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .json(&serde_json::json!({
                "homepage": homepage,
                "has_issues": true,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let pages_url = format!("{}/repos/{owner}/{repo}/pages", self.base_url);
        let response = self
            .client
            .post(&pages_url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .json(&serde_json::json!({
                "source": { "branch": branch, "path": "/" },
            }))
            .send()
            .await?;

        // 409 means Pages is already enabled for this repository.
        if response.status() == StatusCode::CONFLICT {
            debug!(repo = %repo, "Pages already enabled");
            return Ok(());
        }
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        info!(repo = %repo, homepage = %homepage, "Enabled GitHub Pages");
        Ok(())
    }

    /// Latest commit sha on the default branch; `None` for an empty history.
    pub async fn latest_commit(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Option<String>, GitHubError> {
        let url = format!("{}/repos/{owner}/{repo}/commits?per_page=1", self.base_url);

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let commits: Vec<CommitEntry> = response.json().await?;
        Ok(commits.into_iter().next().map(|c| c.sha))
    }
}

async fn api_error(response: reqwest::Response) -> GitHubError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    GitHubError::Api { status, body }
}
