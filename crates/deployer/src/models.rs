//! Request and response payloads for the task webhook.

use serde::{Deserialize, Serialize};

/// Inbound task request (webhook trigger).
#[derive(Debug, Clone, Deserialize)]
pub struct TaskRequest {
    /// Requester email, echoed in the completion notification
    pub email: String,
    /// Shared secret, compared against the configured value
    pub secret: String,
    /// Task name; the repository name is derived from it
    pub task: String,
    /// Round number, monotonically increasing per task
    pub round: i64,
    /// Opaque correlation token, echoed in the completion notification
    pub nonce: String,
    /// Free text written into the README and index page
    pub brief: String,
    /// Check descriptors; accepted but never interpreted
    #[serde(default)]
    pub checks: Vec<serde_json::Value>,
    /// Target for the outbound completion notification
    #[serde(default)]
    pub evaluation_url: Option<String>,
    /// Files to upload alongside the generated pages
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// A single attachment: a repository path and a source URL.
///
/// Only inline-data URLs (`data:...;base64,...`) are uploaded; anything else
/// is skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    /// Path within the repository
    pub name: String,
    /// Source URL, possibly a data URI carrying the content inline
    pub url: String,
}

/// Outbound completion notification posted to the evaluation URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub email: String,
    pub task: String,
    pub round: i64,
    pub nonce: String,
    pub repo_url: String,
    pub commit_sha: String,
    pub pages_url: String,
}

/// Result of a successful reconciliation.
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    /// HTML URL of the reconciled repository
    pub repo_url: String,
    /// Deterministic GitHub Pages URL for the repository
    pub pages_url: String,
    /// Latest commit sha on the default branch (empty if the lookup failed)
    pub commit_sha: String,
    /// Whether the repository was created on this call
    pub is_new: bool,
}

/// Derive a repository-name-safe string from a task name.
///
/// Only spaces are replaced with hyphens; other unsafe characters pass
/// through unchanged.
#[must_use]
pub fn derive_repo_name(task: &str) -> String {
    task.replace(' ', "-")
}

/// Deterministic GitHub Pages URL for a repository.
#[must_use]
pub fn pages_url(owner: &str, repo_name: &str) -> String {
    format!("https://{owner}.github.io/{repo_name}/")
}
