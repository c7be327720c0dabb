//! Error types for repository reconciliation.

use thiserror::Error;

/// Errors that abort a reconciliation.
///
/// Best-effort steps (attachment uploads, Pages enablement, the completion
/// notification) never produce one of these; their failures are logged and
/// the reconciliation carries on.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Shared secret did not match; no remote calls were made
    #[error("Invalid secret")]
    Auth,

    /// No GitHub token configured, so no mutation is possible
    #[error("No GitHub token configured")]
    MissingToken,

    /// A required GitHub mutation failed (repo creation, README/index upsert);
    /// carries the underlying provider message
    #[error("{0}")]
    Remote(String),

    /// A content update was rejected because its sha precondition was stale
    #[error("Conflicting update for {path}: file changed since it was read")]
    Conflict { path: String },
}
