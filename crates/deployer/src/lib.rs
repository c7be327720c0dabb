//! Task webhook receiver that publishes GitHub Pages sites.
//!
//! This crate provides:
//! - Inbound HTTP endpoint accepting authenticated task requests
//! - GitHub REST client for repository and file reconciliation
//! - Idempotent create-or-update of README, index page and attachments
//! - One-time GitHub Pages enablement for new repositories
//! - Outbound completion notification to a caller-supplied evaluation URL

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Many async API methods can fail

pub mod config;
pub mod error;
pub mod github;
pub mod models;
pub mod notify;
pub mod reconciler;
pub mod server;

pub use config::Config;
pub use error::ReconcileError;
pub use github::GitHubClient;
pub use models::{Attachment, NotificationPayload, ReconcileOutcome, TaskRequest};
pub use reconciler::Reconciler;
