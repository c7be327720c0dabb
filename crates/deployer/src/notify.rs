//! Outbound completion notification to the evaluation URL.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info};

use crate::models::NotificationPayload;

/// POST the completion payload to the evaluation URL.
///
/// One attempt, bounded by `timeout`; no retry. Callers treat a failure here
/// as best-effort and log it rather than changing the response to the
/// original requester.
pub async fn send_completion(
    evaluation_url: &str,
    payload: &NotificationPayload,
    timeout: Duration,
) -> Result<()> {
    debug!(
        evaluation_url = %evaluation_url,
        task = %payload.task,
        round = payload.round,
        "Sending completion notification"
    );

    let client = reqwest::Client::new();
    let response = client
        .post(evaluation_url)
        .timeout(timeout)
        .json(payload)
        .send()
        .await
        .context("Failed to send completion notification")?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(anyhow!(
            "Evaluation endpoint returned error status {status}: {body}"
        ));
    }

    info!(
        evaluation_url = %evaluation_url,
        status = %status,
        "Completion notification delivered"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn payload() -> NotificationPayload {
        NotificationPayload {
            email: "student@example.com".to_string(),
            task: "My Site".to_string(),
            round: 1,
            nonce: "abc123".to_string(),
            repo_url: "https://github.com/some-org/My-Site".to_string(),
            commit_sha: "deadbeef".to_string(),
            pages_url: "https://some-org.github.io/My-Site/".to_string(),
        }
    }

    #[tokio::test]
    async fn test_send_completion_posts_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/notify"))
            .and(body_partial_json(serde_json::json!({
                "email": "student@example.com",
                "task": "My Site",
                "round": 1,
                "nonce": "abc123",
                "commit_sha": "deadbeef",
                "pages_url": "https://some-org.github.io/My-Site/",
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/notify", server.uri());
        send_completion(&url, &payload(), Duration::from_secs(10))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_send_completion_non_2xx_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/notify"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let url = format!("{}/notify", server.uri());
        let result = send_completion(&url, &payload(), Duration::from_secs(10)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_send_completion_unreachable_is_error() {
        // Reserved port with nothing listening.
        let result = send_completion(
            "http://127.0.0.1:1/notify",
            &payload(),
            Duration::from_secs(1),
        )
        .await;
        assert!(result.is_err());
    }
}
