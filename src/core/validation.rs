//! Background validation client for committed field values.
//!
//! After the guided-fill machine commits a value, the session layer asks the
//! external validation service to look at the provisional document. The call
//! is strictly advisory: it runs out-of-band, never blocks the conversation,
//! and never fails to the caller. Transport errors, unparseable bodies and
//! rate limits all map to a [`ValidationOutcome`] carrying a follow-up
//! message. HTTP 429 additionally arms a client-side cooldown so subsequent
//! calls short-circuit until the service is willing to talk again.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, error, warn};

use crate::core::cooldown::{CooldownStore, epoch_millis};
use crate::core::guided_fill::FieldId;

/// Cooldown applied when a 429 carries no usable retry-after hint.
const DEFAULT_RETRY_SECONDS: u64 = 60;

// Matches "in 30 seconds" / "after 1 second" style hints in service messages
static RETRY_SECONDS_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:in|after)\s*(\d+)\s*seconds?").unwrap());

/// Result of one validation call.
///
/// `follow_up` is an informational message for the display sink; `value` is
/// a normalized suggestion the service may offer for the committed field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub follow_up: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

impl ValidationOutcome {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            follow_up: Some(message.into()),
            value: None,
        }
    }

    fn rate_limited(retry_seconds: u64) -> Self {
        Self::failure(format!(
            "Validation service rate-limited. Please try again in {retry_seconds} seconds."
        ))
    }
}

/// HTTP client for the validation service.
pub struct ValidationClient {
    client: reqwest::Client,
    base_url: String,
    cooldown: Arc<dyn CooldownStore>,
}

impl ValidationClient {
    /// Creates a client for the service at `base_url`.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        cooldown: Arc<dyn CooldownStore>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {e}");
                reqwest::Client::new()
            });

        Self {
            client,
            base_url: base_url.into(),
            cooldown,
        }
    }

    /// Validates the provisional document with `field` as the focus.
    ///
    /// Always resolves. Every failure mode is absorbed here and expressed as
    /// an outcome with a follow-up message; nothing propagates to the
    /// guided-fill transition logic.
    pub async fn validate(
        &self,
        field: &str,
        provisional: &BTreeMap<FieldId, String>,
    ) -> ValidationOutcome {
        let now = epoch_millis();
        match self.cooldown.deadline().await {
            Ok(Some(until)) if until > now => {
                let remaining = (until - now).div_ceil(1000);
                debug!(remaining, "Suppressing validation call during client cooldown");
                return ValidationOutcome::rate_limited(remaining);
            }
            Ok(_) => {}
            Err(e) => warn!("Failed to read validation cooldown: {e}"),
        }

        let url = format!(
            "{}/api/v1/validate-provisional",
            self.base_url.trim_end_matches('/')
        );
        debug!(%field, %url, "Sending validation request");

        let response = match self
            .client
            .post(&url)
            .json(&json!({ "provisional": provisional, "field": field }))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!("Validation request failed: {e}");
                return ValidationOutcome::failure("Validation request failed. Please try again.");
            }
        };

        let status = response.status();
        if status.is_success() {
            return match response.json::<ValidationOutcome>().await {
                Ok(outcome) => {
                    debug!(?outcome, "Validation response");
                    outcome
                }
                Err(e) => {
                    error!("Failed to parse validation response: {e}");
                    ValidationOutcome::failure("Validation request failed. Please try again.")
                }
            };
        }

        // Non-success: salvage whatever the service sent back
        let retry_after_header = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());

        let body = response.text().await.unwrap_or_default();
        let parsed: Option<Value> = serde_json::from_str(&body).ok();
        let structured = parsed
            .as_ref()
            .filter(|v| v.get("follow_up").is_some() || v.get("ok").is_some());

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let hint = structured
                .and_then(|v| v.get("follow_up").and_then(Value::as_str))
                .unwrap_or(&body);
            let retry_seconds = retry_after_header
                .or_else(|| parse_retry_seconds(hint))
                .unwrap_or(DEFAULT_RETRY_SECONDS);

            let until = epoch_millis() + retry_seconds * 1000;
            if let Err(e) = self.cooldown.set_deadline(until).await {
                warn!("Failed to persist validation cooldown: {e}");
            }
            debug!(retry_seconds, "Client cooldown set after 429");

            // Pass the service's own message through when it sent one
            if let Some(outcome) = structured.and_then(deserialize_outcome) {
                return outcome;
            }
            return ValidationOutcome::rate_limited(retry_seconds);
        }

        if let Some(outcome) = structured.and_then(deserialize_outcome) {
            debug!(%status, "Validation service returned an error with a structured body");
            return outcome;
        }

        error!("Validation endpoint error: {status}, body: {body}");
        if body.trim().is_empty() {
            ValidationOutcome::failure("Server validation failed. Please rephrase.")
        } else {
            ValidationOutcome::failure(body)
        }
    }
}

fn deserialize_outcome(value: &Value) -> Option<ValidationOutcome> {
    serde_json::from_value(value.clone()).ok()
}

/// Extract a retry duration from a textual rate-limit hint.
fn parse_retry_seconds(text: &str) -> Option<u64> {
    RETRY_SECONDS_REGEX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cooldown::MemoryCooldownStore;

    #[test]
    fn test_parse_retry_seconds() {
        assert_eq!(parse_retry_seconds("Please try again in 30 seconds."), Some(30));
        assert_eq!(parse_retry_seconds("retry after 1 second"), Some(1));
        assert_eq!(parse_retry_seconds("Rate limited, IN 5 SECONDS"), Some(5));
        assert_eq!(parse_retry_seconds("try again later"), None);
        assert_eq!(parse_retry_seconds(""), None);
    }

    #[test]
    fn test_outcome_deserializes_partial_bodies() {
        let outcome: ValidationOutcome =
            serde_json::from_str(r#"{"follow_up": "Which city did you mean?"}"#).unwrap();
        assert!(!outcome.ok);
        assert_eq!(outcome.follow_up.as_deref(), Some("Which city did you mean?"));
        assert_eq!(outcome.value, None);

        let outcome: ValidationOutcome = serde_json::from_str(r#"{"ok": true}"#).unwrap();
        assert!(outcome.ok);
        assert_eq!(outcome.follow_up, None);
    }

    #[tokio::test]
    async fn test_cooldown_short_circuits_before_any_network_call() {
        let cooldown = Arc::new(MemoryCooldownStore::new());
        cooldown
            .set_deadline(epoch_millis() + 30_000)
            .await
            .unwrap();

        // Unroutable base URL: reaching the network would fail the test
        // with a different message than the cooldown short-circuit.
        let client = ValidationClient::new(
            "http://127.0.0.1:9",
            Duration::from_millis(200),
            cooldown,
        );

        let outcome = client.validate("city", &BTreeMap::new()).await;
        assert!(!outcome.ok);
        let follow_up = outcome.follow_up.unwrap();
        assert!(follow_up.starts_with("Validation service rate-limited."), "{follow_up}");
    }

    #[tokio::test]
    async fn test_unreachable_service_maps_to_failure_outcome() {
        let client = ValidationClient::new(
            "http://127.0.0.1:9",
            Duration::from_millis(200),
            Arc::new(MemoryCooldownStore::new()),
        );

        let outcome = client.validate("city", &BTreeMap::new()).await;
        assert!(!outcome.ok);
        assert_eq!(
            outcome.follow_up.as_deref(),
            Some("Validation request failed. Please try again.")
        );
        assert_eq!(outcome.value, None);
    }
}
