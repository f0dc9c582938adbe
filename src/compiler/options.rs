/// Activity option derivation
///
/// Downstream code generation attaches execution options to every activity
/// step. Timeouts come from the step's parameter bag as `PT…` durations; a
/// retry policy is emitted only when the step actually carries one, never
/// defaulted.

use crate::compiler::naming::parse_duration;
use serde::Serialize;
use serde_json::Value;

/// Default start-to-close timeout in seconds when the step specifies none
pub const DEFAULT_START_TO_CLOSE_SECS: u64 = 300;

/// Execution options derived from a step's parameter bag
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityOptions {
    /// Seconds an activity may run once started
    pub start_to_close_timeout: u64,
    /// Seconds from scheduling to completion, only when the step sets it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_to_close_timeout: Option<u64>,
    /// Heartbeat interval in seconds, only when the step sets it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heartbeat_timeout: Option<u64>,
    /// Retry policy, present only when the step carries a retry block
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryPolicy>,
}

/// Retry policy block passed through from the step parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetryPolicy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u64>,
    /// Seconds before the first retry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_interval: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backoff_coefficient: Option<f64>,
    /// Ceiling on the backoff interval in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_interval: Option<u64>,
}

impl ActivityOptions {
    /// Derive options from a step parameter bag
    pub fn from_params(params: &Value) -> Self {
        let duration = |key: &str| params.get(key).and_then(Value::as_str).and_then(parse_duration);

        Self {
            start_to_close_timeout: duration("startToCloseTimeout")
                .unwrap_or(DEFAULT_START_TO_CLOSE_SECS),
            schedule_to_close_timeout: duration("scheduleToCloseTimeout"),
            heartbeat_timeout: duration("heartbeatTimeout"),
            retry: params.get("retryPolicy").map(|block| RetryPolicy {
                max_attempts: block.get("maxAttempts").and_then(Value::as_u64),
                initial_interval: block
                    .get("initialInterval")
                    .and_then(Value::as_str)
                    .and_then(parse_duration),
                backoff_coefficient: block.get("backoffCoefficient").and_then(Value::as_f64),
                max_interval: block
                    .get("maxInterval")
                    .and_then(Value::as_str)
                    .and_then(parse_duration),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn start_to_close_defaults_to_300() {
        let opts = ActivityOptions::from_params(&json!({}));
        assert_eq!(opts.start_to_close_timeout, 300);
        assert!(opts.schedule_to_close_timeout.is_none());
        assert!(opts.heartbeat_timeout.is_none());
        assert!(opts.retry.is_none());
    }

    #[test]
    fn timeouts_pass_through_when_present() {
        let opts = ActivityOptions::from_params(&json!({
            "startToCloseTimeout": "PT10M",
            "scheduleToCloseTimeout": "PT1H",
            "heartbeatTimeout": "PT30S",
        }));
        assert_eq!(opts.start_to_close_timeout, 600);
        assert_eq!(opts.schedule_to_close_timeout, Some(3600));
        assert_eq!(opts.heartbeat_timeout, Some(30));
    }

    #[test]
    fn unparsable_timeout_falls_back_to_default() {
        let opts = ActivityOptions::from_params(&json!({ "startToCloseTimeout": "soon" }));
        assert_eq!(opts.start_to_close_timeout, 300);
    }

    #[test]
    fn retry_policy_only_when_block_present() {
        let opts = ActivityOptions::from_params(&json!({
            "retryPolicy": {
                "maxAttempts": 5,
                "initialInterval": "PT10S",
                "backoffCoefficient": 2.0,
                "maxInterval": "PT5M",
            }
        }));
        let retry = opts.retry.expect("retry block should pass through");
        assert_eq!(retry.max_attempts, Some(5));
        assert_eq!(retry.initial_interval, Some(10));
        assert_eq!(retry.backoff_coefficient, Some(2.0));
        assert_eq!(retry.max_interval, Some(300));
    }

    #[test]
    fn empty_retry_block_is_still_emitted() {
        let opts = ActivityOptions::from_params(&json!({ "retryPolicy": {} }));
        let retry = opts.retry.expect("block present means policy emitted");
        assert!(retry.max_attempts.is_none());
        assert!(retry.initial_interval.is_none());
    }
}
