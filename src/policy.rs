//! Retry and catch policies for work states.
//!
//! Task, Parallel, and Map states carry ordered lists of [`RetryPolicy`] and
//! [`CatchPolicy`] entries. Order is externally observable: at execution time
//! the runtime applies the first entry whose error filter matches, in
//! declaration order, so this crate preserves declaration order exactly in
//! the rendered `Retry` and `Catch` arrays.
//!
//! Error names are plain strings. The well-known runtime names are provided
//! as constants ([`ERRORS_ALL`] and friends), but any string is accepted;
//! whether a filter can ever match is a question for the consuming runtime,
//! not this builder.

use serde_json::{json, Value};

use crate::types::StateId;

/// Wildcard error name matching any error.
pub const ERRORS_ALL: &str = "States.ALL";
/// The state ran longer than its `TimeoutSeconds`.
pub const ERRORS_TIMEOUT: &str = "States.Timeout";
/// A Task state failed during execution.
pub const ERRORS_TASK_FAILED: &str = "States.TaskFailed";
/// A Task state lacked the privileges to call its resource.
pub const ERRORS_PERMISSIONS: &str = "States.Permissions";
/// A Task state missed its heartbeat deadline.
pub const ERRORS_HEARTBEAT_TIMEOUT: &str = "States.HeartbeatTimeout";

/// One retry specification: an error filter plus backoff parameters.
///
/// Defaults follow the workflow language: retry everything, first interval
/// one second, up to three attempts, doubling each time.
///
/// # Examples
///
/// ```rust
/// use stepgraph::policy::{RetryPolicy, ERRORS_TIMEOUT};
///
/// let retry = RetryPolicy::for_errors([ERRORS_TIMEOUT])
///     .with_interval_seconds(5)
///     .with_max_attempts(2)
///     .with_backoff_rate(1.5);
/// assert_eq!(retry.errors, vec![ERRORS_TIMEOUT.to_string()]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Error names this entry matches, in the rendered `ErrorEquals` array.
    pub errors: Vec<String>,
    /// Seconds before the first retry attempt.
    pub interval_seconds: u32,
    /// Maximum number of retry attempts; 0 disables retrying for the filter.
    pub max_attempts: u32,
    /// Multiplier applied to the interval after each attempt.
    pub backoff_rate: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            errors: vec![ERRORS_ALL.to_string()],
            interval_seconds: 1,
            max_attempts: 3,
            backoff_rate: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A retry entry matching every error, with default backoff.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A retry entry matching only the given error names.
    #[must_use]
    pub fn for_errors<I, S>(errors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RetryPolicy {
            errors: errors.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Sets the delay before the first retry.
    #[must_use]
    pub fn with_interval_seconds(mut self, seconds: u32) -> Self {
        self.interval_seconds = seconds;
        self
    }

    /// Sets the maximum number of attempts.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the interval multiplier applied after each attempt.
    #[must_use]
    pub fn with_backoff_rate(mut self, rate: f64) -> Self {
        self.backoff_rate = rate;
        self
    }

    pub(crate) fn render(&self) -> Value {
        json!({
            "ErrorEquals": self.errors,
            "IntervalSeconds": self.interval_seconds,
            "MaxAttempts": self.max_attempts,
            "BackoffRate": self.backoff_rate,
        })
    }
}

/// One catch specification: an error filter and the state to hand off to.
///
/// # Examples
///
/// ```rust
/// use stepgraph::policy::{CatchPolicy, ERRORS_TASK_FAILED};
///
/// let catch = CatchPolicy::for_errors([ERRORS_TASK_FAILED], "Cleanup")
///     .with_result_path("$.error");
/// assert_eq!(catch.next.as_str(), "Cleanup");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct CatchPolicy {
    /// Error names this entry matches.
    pub errors: Vec<String>,
    /// State that receives control when the filter matches.
    pub next: StateId,
    /// Where to inject the error payload into the state input, if anywhere.
    pub result_path: Option<String>,
}

impl CatchPolicy {
    /// A catch entry matching every error, handing off to `next`.
    #[must_use]
    pub fn new(next: impl Into<StateId>) -> Self {
        CatchPolicy {
            errors: vec![ERRORS_ALL.to_string()],
            next: next.into(),
            result_path: None,
        }
    }

    /// A catch entry matching only the given error names.
    #[must_use]
    pub fn for_errors<I, S>(errors: I, next: impl Into<StateId>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CatchPolicy {
            errors: errors.into_iter().map(Into::into).collect(),
            next: next.into(),
            result_path: None,
        }
    }

    /// Sets the path at which the error payload is injected.
    #[must_use]
    pub fn with_result_path(mut self, path: impl Into<String>) -> Self {
        self.result_path = Some(path.into());
        self
    }

    pub(crate) fn render(&self) -> Value {
        let mut entry = serde_json::Map::new();
        entry.insert("ErrorEquals".to_string(), json!(self.errors));
        entry.insert("Next".to_string(), json!(self.next.as_str()));
        if let Some(path) = &self.result_path {
            entry.insert("ResultPath".to_string(), json!(path));
        }
        Value::Object(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn retry_defaults_match_language_defaults() {
        let retry = RetryPolicy::new();
        assert_eq!(
            retry.render(),
            json!({
                "ErrorEquals": ["States.ALL"],
                "IntervalSeconds": 1,
                "MaxAttempts": 3,
                "BackoffRate": 2.0,
            })
        );
    }

    #[test]
    fn retry_filter_and_backoff_round_trip() {
        let retry = RetryPolicy::for_errors([ERRORS_TIMEOUT, "Custom.Glitch"])
            .with_interval_seconds(10)
            .with_max_attempts(1)
            .with_backoff_rate(1.0);
        assert_eq!(
            retry.render(),
            json!({
                "ErrorEquals": ["States.Timeout", "Custom.Glitch"],
                "IntervalSeconds": 10,
                "MaxAttempts": 1,
                "BackoffRate": 1.0,
            })
        );
    }

    #[test]
    fn catch_omits_result_path_when_unset() {
        let catch = CatchPolicy::new("Handler");
        assert_eq!(
            catch.render(),
            json!({"ErrorEquals": ["States.ALL"], "Next": "Handler"})
        );
    }

    #[test]
    fn catch_renders_result_path() {
        let catch = CatchPolicy::for_errors([ERRORS_TASK_FAILED], "Handler")
            .with_result_path("$.failure");
        assert_eq!(
            catch.render(),
            json!({
                "ErrorEquals": ["States.TaskFailed"],
                "Next": "Handler",
                "ResultPath": "$.failure",
            })
        );
    }
}
