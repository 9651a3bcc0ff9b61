//! Publish outcomes and subscription modes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How handlers share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubscriptionMode {
    /// Unbounded handler list per key; publishes visit all of them
    /// in registration order.
    Multicast,
    /// Single handler slot per key; a later subscription evicts the
    /// earlier one.
    Unicast,
}

impl fmt::Display for SubscriptionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Multicast => f.write_str("Multicast"),
            Self::Unicast => f.write_str("Unicast"),
        }
    }
}

/// Accounting for one publish call.
///
/// `success` is true iff at least one handler executed. Handlers
/// whose signature did not match the published arguments are counted
/// as failures and their expected signatures recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishResult {
    /// At least one handler executed.
    pub success: bool,
    /// Handlers considered (matched or not).
    pub total_subscribers: usize,
    /// Handlers that executed.
    pub successful: usize,
    /// Handlers skipped or rejected.
    pub failed: usize,
    /// Diagnostic for the overall failure cases; empty on success.
    pub error_message: String,
    /// Signature string of the published arguments.
    pub published_types: String,
    /// Expected signature of each failed handler, in visit order.
    pub failed_subscriber_types: Vec<String>,
    /// Signatures the key's handlers would have accepted.
    pub expected_types: Vec<String>,
    /// Mode the publish ran in.
    pub mode: SubscriptionMode,
}

impl PublishResult {
    /// Fresh accounting for a publish of `published_types` in `mode`.
    #[must_use]
    pub fn new(published_types: String, mode: SubscriptionMode) -> Self {
        Self {
            success: false,
            total_subscribers: 0,
            successful: 0,
            failed: 0,
            error_message: String::new(),
            published_types,
            failed_subscriber_types: Vec::new(),
            expected_types: Vec::new(),
            mode,
        }
    }

    /// Records one executed handler.
    pub fn add_success(&mut self) {
        self.successful += 1;
        self.total_subscribers += 1;
        self.success = self.successful > 0;
    }

    /// Records one skipped/rejected handler and its expected
    /// signature.
    pub fn add_failure(&mut self, expected: String) {
        self.failed += 1;
        self.total_subscribers += 1;
        self.failed_subscriber_types.push(expected.clone());
        self.expected_types.push(expected);
        self.success = self.successful > 0;
    }
}

impl fmt::Display for PublishResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} subscribers executed",
            self.successful, self.total_subscribers
        )?;
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        write!(f, " (mode: {})", self.mode)?;
        if !self.error_message.is_empty() {
            write!(f, ": {}", self.error_message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_tracks_executions() {
        let mut result = PublishResult::new("i32".into(), SubscriptionMode::Multicast);
        assert!(!result.success);

        result.add_failure("f32".into());
        assert!(!result.success);
        assert_eq!(result.total_subscribers, 1);

        result.add_success();
        assert!(result.success);
        assert_eq!(result.successful, 1);
        assert_eq!(result.failed, 1);
        assert_eq!(result.failed_subscriber_types, vec!["f32"]);
    }

    #[test]
    fn display_shows_counts_and_mode() {
        let mut result = PublishResult::new("i32".into(), SubscriptionMode::Unicast);
        result.add_success();
        let text = result.to_string();
        assert!(text.contains("1/1"));
        assert!(text.contains("Unicast"));
    }

    #[test]
    fn display_includes_failures_and_error() {
        let mut result = PublishResult::new("i32".into(), SubscriptionMode::Multicast);
        result.add_failure("bool".into());
        result.error_message = "all handlers failed".into();
        let text = result.to_string();
        assert!(text.contains("0/1"));
        assert!(text.contains("1 failed"));
        assert!(text.contains("all handlers failed"));
    }

    #[test]
    fn serializes() {
        let result = PublishResult::new("()".into(), SubscriptionMode::Multicast);
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("Multicast"));
    }
}
