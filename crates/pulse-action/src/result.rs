//! Execution accounting.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Per-stage accounting for one execute call.
///
/// `total_processors` counts the sequential processors plus the
/// final processor (if set) and is fixed before the processor stage
/// starts, so an aborted run reports a symmetric `executed/total`.
/// `validation_passed` is false both when a validator rejected and
/// when the pipeline never reached validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionResult {
    /// The pipeline ran to completion.
    pub success: bool,
    /// All validators accepted (or none were registered and the
    /// stage was reached).
    pub validation_passed: bool,
    /// Failure diagnostic; empty when nothing went wrong.
    pub error_message: String,
    /// Registered validators.
    pub total_validators: usize,
    /// Validators that accepted.
    pub passed_validators: usize,
    /// Sequential processors plus final processor.
    pub total_processors: usize,
    /// Processors that ran.
    pub executed_processors: usize,
    /// Listeners eligible across the reached stages.
    pub total_listeners: usize,
    /// Listeners that ran.
    pub executed_listeners: usize,
}

impl ActionResult {
    /// A failure result carrying only a diagnostic, used when
    /// execution never reaches a container.
    #[must_use]
    pub fn failure(error_message: impl Into<String>) -> Self {
        Self {
            error_message: error_message.into(),
            ..Self::default()
        }
    }
}

impl fmt::Display for ActionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ActionResult {{ success: {}, validation_passed: {}, validators: {}/{}, processors: {}/{}, listeners: {}/{}",
            self.success,
            self.validation_passed,
            self.passed_validators,
            self.total_validators,
            self.executed_processors,
            self.total_processors,
            self.executed_listeners,
            self.total_listeners,
        )?;
        if !self.error_message.is_empty() {
            write!(f, ", error: {}", self.error_message)?;
        }
        f.write_str(" }")
    }
}
