//! Handler handles and kind tags.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which pipeline stage a handler belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandlerKind {
    /// Stage 1: runs on every execute, before validation.
    TriggerListener,
    /// Stage 2: may reject the execution.
    Validator,
    /// Stage 3: runs once validation has passed.
    ValidationListener,
    /// Stage 4: ordered processors; a failure aborts the pipeline.
    SequentialProcessor,
    /// Stage 5: the single terminal processor.
    FinalProcessor,
    /// Stage 6: runs after processing completed.
    CompletionListener,
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TriggerListener => "trigger listener",
            Self::Validator => "validator",
            Self::ValidationListener => "validation listener",
            Self::SequentialProcessor => "sequential processor",
            Self::FinalProcessor => "final processor",
            Self::CompletionListener => "completion listener",
        };
        f.write_str(name)
    }
}

/// Opaque handle to one registered pipeline handler.
///
/// Carries the monotonic id, the action key, and the stage tag; it is
/// the sole means of deregistration. Id `0` is reserved as invalid.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionHandle<K> {
    id: u64,
    key: K,
    kind: HandlerKind,
}

impl<K> ActionHandle<K> {
    pub(crate) fn new(id: u64, key: K, kind: HandlerKind) -> Self {
        Self { id, key, kind }
    }

    /// The handle's unique id within its pipeline.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The action key the handler is registered under.
    #[must_use]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// The stage the handler belongs to.
    #[must_use]
    pub fn kind(&self) -> HandlerKind {
        self.kind
    }

    /// Whether the handle was issued by a pipeline.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.id != 0
    }
}
