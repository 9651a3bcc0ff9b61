//! Core vocabulary for the pulse toolkit.
//!
//! Pulse is an in-process reactive runtime toolkit for interactive
//! editor-style applications. This crate is the bottom layer of the
//! workspace: everything here is shared vocabulary with no engine
//! behavior of its own.
//!
//! # Workspace Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Engine Layer                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  pulse-state   : StateTree, PathTrie, change listeners      │
//! │  pulse-bus     : EventBus, typed publish/subscribe          │
//! │  pulse-action  : ActionPipeline, staged execution           │
//! │  pulse-data    : ValueBag, typed pointer registry           │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Vocabulary Layer                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  pulse-types   : ErrorCode, Symbol, Signature,              │
//! │                  Payload, ArgTuple, PayloadFn  ◄── HERE     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # What lives here
//!
//! - [`ErrorCode`]: the machine-readable error code contract every
//!   pulse error enum implements, plus the [`assert_error_code`] /
//!   [`assert_error_codes`] test helpers.
//! - [`Symbol`]: process-wide interned strings with integer identity,
//!   cheap to hash and compare, intended as a key type for the event
//!   bus and the action pipeline.
//! - [`Signature`], [`Payload`], [`ArgTuple`], [`PayloadFn`]: the
//!   type-erased-but-type-checked argument vocabulary shared by the
//!   bus and the pipeline: a publish or execute call erases its typed
//!   argument tuple into a [`Payload`], and handlers are matched
//!   against it by comparing [`Signature`] fingerprints at runtime.
//!
//! # Example
//!
//! ```
//! use pulse_types::{ArgTuple, Signature, Symbol};
//!
//! // Interned symbols: one id per distinct string, process-wide.
//! let open = Symbol::new("editor/open");
//! assert_eq!(open, Symbol::new("editor/open"));
//!
//! // Signatures fingerprint an argument tuple's types.
//! let sig = <(i32, String)>::signature();
//! assert_eq!(sig.arity(), 2);
//! assert_ne!(sig, <(f32, String)>::signature());
//! ```

mod args;
mod error;
mod payload;
mod signature;
mod symbol;

pub use args::{ArgTuple, PayloadFn};
pub use error::{assert_error_code, assert_error_codes, ErrorCode};
pub use payload::Payload;
pub use signature::Signature;
pub use symbol::Symbol;
