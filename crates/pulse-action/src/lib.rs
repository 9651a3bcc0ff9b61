//! Staged action execution for the pulse toolkit.
//!
//! An [`ActionPipeline`] runs a six-stage handler sequence for each
//! executed action key:
//!
//! ```text
//! execute(key, args)
//!    │
//!    ├─ 1. trigger listeners      (always run)
//!    ├─ 2. validators             (first `false` aborts)
//!    ├─ 3. validation listeners   (only after validation passed)
//!    ├─ 4. sequential processors  (an Err aborts)
//!    ├─ 5. final processor        (optional; an Err aborts)
//!    └─ 6. completion listeners   (only after processing completed)
//!    │
//!    └─► global completion listeners (every execute, any outcome)
//! ```
//!
//! Handlers inside a stage run in ascending priority order (lower
//! first, insertion order for ties). The returned [`ActionResult`]
//! accounts for every stage: validators passed/total, processors
//! executed/total, listeners executed/total, plus the first failure
//! diagnostic.
//!
//! # Handler shapes
//!
//! | Stage | Closure shape |
//! |-------|---------------|
//! | listeners | `FnMut(&mut A..)` |
//! | validators | `FnMut(&mut A..) -> bool` |
//! | processors | `FnMut(&mut A..) -> Result<(), ProcessError>` |
//!
//! Payload elements are passed as `&mut` references; a mutation made
//! in an early stage is visible to every later handler.
//!
//! # Example
//!
//! ```
//! use pulse_action::{ActionPipeline, ProcessError};
//!
//! let pipeline: ActionPipeline<String> = ActionPipeline::new();
//!
//! pipeline.add_validator(
//!     "transfer".to_string(),
//!     |user: &mut String, amount: &mut i32| !user.is_empty() && *amount > 0,
//!     "basic checks",
//!     0,
//! ).unwrap();
//!
//! pipeline.add_sequential_processor(
//!     "transfer".to_string(),
//!     |user: &mut String, amount: &mut i32| {
//!         if *amount > 10_000 {
//!             return Err(ProcessError::new("over the single-transfer limit"));
//!         }
//!         println!("debiting {amount} from {user}");
//!         Ok(())
//!     },
//!     "debit",
//!     0,
//! ).unwrap();
//!
//! let ok = pipeline.execute(&"transfer".to_string(), ("alice".to_string(), 5_000));
//! assert!(ok.success);
//!
//! let rejected = pipeline.execute(&"transfer".to_string(), ("bob".to_string(), -1));
//! assert!(!rejected.validation_passed);
//! ```

mod container;
mod error;
mod handle;
mod pipeline;
mod result;

pub use error::{ActionError, ProcessError};
pub use handle::{ActionHandle, HandlerKind};
pub use pipeline::ActionPipeline;
pub use result::ActionResult;
