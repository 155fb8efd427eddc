//! Cascade engine for the three-step configuration.
//!
//! This module implements the state machine behind the configuration dialog:
//! a parameter is chosen, then a worksheet, then a field of the worksheet
//! whose type matches the parameter.
//!
//! # Architecture
//!
//! The cascade engine follows the effects-as-data pattern:
//! - Operations validate preconditions, mutate the aggregate and return
//!   `Effect` values
//! - Effects are executed by a driver against the collaborator traits
//! - Query results are fed back with the generation they were requested under
//!
//! # Key Invariants
//!
//! 1. **Upstream first**: a step is only enabled while every upstream step is
//!    locked. Unlocking a step clears every step after it.
//!
//! 2. **Single flight**: while a resolution is pending, lock and unlock are
//!    rejected. `reset` is always accepted and supersedes the pending request.
//!
//! 3. **Level-by-level restore**: a saved configuration is revalidated one step
//!    at a time; a failure stops the restore at that step.

pub mod engine;
pub mod resolve;
pub mod restore;
pub mod snapshot;

// Re-export commonly used types
pub use engine::{CascadeEngine, CascadeError, Resolution, ResolutionOutcome};
pub use restore::{DriftReason, RestoreTarget};
pub use snapshot::{CascadeSnapshot, StepView};
