//! Engine layer: collection ownership, deferred commits, timing.
//!
//! # Responsibility
//! - House the task list engine and the clock abstraction it schedules
//!   against.
//!
//! # See also
//! - [`crate::store`] for the persistence the engine mirrors into.
//! - [`crate::view`] for the derivation it exposes.

pub mod clock;
pub mod task_list;

pub use clock::{Clock, ManualClock, SystemClock};
pub use task_list::{
    TaskListEngine, CELEBRATION_PULSE_MS, REMOVE_COMMIT_DELAY_MS, TOGGLE_COMMIT_DELAY_MS,
};
