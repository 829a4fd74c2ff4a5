//! Core domain logic for Ticklist.
//! This crate is the single source of truth for list behavior and timing.

pub mod db;
pub mod engine;
pub mod logging;
pub mod model;
pub mod store;
pub mod view;

pub use engine::{
    Clock, ManualClock, SystemClock, TaskListEngine, CELEBRATION_PULSE_MS, REMOVE_COMMIT_DELAY_MS,
    TOGGLE_COMMIT_DELAY_MS,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::task::{normalized_text, Task, TaskId};
pub use store::{SlotStore, SqliteSlotStore, StoreError, StoreResult, TaskSlot, TASKS_SLOT_KEY};
pub use view::{derive, FilterMode, SortOrder};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
