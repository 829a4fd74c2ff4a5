//! Durable store adapter for the task collection.
//!
//! # Responsibility
//! - Define the raw key-value contract over the durable medium.
//! - Mirror the in-memory collection to one named slot, full value per
//!   write, with readiness distinct from emptiness.
//!
//! # Invariants
//! - The adapter holds no business logic; it only moves the collection in
//!   and out of the slot.
//! - Load resolves readiness exactly once, even when the slot is absent,
//!   unreadable or malformed.
//! - Write failures never propagate to callers; they degrade to warn-level
//!   log events.

pub mod slot_store;
pub mod task_slot;

pub use slot_store::{SlotStore, SqliteSlotStore, StoreError, StoreResult};
pub use task_slot::TaskSlot;

/// Slot key under which the task collection is mirrored.
pub const TASKS_SLOT_KEY: &str = "tasks";
