//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record mirrored to the durable slot.
//! - Provide the input normalization gate for user-entered text.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `text` of a constructed task is non-empty and trimmed.
//! - `created_at` is used for ordering only; collection position carries no
//!   meaning.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a task record.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type TaskId = Uuid;

/// Canonical task record.
///
/// The serialized shape is the durable-slot wire format: `id` as a string,
/// `createdAt` as a JSON number of unix epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Stable global ID, assigned at creation.
    pub id: TaskId,
    /// User-entered label; never empty for a stored record.
    pub text: String,
    /// Completion axis: `active <-> completed`, toggleable indefinitely.
    pub completed: bool,
    /// Unix epoch milliseconds at creation.
    #[serde(rename = "createdAt")]
    pub created_at: i64,
}

impl Task {
    /// Creates a new active task with a generated stable ID.
    ///
    /// # Invariants
    /// - `text` must already be normalized (see [`normalized_text`]);
    ///   this constructor does not trim or reject.
    /// - `completed` starts as `false`.
    pub fn new(text: impl Into<String>, created_at_ms: i64) -> Self {
        Self::with_id(Uuid::new_v4(), text, created_at_ms)
    }

    /// Creates a task with a caller-provided stable ID.
    ///
    /// Used by tests and import paths where identity already exists.
    pub fn with_id(id: TaskId, text: impl Into<String>, created_at_ms: i64) -> Self {
        Self {
            id,
            text: text.into(),
            completed: false,
            created_at: created_at_ms,
        }
    }
}

/// Normalizes raw user input into storable task text.
///
/// Returns `None` when the trimmed input is empty; callers treat that as a
/// silent rejection, not an error.
pub fn normalized_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
