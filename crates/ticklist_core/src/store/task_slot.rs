//! Typed adapter between the task collection and its durable slot.
//!
//! # Responsibility
//! - Serialize the full collection to the slot on every save.
//! - Substitute the empty default when the slot is absent, unreadable or
//!   malformed, and resolve readiness exactly once.
//!
//! # Invariants
//! - Readiness (`is_loaded`) is distinct from emptiness: callers can tell
//!   "no tasks yet" from "not loaded yet".
//! - Save never fails from the caller's perspective; persistence trouble is
//!   a warn-level event, not an error path.

use crate::model::task::{Task, TaskId};
use crate::store::slot_store::SlotStore;
use log::{debug, info, warn};
use std::collections::HashSet;

/// Durable slot adapter for the task collection.
///
/// Wraps a raw [`SlotStore`] with the JSON wire format and the load-once /
/// save-on-change contract of the engine.
pub struct TaskSlot<S: SlotStore> {
    store: S,
    key: String,
    loaded: bool,
}

impl<S: SlotStore> TaskSlot<S> {
    /// Creates an adapter over `store` for the slot named `key`.
    ///
    /// The default collection yielded on absent/malformed slots is empty.
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            loaded: false,
        }
    }

    /// Whether the initial read has resolved.
    ///
    /// `false` means "not loaded yet", never "empty".
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// The slot key this adapter mirrors to.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Performs the one-time slot read.
    ///
    /// Returns `Some(collection)` on the first call: the stored collection,
    /// or the empty default when the slot is absent, unreadable or holds a
    /// payload violating record invariants. Later calls return `None` and
    /// leave the already-resolved state alone.
    ///
    /// # Side effects
    /// - Flips readiness to `true`, regardless of the read outcome.
    /// - Emits one `slot_load` event describing the outcome.
    pub fn load(&mut self) -> Option<Vec<Task>> {
        if self.loaded {
            debug!(
                "event=slot_load module=store status=ignored reason=already_loaded key={}",
                self.key
            );
            return None;
        }
        self.loaded = true;

        let tasks = match self.store.read(&self.key) {
            Ok(Some(payload)) => match decode_tasks(&payload) {
                Ok(tasks) => {
                    info!(
                        "event=slot_load module=store status=ok key={} count={}",
                        self.key,
                        tasks.len()
                    );
                    tasks
                }
                Err(reason) => {
                    warn!(
                        "event=slot_load module=store status=malformed key={} reason={reason}",
                        self.key
                    );
                    Vec::new()
                }
            },
            Ok(None) => {
                info!(
                    "event=slot_load module=store status=absent key={}",
                    self.key
                );
                Vec::new()
            }
            Err(err) => {
                warn!(
                    "event=slot_load module=store status=error key={} error={err}",
                    self.key
                );
                Vec::new()
            }
        };

        Some(tasks)
    }

    /// Writes the complete collection back to the slot.
    ///
    /// Fire-and-forget: failures degrade to a warn-level `slot_save` event
    /// and the in-memory state stays authoritative.
    pub fn save(&self, tasks: &[Task]) {
        let payload = match serde_json::to_string(tasks) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(
                    "event=slot_save module=store status=error key={} error=encode:{err}",
                    self.key
                );
                return;
            }
        };

        match self.store.write(&self.key, &payload) {
            Ok(()) => debug!(
                "event=slot_save module=store status=ok key={} count={}",
                self.key,
                tasks.len()
            ),
            Err(err) => warn!(
                "event=slot_save module=store status=error key={} error={err}",
                self.key
            ),
        }
    }
}

/// Decodes and validates a slot payload.
///
/// A payload that parses but violates record invariants (empty text,
/// duplicate ids) is malformed as a whole; partial salvage would mask the
/// corruption.
fn decode_tasks(payload: &str) -> Result<Vec<Task>, String> {
    let tasks: Vec<Task> =
        serde_json::from_str(payload).map_err(|err| format!("unparseable payload: {err}"))?;

    let mut seen: HashSet<TaskId> = HashSet::with_capacity(tasks.len());
    for task in &tasks {
        if task.text.trim().is_empty() {
            return Err(format!("record {} has empty text", task.id));
        }
        if !seen.insert(task.id) {
            return Err(format!("duplicate record id {}", task.id));
        }
    }

    Ok(tasks)
}
