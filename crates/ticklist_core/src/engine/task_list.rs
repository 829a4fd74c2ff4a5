//! Task list engine: canonical collection plus deferred-commit scheduling.
//!
//! # Responsibility
//! - Own the canonical task collection, the exit-flag set, and the
//!   celebration pulse.
//! - Stage delayed mutations and land them in delay-expiry order when the
//!   host pumps [`TaskListEngine::tick`].
//! - Mirror every landed change to the durable slot.
//!
//! # Invariants
//! - Staged commits carry ids, never snapshots; every commit re-reads the
//!   collection at the instant it lands.
//! - Staged commits are not cancellable; competing commits on the same id
//!   land in `(due_at_ms, seq)` order.
//! - Nothing is written to the slot before hydration resolves.
//!
//! # See also
//! - [`crate::view`] for the pure derivation the engine exposes.
//! - [`crate::store::task_slot`] for load-once/save-on-change mechanics.

use std::collections::HashSet;

use log::{debug, info};

use crate::engine::clock::Clock;
use crate::model::task::{normalized_text, Task, TaskId};
use crate::store::slot_store::SlotStore;
use crate::store::task_slot::TaskSlot;
use crate::view::{self, FilterMode, SortOrder};

/// Delay between a toggle request and its completion flip landing.
pub const TOGGLE_COMMIT_DELAY_MS: i64 = 300;

/// Delay between a delete or clear-completed request and the records
/// leaving the collection.
pub const REMOVE_COMMIT_DELAY_MS: i64 = 400;

/// How long the celebration pulse stays raised after a triggering flip.
pub const CELEBRATION_PULSE_MS: i64 = 100;

/// Deferred mutation staged by the request phase of a two-phase operation.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PendingCommit {
    /// Flip `completed` on one record, then run the celebration check.
    ToggleFlip { id: TaskId },
    /// Drop one record from the collection.
    Remove { id: TaskId },
    /// Drop every record that is completed when the commit lands.
    RemoveCompleted,
}

impl PendingCommit {
    fn kind(&self) -> &'static str {
        match self {
            Self::ToggleFlip { .. } => "toggle_flip",
            Self::Remove { .. } => "remove",
            Self::RemoveCompleted => "remove_completed",
        }
    }
}

/// A staged commit with its expiry instant and scheduling order.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ScheduledCommit {
    due_at_ms: i64,
    seq: u64,
    commit: PendingCommit,
}

/// Canonical task collection with two-phase mutations.
///
/// Mutations that play an exit animation are split in two: the request
/// phase flags the record as exiting and stages a commit, and the commit
/// lands once its delay expires and a [`tick`](Self::tick) observes it.
/// Hosts pump `tick` on their frame or timer cadence;
/// [`next_due_ms`](Self::next_due_ms) tells them when the next pump can
/// do work.
pub struct TaskListEngine<S: SlotStore, C: Clock> {
    slot: TaskSlot<S>,
    clock: C,
    tasks: Vec<Task>,
    exiting: HashSet<TaskId>,
    pending: Vec<ScheduledCommit>,
    next_seq: u64,
    celebration_off_at: Option<i64>,
    draft: String,
}

impl<S: SlotStore, C: Clock> TaskListEngine<S, C> {
    /// Creates an engine over a task slot.
    ///
    /// Call [`hydrate`](Self::hydrate) before relying on persisted state;
    /// until it resolves, mutations stay in memory only.
    pub fn new(slot: TaskSlot<S>, clock: C) -> Self {
        Self {
            slot,
            clock,
            tasks: Vec::new(),
            exiting: HashSet::new(),
            pending: Vec::new(),
            next_seq: 0,
            celebration_off_at: None,
            draft: String::new(),
        }
    }

    /// Loads the persisted collection into memory.
    ///
    /// # Contract
    /// - The first call replaces the in-memory collection with the stored
    ///   one; absent or malformed payloads resolve to an empty collection.
    /// - Later calls are no-ops; the slot loads once.
    /// - After this resolves, landed changes start mirroring to the slot.
    pub fn hydrate(&mut self) {
        if let Some(tasks) = self.slot.load() {
            info!(
                "event=engine_hydrate module=engine status=ok key={} count={}",
                self.slot.key(),
                tasks.len()
            );
            self.tasks = tasks;
        }
    }

    /// Adds a new record to the front of the collection.
    ///
    /// # Contract
    /// - `text` is trimmed; an empty result rejects the add with no state
    ///   change and no error.
    /// - Accepted records get a fresh id, `completed = false`, and
    ///   `created_at` from the engine clock.
    /// - A successful add clears the draft buffer and mirrors the
    ///   collection immediately; there is no deferred phase.
    pub fn add(&mut self, text: &str) -> Option<TaskId> {
        let Some(text) = normalized_text(text) else {
            debug!("event=task_add module=engine status=rejected reason=empty_text");
            return None;
        };

        let task = Task::new(text, self.clock.now_ms());
        let id = task.id;
        self.tasks.insert(0, task);
        self.draft.clear();
        self.persist();
        info!(
            "event=task_add module=engine status=ok id={id} count={}",
            self.tasks.len()
        );
        Some(id)
    }

    /// Requests a completion flip for `id`.
    ///
    /// The record is flagged as exiting right away; the flip itself lands
    /// [`TOGGLE_COMMIT_DELAY_MS`] later, clearing the flag and running the
    /// celebration check against the post-flip collection. Unknown ids are
    /// ignored.
    pub fn toggle(&mut self, id: TaskId) {
        if !self.contains(id) {
            debug!("event=task_toggle module=engine status=ignored reason=unknown_id id={id}");
            return;
        }
        self.exiting.insert(id);
        let due_at_ms = self.schedule(PendingCommit::ToggleFlip { id }, TOGGLE_COMMIT_DELAY_MS);
        debug!("event=task_toggle module=engine status=scheduled id={id} due_at_ms={due_at_ms}");
    }

    /// Requests removal of `id`.
    ///
    /// The record is flagged as exiting right away and leaves the
    /// collection [`REMOVE_COMMIT_DELAY_MS`] later. The exit flag is never
    /// cleared afterwards; absence from the collection is the terminal
    /// signal. Unknown ids are ignored.
    pub fn delete(&mut self, id: TaskId) {
        if !self.contains(id) {
            debug!("event=task_delete module=engine status=ignored reason=unknown_id id={id}");
            return;
        }
        self.exiting.insert(id);
        let due_at_ms = self.schedule(PendingCommit::Remove { id }, REMOVE_COMMIT_DELAY_MS);
        debug!("event=task_delete module=engine status=scheduled id={id} due_at_ms={due_at_ms}");
    }

    /// Requests removal of every completed record.
    ///
    /// Records completed right now are flagged as exiting; the sweep lands
    /// [`REMOVE_COMMIT_DELAY_MS`] later in one commit and re-evaluates
    /// completion against the collection as it is then, not as it is now.
    pub fn clear_completed(&mut self) {
        let flagged: Vec<TaskId> = self
            .tasks
            .iter()
            .filter(|task| task.completed)
            .map(|task| task.id)
            .collect();
        self.exiting.extend(flagged.iter().copied());
        let due_at_ms = self.schedule(PendingCommit::RemoveCompleted, REMOVE_COMMIT_DELAY_MS);
        debug!(
            "event=clear_completed module=engine status=scheduled flagged={} due_at_ms={due_at_ms}",
            flagged.len()
        );
    }

    /// Lands every staged commit whose delay has expired.
    ///
    /// Commits land in `(due_at_ms, seq)` order, so competing commits on
    /// the same id resolve by delay expiry. Afterwards the celebration
    /// pulse is dropped if its off instant has passed. Returns the number
    /// of commits landed.
    ///
    /// # Side effects
    /// - Mutates the collection and mirrors each landed change to the slot.
    pub fn tick(&mut self) -> usize {
        let now = self.clock.now_ms();
        let mut landed = 0;

        while let Some(index) = self.next_due_index(now) {
            let scheduled = self.pending.swap_remove(index);
            debug!(
                "event=commit_landed module=engine kind={} seq={} due_at_ms={}",
                scheduled.commit.kind(),
                scheduled.seq,
                scheduled.due_at_ms
            );
            self.run_commit(scheduled.commit, now);
            landed += 1;
        }

        if let Some(off_at) = self.celebration_off_at {
            if off_at <= now {
                self.celebration_off_at = None;
                info!("event=celebration module=engine status=off");
            }
        }

        landed
    }

    /// Earliest instant at which a tick would observe work, if any.
    pub fn next_due_ms(&self) -> Option<i64> {
        let staged = self.pending.iter().map(|commit| commit.due_at_ms).min();
        match (staged, self.celebration_off_at) {
            (Some(commit), Some(off)) => Some(commit.min(off)),
            (Some(commit), None) => Some(commit),
            (None, Some(off)) => Some(off),
            (None, None) => None,
        }
    }

    /// Derives the consumer-facing list for `sort` and `filter`.
    ///
    /// Pure with respect to engine state; exit flags are reported
    /// separately via [`is_exiting`](Self::is_exiting).
    pub fn view(&self, sort: SortOrder, filter: FilterMode) -> Vec<Task> {
        view::derive(&self.tasks, sort, filter)
    }

    /// Number of records not yet completed, computed fresh on every call.
    pub fn active_count(&self) -> usize {
        self.tasks.iter().filter(|task| !task.completed).count()
    }

    /// Number of completed records, computed fresh on every call.
    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|task| task.completed).count()
    }

    /// Canonical collection in insertion order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Whether `id` is currently flagged as exiting.
    ///
    /// Presence here is independent of collection membership; a deleted
    /// record keeps its flag after removal.
    pub fn is_exiting(&self, id: TaskId) -> bool {
        self.exiting.contains(&id)
    }

    /// Number of ids currently flagged as exiting.
    pub fn exiting_count(&self) -> usize {
        self.exiting.len()
    }

    /// Number of staged commits that have not landed yet.
    pub fn pending_commits(&self) -> usize {
        self.pending.len()
    }

    /// Whether the celebration pulse is currently raised.
    pub fn celebration_active(&self) -> bool {
        self.celebration_off_at.is_some()
    }

    /// Whether the persisted collection has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.slot.is_loaded()
    }

    /// Replaces the draft buffer.
    pub fn set_draft(&mut self, text: &str) {
        self.draft.clear();
        self.draft.push_str(text);
    }

    /// Current draft buffer contents.
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Submits the draft buffer through [`add`](Self::add).
    pub fn submit_draft(&mut self) -> Option<TaskId> {
        let text = self.draft.clone();
        self.add(&text)
    }

    fn contains(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|task| task.id == id)
    }

    fn schedule(&mut self, commit: PendingCommit, delay_ms: i64) -> i64 {
        let due_at_ms = self.clock.now_ms() + delay_ms;
        self.pending.push(ScheduledCommit {
            due_at_ms,
            seq: self.next_seq,
            commit,
        });
        self.next_seq += 1;
        due_at_ms
    }

    fn next_due_index(&self, now: i64) -> Option<usize> {
        self.pending
            .iter()
            .enumerate()
            .filter(|(_, scheduled)| scheduled.due_at_ms <= now)
            .min_by_key(|(_, scheduled)| (scheduled.due_at_ms, scheduled.seq))
            .map(|(index, _)| index)
    }

    fn run_commit(&mut self, commit: PendingCommit, now: i64) {
        match commit {
            PendingCommit::ToggleFlip { id } => {
                let flipped = match self.tasks.iter_mut().find(|task| task.id == id) {
                    Some(task) => {
                        task.completed = !task.completed;
                        true
                    }
                    None => false,
                };
                if flipped {
                    self.persist();
                    info!("event=task_toggle module=engine status=ok id={id}");
                    if !self.tasks.is_empty() && self.tasks.iter().all(|task| task.completed) {
                        let off_at = now + CELEBRATION_PULSE_MS;
                        self.celebration_off_at = Some(off_at);
                        info!("event=celebration module=engine status=on off_at_ms={off_at}");
                    }
                } else {
                    debug!(
                        "event=task_toggle module=engine status=ignored reason=vanished_id id={id}"
                    );
                }
                // A landed flip settles the record either way.
                self.exiting.remove(&id);
            }
            PendingCommit::Remove { id } => {
                let before = self.tasks.len();
                self.tasks.retain(|task| task.id != id);
                if self.tasks.len() != before {
                    self.persist();
                    info!(
                        "event=task_delete module=engine status=ok id={id} count={}",
                        self.tasks.len()
                    );
                } else {
                    debug!(
                        "event=task_delete module=engine status=ignored reason=vanished_id id={id}"
                    );
                }
                // Exit flag stays; absence from the collection is terminal.
            }
            PendingCommit::RemoveCompleted => {
                let before = self.tasks.len();
                self.tasks.retain(|task| !task.completed);
                let removed = before - self.tasks.len();
                if removed > 0 {
                    self.persist();
                }
                info!(
                    "event=clear_completed module=engine status=ok removed={removed} count={}",
                    self.tasks.len()
                );
            }
        }
    }

    fn persist(&self) {
        if !self.slot.is_loaded() {
            debug!("event=persist module=engine status=skipped reason=not_loaded");
            return;
        }
        self.slot.save(&self.tasks);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::{
        PendingCommit, TaskListEngine, REMOVE_COMMIT_DELAY_MS, TOGGLE_COMMIT_DELAY_MS,
    };
    use crate::engine::clock::ManualClock;
    use crate::store::slot_store::{SlotStore, StoreResult};
    use crate::store::task_slot::TaskSlot;
    use crate::view::{FilterMode, SortOrder};

    struct MemoryStore {
        slots: RefCell<HashMap<String, String>>,
    }

    impl MemoryStore {
        fn new() -> Self {
            Self {
                slots: RefCell::new(HashMap::new()),
            }
        }
    }

    impl SlotStore for MemoryStore {
        fn read(&self, key: &str) -> StoreResult<Option<String>> {
            Ok(self.slots.borrow().get(key).cloned())
        }

        fn write(&self, key: &str, payload: &str) -> StoreResult<()> {
            self.slots
                .borrow_mut()
                .insert(key.to_string(), payload.to_string());
            Ok(())
        }
    }

    fn engine_at(start_ms: i64) -> (TaskListEngine<MemoryStore, ManualClock>, ManualClock) {
        let clock = ManualClock::new(start_ms);
        let slot = TaskSlot::new(MemoryStore::new(), "tasks");
        let mut engine = TaskListEngine::new(slot, clock.clone());
        engine.hydrate();
        (engine, clock)
    }

    #[test]
    fn add_prepends_and_clears_draft() {
        let (mut engine, clock) = engine_at(1_000);

        engine.set_draft("first");
        engine.submit_draft().unwrap();
        clock.advance(10);
        engine.set_draft("second");
        engine.submit_draft().unwrap();

        let texts: Vec<&str> = engine.tasks().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["second", "first"]);
        assert_eq!(engine.draft(), "");
    }

    #[test]
    fn whitespace_only_text_is_rejected() {
        let (mut engine, _clock) = engine_at(0);

        assert!(engine.add("   \t ").is_none());
        assert!(engine.tasks().is_empty());
    }

    #[test]
    fn rejected_add_keeps_the_draft() {
        let (mut engine, _clock) = engine_at(0);

        engine.set_draft("  ");
        assert!(engine.submit_draft().is_none());
        assert_eq!(engine.draft(), "  ");
    }

    #[test]
    fn toggle_flip_waits_for_its_delay() {
        let (mut engine, clock) = engine_at(0);
        let id = engine.add("pay rent").unwrap();

        engine.toggle(id);
        assert!(engine.is_exiting(id));

        clock.advance(TOGGLE_COMMIT_DELAY_MS - 1);
        assert_eq!(engine.tick(), 0);
        assert!(!engine.tasks()[0].completed);
        assert!(engine.is_exiting(id));

        clock.advance(1);
        assert_eq!(engine.tick(), 1);
        assert!(engine.tasks()[0].completed);
        assert!(!engine.is_exiting(id));
    }

    #[test]
    fn competing_commits_land_in_expiry_order() {
        // toggle at t=0 (due 300) then delete at t=0 (due 400): the flip
        // lands first and settles the exit flag, the removal lands second,
        // and the record ends up gone.
        let (mut engine, clock) = engine_at(0);
        let id = engine.add("stale").unwrap();

        engine.toggle(id);
        engine.delete(id);
        assert_eq!(engine.pending_commits(), 2);

        clock.advance(REMOVE_COMMIT_DELAY_MS);
        assert_eq!(engine.tick(), 2);
        assert!(engine.tasks().is_empty());
        assert!(!engine.is_exiting(id));
        // The flip completed the whole one-record collection for an
        // instant, so the pulse is raised even though the record is gone.
        assert!(engine.celebration_active());
    }

    #[test]
    fn next_due_index_prefers_earlier_due_then_lower_seq() {
        use crate::engine::clock::Clock;

        let (mut engine, clock) = engine_at(0);
        let first = engine.add("one").unwrap();
        let second = engine.add("two").unwrap();

        engine.delete(first);
        engine.delete(second);
        clock.advance(REMOVE_COMMIT_DELAY_MS);

        let index = engine.next_due_index(clock.now_ms()).unwrap();
        assert_eq!(
            engine.pending[index].commit,
            PendingCommit::Remove { id: first }
        );
    }

    #[test]
    fn next_due_ms_reports_earliest_staged_instant() {
        let (mut engine, _clock) = engine_at(0);
        let id = engine.add("soon").unwrap();

        assert_eq!(engine.next_due_ms(), None);
        engine.delete(id);
        engine.toggle(id);
        assert_eq!(engine.next_due_ms(), Some(TOGGLE_COMMIT_DELAY_MS));
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let (mut engine, _clock) = engine_at(0);
        engine.add("keep me").unwrap();

        engine.toggle(uuid::Uuid::new_v4());
        engine.delete(uuid::Uuid::new_v4());

        assert_eq!(engine.pending_commits(), 0);
        assert_eq!(engine.exiting_count(), 0);
    }

    #[test]
    fn view_reports_counts_and_order() {
        let (mut engine, clock) = engine_at(0);
        let milk = engine.add("buy milk").unwrap();
        clock.advance(5);
        engine.add("walk dog").unwrap();

        engine.toggle(milk);
        clock.advance(TOGGLE_COMMIT_DELAY_MS);
        engine.tick();

        let view = engine.view(SortOrder::Completed, FilterMode::All);
        let texts: Vec<&str> = view.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["walk dog", "buy milk"]);
        assert_eq!(engine.active_count(), 1);
        assert_eq!(engine.completed_count(), 1);
    }
}
