//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `ticklist_core` wiring
//!   independently from the Flutter/FFI runtime.
//! - Keep output deterministic for quick local sanity checks.

use std::error::Error;

use ticklist_core::db::open_db_in_memory;
use ticklist_core::{
    FilterMode, ManualClock, SortOrder, SqliteSlotStore, TaskListEngine, TaskSlot,
    TASKS_SLOT_KEY, TOGGLE_COMMIT_DELAY_MS,
};

fn main() -> Result<(), Box<dyn Error>> {
    println!("ticklist_core version={}", ticklist_core::core_version());

    let store = SqliteSlotStore::try_new(open_db_in_memory()?)?;
    let clock = ManualClock::new(0);
    let mut engine = TaskListEngine::new(TaskSlot::new(store, TASKS_SLOT_KEY), clock.clone());
    engine.hydrate();

    let milk = engine
        .add("buy milk")
        .ok_or("add rejected non-empty text")?;
    engine.add("walk dog").ok_or("add rejected non-empty text")?;

    engine.toggle(milk);
    clock.advance(TOGGLE_COMMIT_DELAY_MS);
    let landed = engine.tick();

    println!("tasks={}", engine.tasks().len());
    println!("commits={landed}");
    println!("active={}", engine.active_count());
    println!("completed={}", engine.completed_count());
    for task in engine.view(SortOrder::Completed, FilterMode::All) {
        println!("task text={:?} completed={}", task.text, task.completed);
    }

    Ok(())
}
