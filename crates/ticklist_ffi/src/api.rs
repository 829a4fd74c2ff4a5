//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Hold the process-wide list engine the UI drives.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Engine access is serialized behind a single lock; every call holds it
//!   briefly and never across another call.

use log::warn;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use ticklist_core::db::{open_db, open_db_in_memory};
use ticklist_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, FilterMode,
    SortOrder, SqliteSlotStore, SystemClock, TaskListEngine, TaskSlot, TASKS_SLOT_KEY,
};
use uuid::Uuid;

const LIST_DB_FILE_NAME: &str = "ticklist_tasks.sqlite3";
static LIST_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static ENGINE: OnceLock<Result<Mutex<ListEngine>, String>> = OnceLock::new();

type ListEngine = TaskListEngine<SqliteSlotStore, SystemClock>;

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - UI-thread safe for current implementation.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One task record as the UI renders it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    /// Stable task ID in string form.
    pub id: String,
    /// Trimmed task text.
    pub text: String,
    /// Completion state.
    pub completed: bool,
    /// Creation instant in epoch milliseconds.
    pub created_at_ms: i64,
    /// Whether the record is mid-exit-animation.
    pub exiting: bool,
}

/// Generic action response envelope for list command flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListActionResponse {
    /// Whether the call was accepted.
    pub ok: bool,
    /// Created or targeted task ID; `None` when nothing was acted on.
    pub task_id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ListActionResponse {
    fn success(message: impl Into<String>, task_id: Option<String>) -> Self {
        Self {
            ok: true,
            task_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            task_id: None,
            message: message.into(),
        }
    }
}

/// Response envelope for the commit pump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListTickResponse {
    /// Whether the call was accepted.
    pub ok: bool,
    /// Number of deferred commits that landed during this pump.
    pub committed: u32,
    /// Whether the celebration pulse is raised after this pump.
    pub celebration: bool,
    /// Next instant (epoch ms) at which a pump would observe work, if any.
    pub next_due_ms: Option<i64>,
    /// Human-readable response message for diagnostics.
    pub message: String,
}

/// Response envelope for the derived-view snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSnapshotResponse {
    /// Records in derived order.
    pub items: Vec<ListItem>,
    /// Records with `completed == false`, over the whole collection.
    pub active_count: u32,
    /// Records with `completed == true`, over the whole collection.
    pub completed_count: u32,
    /// Whether the celebration pulse is raised.
    pub celebration: bool,
    /// Whether the persisted collection has been loaded.
    pub loaded: bool,
    /// Human-readable response message for diagnostics.
    pub message: String,
}

/// Adds a task to the list.
///
/// # FFI contract
/// - Sync call, DB-backed persistence.
/// - Empty-after-trim text is a no-op: `ok = true` with `task_id = None`.
/// - Never panics; returns the created task ID on success.
#[flutter_rust_bridge::frb(sync)]
pub fn list_add(text: String) -> ListActionResponse {
    match with_engine(|engine| engine.add(&text)) {
        Ok(Some(id)) => ListActionResponse::success("Task added.", Some(id.to_string())),
        Ok(None) => {
            ListActionResponse::success("Nothing added; text is empty after trimming.", None)
        }
        Err(err) => ListActionResponse::failure(format!("list_add failed: {err}")),
    }
}

/// Requests a completion flip; the flip lands on a later `list_tick`.
///
/// # FFI contract
/// - Sync call; stages the commit and returns immediately.
/// - Malformed ids fail; well-formed unknown ids succeed as no-ops.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn list_toggle(id: String) -> ListActionResponse {
    let task_id = match parse_task_id(&id) {
        Ok(task_id) => task_id,
        Err(message) => return ListActionResponse::failure(message),
    };
    match with_engine(|engine| engine.toggle(task_id)) {
        Ok(()) => ListActionResponse::success("Toggle staged.", Some(id)),
        Err(err) => ListActionResponse::failure(format!("list_toggle failed: {err}")),
    }
}

/// Requests removal of a task; the removal lands on a later `list_tick`.
///
/// # FFI contract
/// - Sync call; stages the commit and returns immediately.
/// - Malformed ids fail; well-formed unknown ids succeed as no-ops.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn list_delete(id: String) -> ListActionResponse {
    let task_id = match parse_task_id(&id) {
        Ok(task_id) => task_id,
        Err(message) => return ListActionResponse::failure(message),
    };
    match with_engine(|engine| engine.delete(task_id)) {
        Ok(()) => ListActionResponse::success("Removal staged.", Some(id)),
        Err(err) => ListActionResponse::failure(format!("list_delete failed: {err}")),
    }
}

/// Requests removal of every completed task in one sweep.
///
/// # FFI contract
/// - Sync call; stages the commit and returns immediately.
/// - Membership is re-evaluated when the sweep lands, not now.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn list_clear_completed() -> ListActionResponse {
    match with_engine(|engine| engine.clear_completed()) {
        Ok(()) => ListActionResponse::success("Sweep staged.", None),
        Err(err) => ListActionResponse::failure(format!("list_clear_completed failed: {err}")),
    }
}

/// Lands every staged commit whose delay has expired.
///
/// Hosts pump this on their frame or timer cadence; `next_due_ms` tells
/// them when the next pump can do work.
///
/// # FFI contract
/// - Sync call, DB-backed persistence for landed commits.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn list_tick() -> ListTickResponse {
    match with_engine(|engine| {
        let committed = engine.tick();
        (committed, engine.celebration_active(), engine.next_due_ms())
    }) {
        Ok((committed, celebration, next_due_ms)) => ListTickResponse {
            ok: true,
            committed: committed as u32,
            celebration,
            next_due_ms,
            message: format!("{committed} commit(s) landed."),
        },
        Err(err) => ListTickResponse {
            ok: false,
            committed: 0,
            celebration: false,
            next_due_ms: None,
            message: format!("list_tick failed: {err}"),
        },
    }
}

/// Returns the derived view plus counts and signals.
///
/// Input semantics:
/// - `sort`: one of `newest|oldest|alphabetical|completed`.
/// - `filter`: one of `all|completed`.
/// Unknown values fall back to `newest`/`all` and are noted in `message`.
///
/// # FFI contract
/// - Sync call, read-only.
/// - Never panics; failure yields an empty snapshot with a message.
#[flutter_rust_bridge::frb(sync)]
pub fn list_snapshot(sort: String, filter: String) -> ListSnapshotResponse {
    let mut notes: Vec<String> = Vec::new();
    let sort = SortOrder::parse(sort.trim()).unwrap_or_else(|| {
        notes.push(format!("unknown sort `{sort}`; using newest"));
        SortOrder::Newest
    });
    let filter = FilterMode::parse(filter.trim()).unwrap_or_else(|| {
        notes.push(format!("unknown filter `{filter}`; using all"));
        FilterMode::All
    });

    match with_engine(|engine| {
        let items: Vec<ListItem> = engine
            .view(sort, filter)
            .into_iter()
            .map(|task| ListItem {
                id: task.id.to_string(),
                exiting: engine.is_exiting(task.id),
                text: task.text,
                completed: task.completed,
                created_at_ms: task.created_at,
            })
            .collect();
        (
            items,
            engine.active_count() as u32,
            engine.completed_count() as u32,
            engine.celebration_active(),
            engine.is_loaded(),
        )
    }) {
        Ok((items, active_count, completed_count, celebration, loaded)) => {
            let message = if notes.is_empty() {
                format!("{} task(s).", items.len())
            } else {
                notes.join("; ")
            };
            ListSnapshotResponse {
                items,
                active_count,
                completed_count,
                celebration,
                loaded,
                message,
            }
        }
        Err(err) => ListSnapshotResponse {
            items: Vec::new(),
            active_count: 0,
            completed_count: 0,
            celebration: false,
            loaded: false,
            message: format!("list_snapshot failed: {err}"),
        },
    }
}

fn parse_task_id(id: &str) -> Result<Uuid, String> {
    Uuid::parse_str(id.trim()).map_err(|err| format!("invalid task id `{id}`: {err}"))
}

fn resolve_list_db_path() -> PathBuf {
    LIST_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("TICKLIST_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(LIST_DB_FILE_NAME)
        })
        .clone()
}

fn file_store(path: &Path) -> Result<SqliteSlotStore, String> {
    let conn = open_db(path).map_err(|err| format!("db open failed: {err}"))?;
    SqliteSlotStore::try_new(conn).map_err(|err| format!("store init failed: {err}"))
}

fn memory_store() -> Result<SqliteSlotStore, String> {
    let conn = open_db_in_memory().map_err(|err| format!("db open failed: {err}"))?;
    SqliteSlotStore::try_new(conn).map_err(|err| format!("store init failed: {err}"))
}

fn build_engine() -> Result<Mutex<ListEngine>, String> {
    let path = resolve_list_db_path();
    let store = match file_store(&path) {
        Ok(store) => store,
        Err(err) => {
            // Degrade to a memory-backed list rather than a dead UI;
            // persistence is lost for this process.
            warn!(
                "event=engine_init module=ffi status=degraded path={} error={err}",
                path.display()
            );
            memory_store()?
        }
    };
    let mut engine = TaskListEngine::new(TaskSlot::new(store, TASKS_SLOT_KEY), SystemClock);
    engine.hydrate();
    Ok(Mutex::new(engine))
}

fn with_engine<T>(f: impl FnOnce(&mut ListEngine) -> T) -> Result<T, String> {
    match ENGINE.get_or_init(build_engine) {
        Ok(mutex) => match mutex.lock() {
            Ok(mut engine) => Ok(f(&mut engine)),
            Err(_) => Err("engine lock poisoned".to_string()),
        },
        Err(err) => Err(err.clone()),
    }
}
