//! Domain model for the task list.
//!
//! # Responsibility
//! - Define the canonical record shape shared by engine, store and views.
//!
//! # Invariants
//! - Every record is identified by a stable `TaskId`.
//! - Stored text is non-empty and trimmed; the normalization gate lives
//!   beside the record it protects.

pub mod task;
