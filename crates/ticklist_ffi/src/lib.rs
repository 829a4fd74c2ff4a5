//! UI-facing bridge crate for Ticklist.
//! Exposes the core list engine to Dart through flutter_rust_bridge.

pub mod api;
pub mod embed;
