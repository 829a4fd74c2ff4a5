//! Embedding signal wire contract.
//!
//! # Responsibility
//! - Build the outbound resize notice an embedded UI host posts to its
//!   parent context.
//!
//! # Invariants
//! - Outbound only; no inbound messages are parsed.

use serde::Serialize;

/// Wire shape of the resize notice.
#[derive(Debug, Clone, Copy, Serialize)]
struct ResizeNotice {
    #[serde(rename = "type")]
    kind: &'static str,
    height: u32,
}

/// Builds the `iframe-resize` message for a UI host embedded in a parent
/// context.
///
/// # FFI contract
/// - Sync call, pure.
/// - Never panics; returns a UTF-8 JSON object string.
#[flutter_rust_bridge::frb(sync)]
pub fn resize_notice(height: u32) -> String {
    serde_json::to_string(&ResizeNotice {
        kind: "iframe-resize",
        height,
    })
    .unwrap_or_default()
}
