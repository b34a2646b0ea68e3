//! Annotation session: item and frame navigation, existing-data preload,
//! and the submit-and-advance protocol shared by all tools.
//!
//! The controller never performs I/O itself. Operations queue [`Request`]s
//! tagged with a [`Ticket`]; whoever executes them hands the result back
//! through [`SessionController::complete`], in any order. Work the browser
//! client deferred to its next tick is queued and run by
//! [`SessionController::tick`].

mod controller;
mod request;
mod tool;

#[cfg(test)]
mod tests;

pub use controller::{NavMode, SessionConfig, SessionController};
pub use request::{ItemFormat, Method, Payload, Purpose, Request, Ticket, ToolPurpose};
pub use tool::{ToolAdapter, ToolCommand, ToolContext};

/// Millisecond timestamp appended to item fetches so caches never answer them.
pub(crate) fn cache_bust() -> u64 {
    web_time::SystemTime::now()
        .duration_since(web_time::SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
