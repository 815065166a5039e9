//! Data models for the application
//!
//! Jobs, session state snapshots and the language catalogue. All of these are
//! in-memory values; nothing here is persisted.

mod job;
mod language;
mod session;

pub use job::*;
pub use language::*;
pub use session::*;
