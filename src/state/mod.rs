//! Durable last-known-state storage: a keyed text file rewritten atomically
//! on every update.

pub mod format;
pub mod store;

pub use store::StateStore;
