//! Infrastructure adapters and runtime bootstrap.

pub mod error;
pub mod notifier;
pub mod telemetry;
pub mod vault;
pub mod watcher;
