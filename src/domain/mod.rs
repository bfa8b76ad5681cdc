//! Domain layer types and invariants.

pub mod asset;
pub mod error;
pub mod event;
pub mod file;
pub mod options;
pub mod theme;
