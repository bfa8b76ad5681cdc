//! Turn rendered markdown notes into self-contained, portable HTML documents.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
