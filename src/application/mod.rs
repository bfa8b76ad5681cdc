//! Copy pipeline: rendering, structural clean-up, asset inlining and
//! document assembly.

pub mod assets;
pub mod copy;
pub mod document;
pub mod dom;
pub mod error;
pub mod pipeline;
pub mod preview;
pub mod render;
pub mod transform;
pub mod vault;
