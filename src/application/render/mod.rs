//! Markdown rendering into a detached container, with quiet-period detection.
//!
//! The renderer populates the container asynchronously; the settle detector
//! decides when the tree is usable and hands back an owned copy of it.

mod container;
mod preprocess;
mod settle;
mod types;
mod vault;

pub use container::{RenderContainer, RenderScope};
pub use preprocess::preprocess_markdown;
pub use settle::{SettleDetector, SettleOutcome, container_root};
pub use types::{
    BlockContext, BlockPostProcessor, MarkdownRenderer, RenderError, RenderRequest,
};
pub use vault::{BACKLINK_GLYPH, VaultRenderer};
