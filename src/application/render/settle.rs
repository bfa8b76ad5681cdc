//! Quiet-period detection for incrementally populated renders.
//!
//! Renderers give no reliable "done" signal: blocks keep arriving while
//! post-processors finish. The detector treats the tree as stable once a full
//! settle delay passes without a block-completion signal. This is a heuristic;
//! a processor that stalls longer than the delay is cut off, and a hard ceiling
//! bounds the wait for renderers that never go quiet.

use std::time::Duration;

use tokio::{
    sync::watch,
    time::{Instant, timeout_at},
};
use tracing::{debug, warn};

use crate::application::dom::Element;

use super::{
    container::{RenderContainer, RenderScope},
    types::{MarkdownRenderer, RenderError},
};

const PREVIEW_CLASSES: &str = "markdown-preview-view markdown-rendered";

/// How a wait for the quiet period ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleOutcome {
    Settled { waited: Duration },
    CeilingReached { waited: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleDetector {
    settle_delay: Duration,
    max_wait: Duration,
}

impl SettleDetector {
    pub fn new(settle_delay: Duration, max_wait: Duration) -> Self {
        Self {
            settle_delay,
            max_wait: max_wait.max(settle_delay),
        }
    }

    /// Render `markdown` into a fresh detached container, wait for it to go
    /// quiet and return a deep copy of the result. Outstanding renderer tasks
    /// are aborted before returning.
    pub async fn render(
        &self,
        renderer: &dyn MarkdownRenderer,
        markdown: &str,
        source_path: &str,
    ) -> Result<Element, RenderError> {
        let container = RenderContainer::detached(container_root());
        let scope = RenderScope::new();
        let mut signals = container.subscribe();

        renderer
            .render(markdown, &container, source_path, &scope)
            .await?;

        let outcome = self.until_settled(&mut signals).await;
        let tree = container.snapshot();
        let pending = scope.unload();

        match outcome {
            SettleOutcome::Settled { waited } => debug!(
                target = "application::render::settle",
                op = "render",
                result = "settled",
                source_path,
                blocks = tree.children.len(),
                waited_ms = waited.as_millis() as u64,
                aborted_tasks = pending,
                "render settled"
            ),
            SettleOutcome::CeilingReached { waited } => warn!(
                target = "application::render::settle",
                op = "render",
                result = "ceiling",
                source_path,
                blocks = tree.children.len(),
                waited_ms = waited.as_millis() as u64,
                aborted_tasks = pending,
                "render did not go quiet before the maximum wait; using current tree"
            ),
        }

        Ok(tree)
    }

    /// Wait until a full settle delay elapses without a new signal. Signals
    /// raised before the call count as already seen.
    pub async fn until_settled(&self, signals: &mut watch::Receiver<u64>) -> SettleOutcome {
        signals.borrow_and_update();
        let started = Instant::now();
        let deadline = started + self.max_wait;

        loop {
            let now = Instant::now();
            if now >= deadline {
                return SettleOutcome::CeilingReached {
                    waited: now - started,
                };
            }
            let quiet_until = now + self.settle_delay;
            let wake_at = quiet_until.min(deadline);

            match timeout_at(wake_at, signals.changed()).await {
                Ok(Ok(())) => {
                    signals.borrow_and_update();
                }
                // The sender is gone, so the tree cannot change any more.
                Ok(Err(_)) => {
                    return SettleOutcome::Settled {
                        waited: Instant::now() - started,
                    };
                }
                Err(_) if wake_at == quiet_until => {
                    return SettleOutcome::Settled {
                        waited: Instant::now() - started,
                    };
                }
                Err(_) => {
                    return SettleOutcome::CeilingReached {
                        waited: Instant::now() - started,
                    };
                }
            }
        }
    }
}

/// Hidden root the renderer populates, shaped like the live preview wrapper.
pub fn container_root() -> Element {
    Element::new("div")
        .with_attr("class", PREVIEW_CLASSES)
        .with_attr("style", "display: none")
}
