use std::{
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tokio::{sync::watch, task::JoinSet};

use crate::application::dom::{Element, Node};

/// Detached render target. Every append or replacement of a top-level block
/// bumps a generation counter that settle detection watches.
#[derive(Debug, Clone)]
pub struct RenderContainer {
    inner: Arc<ContainerInner>,
}

#[derive(Debug)]
struct ContainerInner {
    root: Mutex<Element>,
    signal: watch::Sender<u64>,
}

impl RenderContainer {
    pub fn detached(root: Element) -> Self {
        let (signal, _) = watch::channel(0);
        Self {
            inner: Arc::new(ContainerInner {
                root: Mutex::new(root),
                signal,
            }),
        }
    }

    /// Append a finished block and return its index.
    pub fn append_block(&self, block: impl Into<Node>) -> usize {
        let index = {
            let mut root = self.lock();
            root.children.push(block.into());
            root.children.len() - 1
        };
        self.signal_block();
        index
    }

    /// Replace the block at `index`; returns false when there is no such block.
    pub fn replace_block(&self, index: usize, block: impl Into<Node>) -> bool {
        let replaced = {
            let mut root = self.lock();
            match root.children.get_mut(index) {
                Some(slot) => {
                    *slot = block.into();
                    true
                }
                None => false,
            }
        };
        if replaced {
            self.signal_block();
        }
        replaced
    }

    pub fn block_count(&self) -> usize {
        self.lock().children.len()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.signal.subscribe()
    }

    /// Deep copy of the current tree.
    pub fn snapshot(&self) -> Element {
        self.lock().clone()
    }

    fn signal_block(&self) {
        self.inner.signal.send_modify(|generation| *generation += 1);
    }

    fn lock(&self) -> MutexGuard<'_, Element> {
        self.inner.root.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Lifetime handle for work a renderer spawns while populating a container.
/// Unloading (or dropping) the scope aborts whatever is still running.
#[derive(Debug, Default)]
pub struct RenderScope {
    tasks: Mutex<JoinSet<()>>,
}

impl RenderScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .spawn(task);
    }

    /// Abort outstanding tasks and return how many had not finished.
    pub fn unload(self) -> usize {
        let mut tasks = self.tasks.into_inner().unwrap_or_else(PoisonError::into_inner);
        while tasks.try_join_next().is_some() {}
        let pending = tasks.len();
        tasks.abort_all();
        pending
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn appends_and_replaces_blocks_with_signals() {
        let container = RenderContainer::detached(Element::new("div"));
        let receiver = container.subscribe();

        let first = container.append_block(Element::new("p").with_text("a"));
        let second = container.append_block(Element::new("p").with_text("b"));
        assert_eq!((first, second), (0, 1));
        assert!(container.replace_block(1, Element::new("h2").with_text("c")));
        assert!(!container.replace_block(7, Element::new("p")));

        assert_eq!(*receiver.borrow(), 3);
        assert_eq!(container.snapshot().inner_html(), "<p>a</p><h2>c</h2>");
    }

    #[test]
    fn snapshot_is_detached_from_later_changes() {
        let container = RenderContainer::detached(Element::new("div"));
        container.append_block(Element::new("p"));
        let snapshot = container.snapshot();
        container.append_block(Element::new("p"));
        assert_eq!(snapshot.children.len(), 1);
        assert_eq!(container.block_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn unload_aborts_pending_tasks() {
        let scope = RenderScope::new();
        let container = RenderContainer::detached(Element::new("div"));
        let late = container.clone();
        scope.spawn(async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            late.append_block(Element::new("p"));
        });
        scope.spawn(async {});
        tokio::task::yield_now().await;

        assert_eq!(scope.unload(), 1);
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(container.block_count(), 0);
    }
}
