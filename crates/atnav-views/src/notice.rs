//! The single notice slot shown above the active view.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::trace;

/// Notice shown while a view resolves or fetches.
pub const LOADING: &str = "Loading...";

struct Inner {
    generation: AtomicU64,
    notice: watch::Sender<String>,
}

/// Owner of the notice slot and the mount generation.
///
/// Views never write to the board directly; they go through a
/// [`MountHandle`] whose writes are dropped once another view has mounted.
#[derive(Clone)]
pub struct NoticeBoard {
    inner: Arc<Inner>,
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                generation: AtomicU64::new(0),
                notice: watch::Sender::new(String::new()),
            }),
        }
    }

    /// Watch the notice text.
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.inner.notice.subscribe()
    }

    /// The notice text right now.
    pub fn current(&self) -> String {
        self.inner.notice.borrow().clone()
    }

    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    /// A handle bound to the current mount, without starting a new one.
    pub fn handle(&self) -> MountHandle {
        MountHandle {
            board: self.clone(),
            generation: self.generation(),
        }
    }

    /// Start a new mount: every older handle goes stale and the slot is
    /// cleared.
    pub(crate) fn begin_mount(&self) -> MountHandle {
        let mut generation = 0;
        // Bump and clear under the channel lock so a guarded write can't
        // slip in between.
        self.inner.notice.send_modify(|notice| {
            generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
            notice.clear();
        });
        trace!(generation, "mount");
        MountHandle {
            board: self.clone(),
            generation,
        }
    }

    fn write_if_current(&self, generation: u64, text: &str) -> bool {
        let mut written = false;
        self.inner.notice.send_if_modified(|notice| {
            if self.inner.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            written = true;
            if notice.as_str() == text {
                return false;
            }
            notice.clear();
            notice.push_str(text);
            true
        });
        written
    }
}

/// Write access to the notice slot for one mount.
#[derive(Clone)]
pub struct MountHandle {
    board: NoticeBoard,
    generation: u64,
}

impl MountHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether no newer view has mounted since this handle was issued.
    pub fn is_current(&self) -> bool {
        self.board.generation() == self.generation
    }

    /// Replace the notice. Returns `false` (and writes nothing) when stale.
    pub fn set_notice(&self, text: &str) -> bool {
        self.board.write_if_current(self.generation, text)
    }

    pub fn clear_notice(&self) -> bool {
        self.set_notice("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mount_clears_notice() {
        let board = NoticeBoard::new();
        let first = board.begin_mount();
        assert!(first.set_notice(LOADING));
        assert_eq!(board.current(), LOADING);

        let _second = board.begin_mount();
        assert_eq!(board.current(), "");
    }

    #[test]
    fn test_stale_handle_cannot_write() {
        let board = NoticeBoard::new();
        let first = board.begin_mount();
        let second = board.begin_mount();

        assert!(!first.is_current());
        assert!(!first.set_notice("Could not resolve PDS"));
        assert_eq!(board.current(), "");

        assert!(second.set_notice(LOADING));
        assert!(!first.clear_notice());
        assert_eq!(board.current(), LOADING);
    }

    #[test]
    fn test_handle_does_not_bump() {
        let board = NoticeBoard::new();
        let mounted = board.begin_mount();
        let handle = board.handle();

        assert_eq!(handle.generation(), mounted.generation());
        assert!(mounted.is_current());
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let board = NoticeBoard::new();
        let mut rx = board.subscribe();
        let handle = board.begin_mount();

        handle.set_notice(LOADING);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), LOADING);
    }
}
