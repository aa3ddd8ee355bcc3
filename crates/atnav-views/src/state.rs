//! The lifecycle every view goes through.

use std::fmt;

/// Where a view is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Idle,
    Resolving,
    Loading,
    Ready,
    Failed(String),
}

/// Something that happened to a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    /// The view was mounted.
    Start,
    /// The PDS endpoint is known and a session is open.
    Resolved,
    /// A fetch succeeded.
    Fetched,
    /// Resolution or a fetch failed.
    Failed(String),
}

impl ViewState {
    /// The state after `event`, or `None` if the transition is not allowed.
    ///
    /// "Load more" fetches from `Ready` (and retries from `Failed`), so
    /// `Fetched` is accepted in both.
    pub fn on(&self, event: &ViewEvent) -> Option<ViewState> {
        use ViewEvent as E;
        use ViewState as S;

        match (self, event) {
            (S::Idle, E::Start) => Some(S::Resolving),
            (S::Resolving, E::Resolved) => Some(S::Loading),
            (S::Loading | S::Ready | S::Failed(_), E::Fetched) => Some(S::Ready),
            (S::Resolving | S::Loading | S::Ready | S::Failed(_), E::Failed(message)) => {
                Some(S::Failed(message.clone()))
            }
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ViewState::Ready)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ViewState::Failed(_))
    }

    /// The failure message, if failed.
    pub fn failure(&self) -> Option<&str> {
        match self {
            ViewState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

impl fmt::Display for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewState::Idle => f.write_str("idle"),
            ViewState::Resolving => f.write_str("resolving"),
            ViewState::Loading => f.write_str("loading"),
            ViewState::Ready => f.write_str("ready"),
            ViewState::Failed(message) => write!(f, "failed: {message}"),
        }
    }
}
