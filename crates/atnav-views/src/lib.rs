//! Navigation engine for browsing ATProto repositories.
//!
//! A [`Navigator`] mounts one view at a time for a [`Route`]. Each view is an
//! explicit state machine (`Idle → Resolving → Loading → Ready | Failed`)
//! that resolves the repository's PDS when needed, opens a fresh XRPC
//! session and fetches what it displays.
//!
//! Views report progress through a single notice slot. Every mount gets a
//! generation number and a view only writes to the slot while its
//! generation is current, so a slow request from a discarded view can never
//! overwrite what the active view shows.

mod error;
mod navigator;
mod notice;
mod render;
mod route;
mod state;
pub mod views;

pub use error::ViewError;
pub use navigator::{INPUT_RESOLUTION_FAILED, Navigator};
pub use notice::{LOADING, MountHandle, NoticeBoard};
pub use render::{ListItem, ValueRenderer};
pub use route::{Crumb, RESOLVE_SENTINEL, Route, RouteError, Server, ViewKind};
pub use state::{ViewEvent, ViewState};
pub use views::{CollectionView, RecordView, RepositoryView, ServerView, View};
