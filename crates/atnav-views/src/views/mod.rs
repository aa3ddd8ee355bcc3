//! One view per navigation depth.
//!
//! Every view follows the same sequence on [`load`](View::load):
//!
//! 1. `Idle → Resolving` with the loading notice. A route carrying a literal
//!    PDS host skips straight to step 3.
//! 2. Resolve the identifier to its PDS. Failure ends in `Failed` with
//!    "Could not resolve PDS".
//! 3. `Resolving → Loading`: open a fresh session on the endpoint.
//! 4. Make the view's call and land in `Ready` or `Failed`.
//!
//! After every `.await` the view checks its mount is still current before
//! touching its state or the notice. A superseded view returns
//! [`ViewError::Superseded`] and leaves everything alone.

mod collection;
mod record;
mod repository;
mod server;

use std::sync::Arc;

use atnav_atproto::{
    AtprotoError, IdentityResolver, ListingAccumulator, ListingQuery, PageOutcome, RepositoryRpc,
    SessionFactory, fetch_page,
};
use tracing::{debug, info};

use crate::notice::{LOADING, MountHandle};
use crate::render::{ListItem, ValueRenderer};
use crate::route::{Crumb, Route, ViewKind};
use crate::ViewError;
use crate::state::{ViewEvent, ViewState};

pub use collection::CollectionView;
pub use record::RecordView;
pub use repository::RepositoryView;
pub use server::ServerView;

/// What every view shares: its route, its mount and its lifecycle.
pub(crate) struct ViewContext {
    route: Route,
    mount: MountHandle,
    resolver: IdentityResolver,
    sessions: Arc<dyn SessionFactory>,
    state: ViewState,
    endpoint: Option<String>,
}

impl ViewContext {
    pub(crate) fn new(
        route: Route,
        mount: MountHandle,
        resolver: IdentityResolver,
        sessions: Arc<dyn SessionFactory>,
    ) -> Self {
        Self {
            route,
            mount,
            resolver,
            sessions,
            state: ViewState::Idle,
            endpoint: None,
        }
    }

    pub(crate) fn route(&self) -> &Route {
        &self.route
    }

    pub(crate) fn state(&self) -> &ViewState {
        &self.state
    }

    /// The repository identifier, empty for server routes.
    pub(crate) fn identifier(&self) -> &str {
        self.route.identifier().unwrap_or_default()
    }

    /// PDS host without scheme, once known.
    pub(crate) fn endpoint_host(&self) -> Option<&str> {
        self.endpoint.as_deref().map(|endpoint| {
            endpoint
                .trim_start_matches("https://")
                .trim_start_matches("http://")
                .trim_end_matches('/')
        })
    }

    fn ensure_current(&self) -> Result<(), ViewError> {
        if self.mount.is_current() {
            Ok(())
        } else {
            debug!(route = %self.route, "dropping result of superseded view");
            Err(ViewError::Superseded)
        }
    }

    fn advance(&mut self, event: ViewEvent) -> Result<(), ViewError> {
        let Some(next) = self.state.on(&event) else {
            return Err(ViewError::InvalidState {
                state: self.state.to_string(),
                action: "advance",
            });
        };
        info!(route = %self.route, from = %self.state, to = %next, "view transition");
        self.state = next;
        Ok(())
    }

    /// Move to `Failed`, showing the error as the notice.
    fn fail(&mut self, err: ViewError) -> ViewError {
        let message = err.to_string();
        self.mount.set_notice(&message);
        if let Some(next) = self.state.on(&ViewEvent::Failed(message)) {
            info!(route = %self.route, from = %self.state, to = %next, "view transition");
            self.state = next;
        }
        err
    }

    /// Steps 1 to 3: find the PDS and open a session on it.
    async fn connect(&mut self) -> Result<Box<dyn RepositoryRpc>, ViewError> {
        if self.state != ViewState::Idle {
            return Err(ViewError::InvalidState {
                state: self.state.to_string(),
                action: "load",
            });
        }
        self.ensure_current()?;
        self.advance(ViewEvent::Start)?;
        self.mount.set_notice(LOADING);

        let endpoint = match self.route.host() {
            Some(host) => host.to_string(),
            None => {
                let resolved = self.resolver.resolve(self.identifier()).await;
                self.ensure_current()?;
                match resolved {
                    Ok(identity) => identity.endpoint,
                    Err(err) => return Err(self.fail(ViewError::Resolution(err))),
                }
            }
        };

        let session = self.sessions.create_session(&endpoint);
        self.endpoint = Some(endpoint);
        self.advance(ViewEvent::Resolved)?;
        Ok(session)
    }

    /// Land the result of a fetch: `Ready` with the notice cleared, or
    /// `Failed` with the error shown.
    fn settle<T>(&mut self, result: Result<T, AtprotoError>) -> Result<T, ViewError> {
        self.ensure_current()?;
        match result {
            Ok(value) => {
                self.mount.clear_notice();
                self.advance(ViewEvent::Fetched)?;
                Ok(value)
            }
            Err(err) => Err(self.fail(ViewError::Rpc(err))),
        }
    }

    /// Check a "load more" may start and show the loading notice.
    fn begin_more<T>(
        &self,
        session: Option<&dyn RepositoryRpc>,
        listing: &ListingAccumulator<T>,
    ) -> Result<(), ViewError> {
        self.ensure_current()?;
        if session.is_none() || !(self.state.is_ready() || self.state.is_failed()) {
            return Err(ViewError::InvalidState {
                state: self.state.to_string(),
                action: "load more",
            });
        }
        if listing.cursor().is_none() {
            return Err(ViewError::NothingToLoad);
        }
        self.mount.set_notice(LOADING);
        Ok(())
    }
}

/// Fetch the next page of `query` into `listing`.
///
/// The page is only absorbed once the mount is known to be current; a failed
/// fetch leaves `listing` untouched.
pub(crate) async fn load_page<Q: ListingQuery>(
    ctx: &mut ViewContext,
    rpc: &dyn RepositoryRpc,
    query: &Q,
    listing: &mut ListingAccumulator<Q::Item>,
) -> Result<PageOutcome, ViewError> {
    let fetched = fetch_page(rpc, query, listing.cursor()).await;
    let page = ctx.settle(fetched)?;
    Ok(listing.absorb(page, query.page_size()))
}

/// The view mounted for a route.
pub enum View {
    Server(ServerView),
    Repository(RepositoryView),
    Collection(CollectionView),
    Record(RecordView),
}

impl View {
    pub(crate) fn new(
        route: Route,
        mount: MountHandle,
        resolver: IdentityResolver,
        sessions: Arc<dyn SessionFactory>,
    ) -> Self {
        let kind = route.kind();
        let ctx = ViewContext::new(route, mount, resolver, sessions);
        match kind {
            ViewKind::Server => View::Server(ServerView::new(ctx)),
            ViewKind::Repository => View::Repository(RepositoryView::new(ctx)),
            ViewKind::Collection => View::Collection(CollectionView::new(ctx)),
            ViewKind::Record => View::Record(RecordView::new(ctx)),
        }
    }

    fn ctx(&self) -> &ViewContext {
        match self {
            View::Server(v) => &v.ctx,
            View::Repository(v) => &v.ctx,
            View::Collection(v) => &v.ctx,
            View::Record(v) => &v.ctx,
        }
    }

    /// Resolve, connect and make the view's first call.
    pub async fn load(&mut self) -> Result<(), ViewError> {
        match self {
            View::Server(v) => v.load().await.map(|_| ()),
            View::Repository(v) => v.load().await.map(|_| ()),
            View::Collection(v) => v.load().await.map(|_| ()),
            View::Record(v) => v.load().await.map(|_| ()),
        }
    }

    /// Fetch the next page of a listing view.
    pub async fn load_more(&mut self) -> Result<PageOutcome, ViewError> {
        match self {
            View::Server(v) => v.load_more().await,
            View::Collection(v) => v.load_more().await,
            View::Repository(_) | View::Record(_) => Err(ViewError::NothingToLoad),
        }
    }

    /// Whether "load more" is on offer.
    pub fn has_more(&self) -> bool {
        match self {
            View::Server(v) => v.has_more(),
            View::Collection(v) => v.has_more(),
            View::Repository(_) | View::Record(_) => false,
        }
    }

    pub fn state(&self) -> &ViewState {
        self.ctx().state()
    }

    pub fn route(&self) -> &Route {
        self.ctx().route()
    }

    pub fn kind(&self) -> ViewKind {
        self.route().kind()
    }

    /// The PDS host this view talks to, once known.
    pub fn endpoint_host(&self) -> Option<&str> {
        self.ctx().endpoint_host()
    }

    pub fn breadcrumb(&self) -> Vec<Crumb> {
        self.route().breadcrumb(self.endpoint_host())
    }

    /// Links to the views below this one.
    pub fn links(&self) -> Vec<ListItem> {
        match self {
            View::Server(v) => v.links(),
            View::Repository(v) => v.links(),
            View::Collection(v) => v.links(),
            View::Record(_) => Vec::new(),
        }
    }

    /// Hand what the view holds to `renderer`.
    pub fn render(&self, renderer: &mut dyn ValueRenderer) {
        match self {
            View::Server(v) => v.render(renderer),
            View::Repository(v) => v.render(renderer),
            View::Collection(v) => v.render(renderer),
            View::Record(v) => v.render(renderer),
        }
    }
}
