use std::sync::Arc;

use atnav_atproto::{Address, IdentityResolver, SessionFactory, is_did};
use tracing::{debug, warn};

use crate::notice::NoticeBoard;
use crate::views::View;
use crate::{Route, ViewError};

/// Notice shown when submitted input names a handle that does not resolve.
pub const INPUT_RESOLUTION_FAILED: &str = "Could not resolve At-URI/DID/Handle";

/// Turns input into routes and mounts the view for each route.
///
/// Mounting a view makes every previously mounted view stale: their pending
/// requests still complete, but their results are dropped.
pub struct Navigator {
    board: NoticeBoard,
    resolver: IdentityResolver,
    sessions: Arc<dyn SessionFactory>,
}

impl Navigator {
    pub fn new(resolver: IdentityResolver, sessions: Arc<dyn SessionFactory>) -> Self {
        Self {
            board: NoticeBoard::new(),
            resolver,
            sessions,
        }
    }

    /// The notice slot shared by every view this navigator mounts.
    pub fn notices(&self) -> &NoticeBoard {
        &self.board
    }

    pub fn resolver(&self) -> &IdentityResolver {
        &self.resolver
    }

    /// Mount a fresh view for `route`. Nothing is fetched until
    /// [`View::load`] is called.
    pub fn mount(&self, route: Route) -> View {
        let mount = self.board.begin_mount();
        debug!(route = %route, generation = mount.generation(), "mounting view");
        View::new(route, mount, self.resolver.clone(), Arc::clone(&self.sessions))
    }

    /// Mount the view for a navigation path.
    pub fn open(&self, path: &str) -> Result<View, ViewError> {
        let route = Route::parse(path)?;
        Ok(self.mount(route))
    }

    /// Normalize user input into the route to navigate to.
    ///
    /// Handles are swapped for their DID so the route is canonical. If the
    /// handle does not resolve, the notice says so and the route keeps the
    /// handle; the view mounted for it reports its own failure.
    pub async fn submit(&self, input: &str) -> Result<Route, ViewError> {
        let address = Address::parse(input)?;

        let address = match address.identifier() {
            Some(identifier) if !is_did(identifier) => {
                let handle = self.board.handle();
                match self.resolver.resolve_did(identifier).await {
                    Ok(did) => address.with_identifier(did),
                    Err(err) => {
                        warn!(input = %input, error = %err, "could not canonicalize input");
                        handle.set_notice(INPUT_RESOLUTION_FAILED);
                        address
                    }
                }
            }
            _ => address,
        };

        Ok(Route::from_address(&address))
    }
}
