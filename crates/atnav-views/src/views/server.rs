use atnav_atproto::{ListingAccumulator, PageOutcome, RepoEntry, RepoListing, RepositoryRpc};

use super::{ViewContext, load_page};
use crate::render::{ListItem, ValueRenderer};
use crate::{Route, ViewError};

/// Every repository hosted on one PDS, a thousand at a time.
pub struct ServerView {
    pub(super) ctx: ViewContext,
    session: Option<Box<dyn RepositoryRpc>>,
    repos: ListingAccumulator<RepoEntry>,
}

impl ServerView {
    pub(super) fn new(ctx: ViewContext) -> Self {
        Self {
            ctx,
            session: None,
            repos: ListingAccumulator::new(),
        }
    }

    pub async fn load(&mut self) -> Result<PageOutcome, ViewError> {
        let session = self.ctx.connect().await?;
        let outcome = load_page(&mut self.ctx, &*session, &RepoListing, &mut self.repos).await;
        self.session = Some(session);
        outcome
    }

    pub async fn load_more(&mut self) -> Result<PageOutcome, ViewError> {
        self.ctx.begin_more(self.session.as_deref(), &self.repos)?;
        let Some(session) = self.session.as_deref() else {
            return Err(ViewError::NothingToLoad);
        };
        load_page(&mut self.ctx, session, &RepoListing, &mut self.repos).await
    }

    pub fn has_more(&self) -> bool {
        self.session.is_some() && self.repos.cursor().is_some()
    }

    pub fn repos(&self) -> &[RepoEntry] {
        self.repos.items()
    }

    pub fn links(&self) -> Vec<ListItem> {
        self.repos
            .items()
            .iter()
            .map(|repo| ListItem {
                label: repo.did.clone(),
                route: Route::repo(repo.did.clone()),
                inactive: !repo.active,
            })
            .collect()
    }

    pub fn render(&self, renderer: &mut dyn ValueRenderer) {
        for item in self.links() {
            renderer.render_item(&item);
        }
    }
}
