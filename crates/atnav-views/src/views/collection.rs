use atnav_atproto::{ListingAccumulator, PageOutcome, RecordEntry, RecordListing, RepositoryRpc};

use super::{ViewContext, load_page};
use crate::ViewError;
use crate::render::{ListItem, ValueRenderer};

/// The records of one collection, a hundred at a time.
pub struct CollectionView {
    pub(super) ctx: ViewContext,
    session: Option<Box<dyn RepositoryRpc>>,
    query: RecordListing,
    records: ListingAccumulator<RecordEntry>,
}

impl CollectionView {
    pub(super) fn new(ctx: ViewContext) -> Self {
        let query = RecordListing::new(
            ctx.identifier(),
            ctx.route().collection().unwrap_or_default(),
        );
        Self {
            ctx,
            session: None,
            query,
            records: ListingAccumulator::new(),
        }
    }

    pub async fn load(&mut self) -> Result<PageOutcome, ViewError> {
        let session = self.ctx.connect().await?;
        let outcome = load_page(&mut self.ctx, &*session, &self.query, &mut self.records).await;
        self.session = Some(session);
        outcome
    }

    pub async fn load_more(&mut self) -> Result<PageOutcome, ViewError> {
        self.ctx.begin_more(self.session.as_deref(), &self.records)?;
        let Some(session) = self.session.as_deref() else {
            return Err(ViewError::NothingToLoad);
        };
        load_page(&mut self.ctx, session, &self.query, &mut self.records).await
    }

    pub fn has_more(&self) -> bool {
        self.session.is_some() && self.records.cursor().is_some()
    }

    pub fn records(&self) -> &[RecordEntry] {
        self.records.items()
    }

    pub fn links(&self) -> Vec<ListItem> {
        self.records
            .items()
            .iter()
            .filter_map(|record| {
                let rkey = record.rkey();
                if rkey.is_empty() {
                    return None;
                }
                let route = self.ctx.route().child(rkey)?;
                Some(ListItem::new(rkey, route))
            })
            .collect()
    }

    pub fn render(&self, renderer: &mut dyn ValueRenderer) {
        for item in self.links() {
            renderer.render_item(&item);
        }
    }
}
