use atnav_atproto::RepoDescription;

use super::ViewContext;
use crate::ViewError;
use crate::render::{ListItem, ValueRenderer};

/// A repository's DID document and collections.
pub struct RepositoryView {
    pub(super) ctx: ViewContext,
    description: Option<RepoDescription>,
}

impl RepositoryView {
    pub(super) fn new(ctx: ViewContext) -> Self {
        Self {
            ctx,
            description: None,
        }
    }

    pub async fn load(&mut self) -> Result<&RepoDescription, ViewError> {
        let session = self.ctx.connect().await?;
        let described = session.describe_repo(self.ctx.identifier()).await;
        let description = self.ctx.settle(described)?;
        Ok(self.description.insert(description))
    }

    pub fn description(&self) -> Option<&RepoDescription> {
        self.description.as_ref()
    }

    pub fn links(&self) -> Vec<ListItem> {
        let Some(description) = &self.description else {
            return Vec::new();
        };
        description
            .collections
            .iter()
            .filter_map(|collection| {
                let route = self.ctx.route().child(collection)?;
                Some(ListItem::new(collection.clone(), route))
            })
            .collect()
    }

    pub fn render(&self, renderer: &mut dyn ValueRenderer) {
        let Some(description) = &self.description else {
            return;
        };
        renderer.render_value(&description.did_doc, &description.did);
        for item in self.links() {
            renderer.render_item(&item);
        }
    }
}
