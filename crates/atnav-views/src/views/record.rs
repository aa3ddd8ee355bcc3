use atnav_atproto::RecordResponse;
use serde_json::json;

use super::ViewContext;
use crate::ViewError;
use crate::render::ValueRenderer;

/// One record.
pub struct RecordView {
    pub(super) ctx: ViewContext,
    record: Option<RecordResponse>,
}

impl RecordView {
    pub(super) fn new(ctx: ViewContext) -> Self {
        Self { ctx, record: None }
    }

    pub async fn load(&mut self) -> Result<&RecordResponse, ViewError> {
        let session = self.ctx.connect().await?;
        let route = self.ctx.route();
        let fetched = session
            .get_record(
                self.ctx.identifier(),
                route.collection().unwrap_or_default(),
                route.record_key().unwrap_or_default(),
            )
            .await;
        let record = self.ctx.settle(fetched)?;
        Ok(self.record.insert(record))
    }

    pub fn record(&self) -> Option<&RecordResponse> {
        self.record.as_ref()
    }

    /// The repository that owns the record, from its URI.
    pub fn repo(&self) -> Option<String> {
        let record = self.record.as_ref()?;
        record
            .repo()
            .or_else(|| Some(self.ctx.identifier().to_string()))
    }

    pub fn render(&self, renderer: &mut dyn ValueRenderer) {
        let (Some(record), Some(repo)) = (&self.record, self.repo()) else {
            return;
        };
        let value = json!({
            "uri": record.uri,
            "cid": record.cid,
            "value": record.value,
        });
        renderer.render_value(&value, &repo);
    }
}
