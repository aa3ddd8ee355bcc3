//! The seam between views and whatever draws them.

use serde_json::Value;

use crate::Route;

/// One entry of a listing view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub label: String,
    pub route: Route,
    /// Repository is deactivated or taken down.
    pub inactive: bool,
}

impl ListItem {
    pub fn new(label: impl Into<String>, route: Route) -> Self {
        Self {
            label: label.into(),
            route,
            inactive: false,
        }
    }
}

/// Draws what a view holds.
pub trait ValueRenderer {
    /// Draw a JSON value belonging to `repo` (a DID).
    fn render_value(&mut self, value: &Value, repo: &str);

    fn render_item(&mut self, item: &ListItem);
}
