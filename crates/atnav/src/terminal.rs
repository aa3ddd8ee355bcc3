//! Plain-text rendering of views.

use std::io::{self, Write};

use atnav_views::{Crumb, ListItem, Route, ValueRenderer};
use serde_json::Value;

/// Writes views to a terminal or any other byte sink.
///
/// Rendering can't fail halfway through a view, so the first I/O error is
/// kept and reported by [`finish`](Self::finish).
pub struct Terminal<W: Write> {
    out: W,
    /// PDS host blobs are served from.
    endpoint_host: Option<String>,
    error: Option<io::Error>,
}

impl<W: Write> Terminal<W> {
    pub fn new(out: W, endpoint_host: Option<&str>) -> Self {
        Self {
            out,
            endpoint_host: endpoint_host.map(String::from),
            error: None,
        }
    }

    fn line(&mut self, text: &str) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = writeln!(self.out, "{}", text) {
            self.error = Some(e);
        }
    }

    /// `host / identifier / collection / rkey`
    pub fn breadcrumb(&mut self, crumbs: &[Crumb]) {
        let trail: Vec<&str> = crumbs.iter().map(|c| c.label.as_str()).collect();
        self.line(&trail.join(" / "));
    }

    pub fn notice(&mut self, notice: &str) {
        if !notice.is_empty() {
            self.line(&format!("[{}]", notice));
        }
    }

    pub fn finish(mut self) -> io::Result<()> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.out.flush()
    }

    fn blob_url(&self, repo: &str, cid: &str) -> Option<String> {
        let host = self.endpoint_host.as_deref()?;
        Some(format!(
            "https://{}/xrpc/com.atproto.sync.getBlob?did={}&cid={}",
            host, repo, cid
        ))
    }
}

impl<W: Write> ValueRenderer for Terminal<W> {
    fn render_value(&mut self, value: &Value, repo: &str) {
        match serde_json::to_string_pretty(value) {
            Ok(pretty) => self.line(&pretty),
            Err(e) => self.error = Some(e.into()),
        }

        let mut links = Vec::new();
        collect_links(value, &mut links);
        if links.is_empty() {
            return;
        }

        self.line("");
        for link in links {
            match link {
                Link::Record(route) => self.line(&format!("-> {}", route)),
                Link::Blob { cid, video } => {
                    if let Some(url) = self.blob_url(repo, &cid) {
                        self.line(&format!("blob {}", url));
                    }
                    if video {
                        self.line(&format!(
                            "video https://video.cdn.bsky.app/hls/{}/{}/playlist.m3u8",
                            repo, cid
                        ));
                    }
                }
            }
        }
    }

    fn render_item(&mut self, item: &ListItem) {
        if item.inactive {
            self.line(&format!("{} (inactive)  {}", item.label, item.route));
        } else {
            self.line(&format!("{}  {}", item.label, item.route));
        }
    }
}

/// Something inside a record worth following.
#[derive(Debug, PartialEq)]
enum Link {
    Record(Route),
    Blob { cid: String, video: bool },
}

/// Find `at://` references and blob refs, in document order.
fn collect_links(value: &Value, links: &mut Vec<Link>) {
    match value {
        Value::String(s) if s.starts_with("at://") => {
            if let Some(route) = Route::for_record_uri(s) {
                links.push(Link::Record(route));
            }
        }
        Value::Object(map) => {
            if map.get("$type").and_then(Value::as_str) == Some("blob") {
                if let Some(cid) = map
                    .get("ref")
                    .and_then(|r| r.get("$link"))
                    .and_then(Value::as_str)
                {
                    let video = map
                        .get("mimeType")
                        .and_then(Value::as_str)
                        .is_some_and(|m| m.starts_with("video/"));
                    links.push(Link::Blob {
                        cid: cid.to_string(),
                        video,
                    });
                }
                return;
            }
            for child in map.values() {
                collect_links(child, links);
            }
        }
        Value::Array(items) => {
            for child in items {
                collect_links(child, links);
            }
        }
        _ => {}
    }
}
