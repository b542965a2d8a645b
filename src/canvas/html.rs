//! vega-embed HTML renderer.
//!
//! Produces a self-contained fragment per mount point: a container `<div>`
//! plus a `<script>` that hands the spec to `vegaEmbed`. The host injects
//! the fragment into its webview; a newer render overwrites the fragment.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;

use super::document::ChartDocument;
use super::mount::MountPoint;
use super::renderer::ChartRenderer;
use crate::error::{ChartBridgeError, Result};

/// Renders charts to vega-embed HTML fragments keyed by mount id.
#[derive(Default)]
pub struct VegaEmbedHtmlRenderer {
    fragments: Mutex<HashMap<String, String>>,
}

impl VegaEmbedHtmlRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, String>>> {
        self.fragments
            .lock()
            .map_err(|_| ChartBridgeError::Render("fragment lock poisoned".to_owned()))
    }

    /// Current fragment for `mount_id`.
    pub fn fragment(&self, mount_id: &str) -> Option<String> {
        self.lock().ok()?.get(mount_id).cloned()
    }
}

impl ChartRenderer for VegaEmbedHtmlRenderer {
    fn render(
        &self,
        mount: &MountPoint,
        document: &ChartDocument,
        cancel: CancellationToken,
    ) -> Result<()> {
        if cancel.is_cancelled() {
            return Ok(());
        }
        let html = render_embed_html(mount, document)?;
        self.lock()?.insert(mount.id().to_owned(), html);
        Ok(())
    }
}

/// Build the embed fragment for `document` at `mount`.
///
/// # Errors
///
/// Returns [`ChartBridgeError::Render`] if the spec cannot be re-serialized.
pub fn render_embed_html(mount: &MountPoint, document: &ChartDocument) -> Result<String> {
    let spec = serde_json::to_string(document.as_value())
        .map_err(|e| ChartBridgeError::Render(format!("failed to serialize chart spec: {e}")))?;
    let id = html_escape(mount.id());
    Ok(format!(
        "<div class=\"vega-embed\" id=\"{id}\" style=\"width: {w}px; height: {h}px;\"></div>\n\
         <script>vegaEmbed(\"#{id}\", {spec});</script>",
        w = mount.width(),
        h = mount.height(),
        spec = script_safe(&spec),
    ))
}

/// Escape HTML special characters.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Keep JSON from terminating the surrounding `<script>` element.
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/").replace("<!--", "<\\!--")
}
