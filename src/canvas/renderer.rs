//! Rendering collaborator trait.
//!
//! [`ChartRenderer`] is the abstraction that lets the render sink draw into a
//! local [`CanvasSceneRenderer`](super::scene::CanvasSceneRenderer), an HTML
//! fragment for a webview ([`VegaEmbedHtmlRenderer`](super::html::VegaEmbedHtmlRenderer)),
//! or anything the host provides.

use tokio_util::sync::CancellationToken;

use super::document::ChartDocument;
use super::mount::MountPoint;
use crate::error::Result;

/// Draws chart documents into mounted surfaces.
pub trait ChartRenderer: Send + Sync {
    /// Replace whatever is shown at `mount` with `document`.
    ///
    /// Must not block on completion. Work still pending when `cancel` fires
    /// belongs to a superseded render and must be dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ChartBridgeError::Render`](crate::error::ChartBridgeError::Render)
    /// if the render could not be dispatched.
    fn render(
        &self,
        mount: &MountPoint,
        document: &ChartDocument,
        cancel: CancellationToken,
    ) -> Result<()>;
}
