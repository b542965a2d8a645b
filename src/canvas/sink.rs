//! Render sink: latest chart spec plus the render effect.
//!
//! The sink holds the most recent serialized spec and the current mount
//! point. Whenever either changes and both are usable, the spec is parsed
//! and handed to the [`ChartRenderer`]. Each render gets a fresh
//! cancellation token; issuing a new render cancels the previous one.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::document::ChartDocument;
use super::mount::MountPoint;
use super::renderer::ChartRenderer;
use crate::error::Result;

/// State owned by the sink. `None` means "empty".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderState {
    pub last_spec: Option<String>,
}

/// Holds the latest spec and drives the renderer.
pub struct RenderSink {
    state: RenderState,
    mount: Option<MountPoint>,
    renderer: Arc<dyn ChartRenderer>,
    in_flight: Option<CancellationToken>,
    renders_issued: u64,
}

impl RenderSink {
    pub fn new(renderer: Arc<dyn ChartRenderer>) -> Self {
        Self {
            state: RenderState::default(),
            mount: None,
            renderer,
            in_flight: None,
            renders_issued: 0,
        }
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn last_spec(&self) -> Option<&str> {
        self.state.last_spec.as_deref()
    }

    pub fn mount(&self) -> Option<&MountPoint> {
        self.mount.as_ref()
    }

    /// Number of render calls issued since creation.
    pub fn renders_issued(&self) -> u64 {
        self.renders_issued
    }

    /// Store a new spec. Empty strings count as no spec.
    ///
    /// Returns whether a render was issued.
    ///
    /// # Errors
    ///
    /// Propagates [`ChartBridgeError::MalformedSpec`](crate::error::ChartBridgeError::MalformedSpec)
    /// and renderer errors. The spec is stored even when it fails to parse.
    pub fn set_spec(&mut self, spec: Option<String>) -> Result<bool> {
        let spec = spec.filter(|s| !s.is_empty());
        if spec == self.state.last_spec {
            return Ok(false);
        }
        self.state.last_spec = spec;
        self.run_effect()
    }

    /// Attach (or replace) the visual surface.
    ///
    /// Returns whether a render was issued.
    ///
    /// # Errors
    ///
    /// Same as [`set_spec`](Self::set_spec).
    pub fn attach(&mut self, mount: MountPoint) -> Result<bool> {
        if self.mount.as_ref() == Some(&mount) {
            return Ok(false);
        }
        self.mount = Some(mount);
        self.run_effect()
    }

    /// Detach the visual surface, abandoning any pending render.
    pub fn detach(&mut self) -> Option<MountPoint> {
        self.cancel_in_flight();
        self.mount.take()
    }

    /// Abandon the current render, if any.
    pub fn cancel_in_flight(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }

    fn run_effect(&mut self) -> Result<bool> {
        let Some(mount) = &self.mount else {
            tracing::debug!("no mount point yet, render deferred");
            return Ok(false);
        };
        let Some(spec) = &self.state.last_spec else {
            return Ok(false);
        };

        let document = ChartDocument::parse(spec)?;

        if let Some(previous) = self.in_flight.take() {
            previous.cancel();
        }
        let token = CancellationToken::new();
        self.renderer.render(mount, &document, token.clone())?;
        self.in_flight = Some(token);
        self.renders_issued += 1;

        tracing::info!(
            mount = mount.id(),
            mark = document.mark().unwrap_or("-"),
            renders = self.renders_issued,
            "chart render issued"
        );
        Ok(true)
    }
}

impl Drop for RenderSink {
    fn drop(&mut self) {
        self.cancel_in_flight();
    }
}
