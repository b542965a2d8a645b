//! `canvas-core` scene renderer.
//!
//! Keeps one [`Scene`] per mount point. Each render replaces the previous
//! chart element in that scene, so a scene never holds more than one chart.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use canvas_core::{Element, ElementId, ElementKind, Scene, Transform};
use tokio_util::sync::CancellationToken;

use super::document::ChartDocument;
use super::mount::MountPoint;
use super::renderer::ChartRenderer;
use crate::error::{ChartBridgeError, Result};

/// Chart type recorded when the document has no top-level mark.
const UNKNOWN_MARK: &str = "unknown";

struct MountedScene {
    scene: Scene,
    chart: Option<ElementId>,
}

/// Renders charts into `canvas_core` scenes keyed by mount id.
#[derive(Default)]
pub struct CanvasSceneRenderer {
    scenes: Mutex<HashMap<String, MountedScene>>,
}

impl CanvasSceneRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, MountedScene>>> {
        self.scenes
            .lock()
            .map_err(|_| ChartBridgeError::Render("scene lock poisoned".to_owned()))
    }

    /// Snapshot of the scene behind `mount_id`.
    pub fn scene(&self, mount_id: &str) -> Option<Scene> {
        self.lock()
            .ok()
            .and_then(|scenes| scenes.get(mount_id).map(|m| m.scene.clone()))
    }

    /// The chart element currently shown at `mount_id`.
    pub fn chart_element(&self, mount_id: &str) -> Option<Element> {
        let scenes = self.lock().ok()?;
        let mounted = scenes.get(mount_id)?;
        let id = mounted.chart?;
        mounted.scene.get_element(id).cloned()
    }

    /// Drop the scene for `mount_id`, returning whether one existed.
    pub fn release(&self, mount_id: &str) -> bool {
        self.lock()
            .map(|mut scenes| scenes.remove(mount_id).is_some())
            .unwrap_or(false)
    }
}

impl ChartRenderer for CanvasSceneRenderer {
    fn render(
        &self,
        mount: &MountPoint,
        document: &ChartDocument,
        cancel: CancellationToken,
    ) -> Result<()> {
        if cancel.is_cancelled() {
            tracing::debug!(mount = mount.id(), "render superseded before dispatch");
            return Ok(());
        }

        let chart_type = document.mark().unwrap_or(UNKNOWN_MARK).to_owned();
        let element = Element::new(ElementKind::Chart {
            chart_type: chart_type.clone(),
            data: document.as_value().clone(),
        })
        .with_transform(Transform {
            x: 0.0,
            y: 0.0,
            width: mount.width(),
            height: mount.height(),
            rotation: 0.0,
            z_index: 0,
        });

        let mut scenes = self.lock()?;
        let mounted = scenes
            .entry(mount.id().to_owned())
            .or_insert_with(|| MountedScene {
                scene: Scene::new(mount.width(), mount.height()),
                chart: None,
            });

        if let Some(previous) = mounted.chart.take() {
            let _ = mounted.scene.remove_element(&previous);
        }
        mounted.chart = Some(mounted.scene.add_element(element));

        tracing::debug!(mount = mount.id(), chart_type = %chart_type, "chart drawn into scene");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(raw: &str) -> ChartDocument {
        ChartDocument::parse(raw).unwrap()
    }

    #[test]
    fn render_adds_chart_element() {
        let renderer = CanvasSceneRenderer::new();
        let mount = MountPoint::with_id("m1", 640.0, 480.0);
        renderer
            .render(&mount, &doc(r#"{"mark":"bar"}"#), CancellationToken::new())
            .unwrap();

        let el = renderer.chart_element("m1").unwrap();
        match &el.kind {
            ElementKind::Chart { chart_type, data } => {
                assert_eq!(chart_type, "bar");
                assert_eq!(data["mark"], "bar");
            }
            other => unreachable!("expected Chart, got {other:?}"),
        }
        assert!((el.transform.width - 640.0).abs() < f32::EPSILON);
        assert!((el.transform.height - 480.0).abs() < f32::EPSILON);
    }

    #[test]
    fn second_render_replaces_first() {
        let renderer = CanvasSceneRenderer::new();
        let mount = MountPoint::with_id("m1", 640.0, 480.0);
        renderer
            .render(&mount, &doc(r#"{"mark":"bar"}"#), CancellationToken::new())
            .unwrap();
        renderer
            .render(&mount, &doc(r#"{"mark":"point"}"#), CancellationToken::new())
            .unwrap();

        assert_eq!(renderer.scene("m1").map(|s| s.element_count()), Some(1));
        match renderer.chart_element("m1").map(|e| e.kind) {
            Some(ElementKind::Chart { chart_type, .. }) => assert_eq!(chart_type, "point"),
            other => unreachable!("expected Chart, got {other:?}"),
        }
    }

    #[test]
    fn cancelled_render_is_dropped() {
        let renderer = CanvasSceneRenderer::new();
        let mount = MountPoint::with_id("m1", 640.0, 480.0);
        let token = CancellationToken::new();
        token.cancel();
        renderer
            .render(&mount, &doc(r#"{"mark":"bar"}"#), token)
            .unwrap();
        assert!(renderer.scene("m1").is_none());
    }

    #[test]
    fn markless_document_uses_placeholder_type() {
        let renderer = CanvasSceneRenderer::new();
        let mount = MountPoint::with_id("m1", 100.0, 100.0);
        renderer
            .render(&mount, &doc(r#"{"layer":[]}"#), CancellationToken::new())
            .unwrap();
        match renderer.chart_element("m1").map(|e| e.kind) {
            Some(ElementKind::Chart { chart_type, .. }) => assert_eq!(chart_type, UNKNOWN_MARK),
            other => unreachable!("expected Chart, got {other:?}"),
        }
    }

    #[test]
    fn mounts_are_independent() {
        let renderer = CanvasSceneRenderer::new();
        let a = MountPoint::with_id("a", 100.0, 100.0);
        let b = MountPoint::with_id("b", 100.0, 100.0);
        renderer
            .render(&a, &doc(r#"{"mark":"bar"}"#), CancellationToken::new())
            .unwrap();
        renderer
            .render(&b, &doc(r#"{"mark":"area"}"#), CancellationToken::new())
            .unwrap();
        assert!(renderer.release("a"));
        assert!(!renderer.release("a"));
        assert!(renderer.chart_element("b").is_some());
    }
}
