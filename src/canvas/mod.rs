//! Canvas integration for chart output.
//!
//! Parses chart specs forwarded from the live session and renders them into
//! a mounted visual surface, either a `canvas-core` scene or a vega-embed
//! HTML fragment.

pub mod document;
pub mod html;
pub mod mount;
pub mod renderer;
pub mod scene;
pub mod sink;

pub use document::ChartDocument;
pub use html::VegaEmbedHtmlRenderer;
pub use mount::MountPoint;
pub use renderer::ChartRenderer;
pub use scene::CanvasSceneRenderer;
pub use sink::{RenderSink, RenderState};
