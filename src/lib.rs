//! Fae live chart: renders charts requested by a live multimodal model.
//!
//! The crate configures a realtime model session with a chart-producing
//! function declaration, listens for the model's tool calls, and forwards
//! the Vega-Lite spec carried in the call arguments to a chart renderer.
//!
//! # Architecture
//!
//! - **Live session** (`live`): schema and declarations, the session setup
//!   payload, tool-call events, the wire codec, and the [`LiveSession`] seam
//! - **Listener** (`listener`): routes matching tool calls into the sink
//! - **Canvas** (`canvas`): spec parsing, the render sink, and renderers
//!   for a `canvas-core` scene or a vega-embed HTML fragment
//! - **Panel** (`panel`): ties one session, one sink and one listener to a
//!   mounted lifetime

pub mod canvas;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod listener;
pub mod live;
pub mod panel;

pub use canvas::{
    CanvasSceneRenderer, ChartDocument, ChartRenderer, MountPoint, RenderSink,
    VegaEmbedHtmlRenderer,
};
pub use config::{AcknowledgeConfig, BridgeConfig};
pub use error::{ChartBridgeError, Result};
pub use listener::{InvocationListener, RouteOutcome, ToolRoute};
pub use live::session::{LiveSession, LocalSession, SubscriptionId};
pub use panel::ChartPanel;
