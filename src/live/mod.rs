//! Live session side of the bridge.
//!
//! Declares the callable contract, builds the session configuration, models
//! tool-call invocations and their wire framing, and defines the session
//! boundary the listener subscribes against.

pub mod declaration;
pub mod events;
pub mod schema;
pub mod session;
pub mod setup;
pub mod wire;

pub use declaration::{ChartTool, FunctionDeclaration};
pub use events::{FunctionArgs, FunctionCall, MissingFieldError, ToolCall, ToolResponse};
pub use session::{LiveSession, LocalSession, SubscriptionId, ToolCallHandler};
pub use setup::{SessionConfig, ToolBinding, build_session_config};
