//! Live session boundary.
//!
//! [`LiveSession`] is the slice of a realtime session the bridge depends on:
//! installing a configuration, observing tool-call events, and (optionally)
//! answering them. Subscriptions are revoked through the [`SubscriptionId`]
//! returned at registration time.
//!
//! [`LocalSession`] is an in-process implementation for hosts that own the
//! transport themselves: inbound frames are pushed into it, outbound frames
//! leave through an optional channel.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;

use super::events::{ToolCall, ToolResponse};
use super::setup::SessionConfig;
use super::wire::{ClientMessage, ServerMessage};
use crate::error::{ChartBridgeError, Result};

/// Callback invoked once per tool-call event.
pub type ToolCallHandler = Arc<dyn Fn(&ToolCall) -> Result<()> + Send + Sync>;

/// Capability token for one tool-call subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(1);

impl SubscriptionId {
    /// Allocate a process-unique token.
    pub fn next() -> Self {
        Self(NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// The session collaborator.
pub trait LiveSession: Send + Sync {
    /// Install the session configuration.
    ///
    /// # Errors
    ///
    /// Implementations return [`ChartBridgeError::ConfigInstall`] when the
    /// session rejects the configuration.
    fn set_config(&self, config: &SessionConfig) -> Result<()>;

    /// Register a handler for tool-call events.
    fn subscribe_tool_calls(&self, handler: ToolCallHandler) -> SubscriptionId;

    /// Revoke a subscription. Returns `false` if the token was unknown.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    /// Answer one or more function calls.
    ///
    /// # Errors
    ///
    /// Returns [`ChartBridgeError::Session`] if the response cannot be sent.
    fn send_tool_response(&self, response: ToolResponse) -> Result<()>;
}

#[derive(Default)]
struct LocalState {
    config: Option<SessionConfig>,
    handlers: BTreeMap<SubscriptionId, ToolCallHandler>,
    responses: Vec<ToolResponse>,
}

/// In-process [`LiveSession`].
#[derive(Default)]
pub struct LocalSession {
    state: Mutex<LocalState>,
    outbound: Option<mpsc::UnboundedSender<ClientMessage>>,
}

impl LocalSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward setup and tool-response frames to `outbound`.
    pub fn with_outbound(outbound: mpsc::UnboundedSender<ClientMessage>) -> Self {
        Self {
            state: Mutex::default(),
            outbound: Some(outbound),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, LocalState>> {
        self.state
            .lock()
            .map_err(|_| ChartBridgeError::Session("session state lock poisoned".to_owned()))
    }

    fn forward(&self, message: ClientMessage) -> Result<()> {
        match &self.outbound {
            Some(tx) => tx
                .send(message)
                .map_err(|_| ChartBridgeError::Session("outbound channel closed".to_owned())),
            None => Ok(()),
        }
    }

    /// The most recently installed configuration.
    pub fn installed_config(&self) -> Option<SessionConfig> {
        self.lock().ok().and_then(|s| s.config.clone())
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.lock().map(|s| s.handlers.len()).unwrap_or(0)
    }

    /// Tool responses sent so far, oldest first.
    pub fn sent_responses(&self) -> Vec<ToolResponse> {
        self.lock().map(|s| s.responses.clone()).unwrap_or_default()
    }

    /// Deliver `call` to every subscriber in registration order.
    ///
    /// Returns the number of handlers invoked. Handlers run outside the
    /// state lock so they may subscribe or unsubscribe; a subscription
    /// revoked mid-dispatch is skipped.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first handler error.
    pub fn emit_tool_call(&self, call: &ToolCall) -> Result<usize> {
        let handlers: Vec<(SubscriptionId, ToolCallHandler)> = self
            .lock()?
            .handlers
            .iter()
            .map(|(id, handler)| (*id, handler.clone()))
            .collect();
        tracing::debug!(
            calls = call.function_calls.len(),
            subscribers = handlers.len(),
            "dispatching tool call"
        );
        let mut invoked = 0;
        for (id, handler) in &handlers {
            if !self.lock()?.handlers.contains_key(id) {
                tracing::debug!(subscription = %id, "skipping revoked subscriber");
                continue;
            }
            handler(call)?;
            invoked += 1;
        }
        Ok(invoked)
    }

    /// Decode one inbound server frame and dispatch it.
    ///
    /// # Errors
    ///
    /// Wire decode failures and handler errors.
    pub fn dispatch_frame(&self, frame: &str) -> Result<()> {
        match ServerMessage::decode(frame)? {
            ServerMessage::ToolCall(call) => {
                self.emit_tool_call(&call)?;
            }
            ServerMessage::ToolCallCancellation { ids } => {
                tracing::debug!(?ids, "tool calls cancelled by server");
            }
            ServerMessage::SetupComplete => tracing::info!("live session setup complete"),
            ServerMessage::ServerContent(_) | ServerMessage::Unknown => {}
        }
        Ok(())
    }

    /// Consume inbound frames until the channel closes.
    ///
    /// Failures are logged and do not stop the loop.
    pub async fn pump(self: Arc<Self>, mut inbound: mpsc::Receiver<String>) {
        while let Some(frame) = inbound.recv().await {
            if let Err(e) = self.dispatch_frame(&frame) {
                tracing::error!(error = %e, code = e.code(), "live frame handling failed");
            }
        }
        tracing::debug!("live session inbound channel closed");
    }
}

impl LiveSession for LocalSession {
    fn set_config(&self, config: &SessionConfig) -> Result<()> {
        self.forward(ClientMessage::Setup(config.clone()))
            .map_err(|e| ChartBridgeError::ConfigInstall(e.message()))?;
        self.lock()?.config = Some(config.clone());
        Ok(())
    }

    fn subscribe_tool_calls(&self, handler: ToolCallHandler) -> SubscriptionId {
        let id = SubscriptionId::next();
        match self.state.lock() {
            Ok(mut state) => {
                state.handlers.insert(id, handler);
            }
            Err(poisoned) => {
                poisoned.into_inner().handlers.insert(id, handler);
            }
        }
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        match self.state.lock() {
            Ok(mut state) => state.handlers.remove(&id).is_some(),
            Err(poisoned) => poisoned.into_inner().handlers.remove(&id).is_some(),
        }
    }

    fn send_tool_response(&self, response: ToolResponse) -> Result<()> {
        self.lock()?.responses.push(response.clone());
        self.forward(ClientMessage::ToolResponse(response))
    }
}
