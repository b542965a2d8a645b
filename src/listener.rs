//! Invocation listener.
//!
//! Subscribes one handler to the session's tool-call events for its whole
//! lifetime. Each event is scanned for the registered callable; its chart
//! field is forwarded to the [`RenderSink`]. The subscription token is kept
//! and revoked on [`InvocationListener::unsubscribe`] or drop. Once revoked,
//! a handler already handed out by the session routes nothing further.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use crate::canvas::RenderSink;
use crate::config::AcknowledgeConfig;
use crate::error::{ChartBridgeError, Result};
use crate::live::events::{ToolCall, ToolResponse};
use crate::live::session::{LiveSession, SubscriptionId, ToolCallHandler};

/// Which callable to watch and which argument carries the chart spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRoute {
    pub tool_name: String,
    pub field: String,
}

impl ToolRoute {
    pub fn new(tool_name: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            field: field.into(),
        }
    }
}

/// What happened to one tool-call event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// No call matched the route; the sink was not touched.
    Ignored,
    /// The chart field was forwarded to the sink.
    Forwarded,
    /// The matching call lacked a usable chart field; the sink was cleared.
    FieldUnusable,
}

/// Route one event into `sink`.
///
/// # Errors
///
/// Propagates sink errors (malformed spec, renderer failure).
pub fn route_tool_call(
    route: &ToolRoute,
    call: &ToolCall,
    sink: &mut RenderSink,
) -> Result<RouteOutcome> {
    let Some(fc) = call.find(&route.tool_name) else {
        tracing::debug!(
            tool = %route.tool_name,
            calls = call.function_calls.len(),
            "no matching function call"
        );
        return Ok(RouteOutcome::Ignored);
    };

    match fc.args.extract_str(&route.field) {
        Ok(spec) => {
            tracing::debug!(
                tool = %fc.name,
                id = %fc.id,
                bytes = spec.len(),
                "forwarding chart spec"
            );
            sink.set_spec(Some(spec.to_owned()))?;
            Ok(RouteOutcome::Forwarded)
        }
        Err(e) => {
            tracing::warn!(tool = %fc.name, id = %fc.id, error = %e, "unusable chart argument");
            sink.set_spec(None)?;
            Ok(RouteOutcome::FieldUnusable)
        }
    }
}

fn lock_sink(sink: &Mutex<RenderSink>) -> Result<std::sync::MutexGuard<'_, RenderSink>> {
    sink.lock()
        .map_err(|_| ChartBridgeError::Session("render sink lock poisoned".to_owned()))
}

/// Answer every call in `call` with a success payload.
///
/// Runs after `delay` on the current tokio runtime when there is one,
/// otherwise inline. Nothing is sent once `active` is cleared.
fn acknowledge(
    session: &Weak<dyn LiveSession>,
    active: &Arc<AtomicBool>,
    call: &ToolCall,
    delay: Duration,
) {
    if call.is_empty() {
        return;
    }
    let response = ToolResponse::acknowledge_all(call);
    let session = session.clone();
    let active = active.clone();

    let send = move |response: ToolResponse| {
        if !active.load(Ordering::Acquire) {
            tracing::debug!("listener torn down, acknowledgement dropped");
            return;
        }
        let Some(session) = session.upgrade() else {
            return;
        };
        if let Err(e) = session.send_tool_response(response) {
            tracing::warn!(error = %e, "failed to acknowledge tool call");
        }
    };

    match tokio::runtime::Handle::try_current() {
        Ok(handle) if !delay.is_zero() => {
            handle.spawn(async move {
                tokio::time::sleep(delay).await;
                send(response);
            });
        }
        _ => send(response),
    }
}

/// Scoped subscription to tool-call events.
pub struct InvocationListener {
    session: Arc<dyn LiveSession>,
    route: ToolRoute,
    sink: Arc<Mutex<RenderSink>>,
    active: Arc<AtomicBool>,
    subscription: Option<SubscriptionId>,
}

impl InvocationListener {
    /// Subscribe to `session` and forward matches for `route` into `sink`.
    pub fn subscribe(
        session: Arc<dyn LiveSession>,
        route: ToolRoute,
        sink: Arc<Mutex<RenderSink>>,
        acknowledge_config: &AcknowledgeConfig,
    ) -> Self {
        let weak_session = Arc::downgrade(&session);
        let handler_route = route.clone();
        let handler_sink = sink.clone();
        let active = Arc::new(AtomicBool::new(true));
        let handler_active = active.clone();
        let ack_delay = acknowledge_config
            .enabled
            .then(|| Duration::from_millis(acknowledge_config.delay_ms));

        let handler: ToolCallHandler = Arc::new(move |call: &ToolCall| -> Result<()> {
            let mut sink = lock_sink(&handler_sink)?;
            if !handler_active.load(Ordering::Acquire) {
                tracing::debug!(tool = %handler_route.tool_name, "listener revoked, event dropped");
                return Ok(());
            }
            let outcome = route_tool_call(&handler_route, call, &mut sink);
            if let Some(delay) = ack_delay {
                acknowledge(&weak_session, &handler_active, call, delay);
            }
            outcome.map(|_| ())
        });

        let id = session.subscribe_tool_calls(handler);
        tracing::info!(tool = %route.tool_name, subscription = %id, "listening for tool calls");

        Self {
            session,
            route,
            sink,
            active,
            subscription: Some(id),
        }
    }

    pub fn route(&self) -> &ToolRoute {
        &self.route
    }

    pub fn is_listening(&self) -> bool {
        self.subscription.is_some()
    }

    /// Revoke the subscription. Safe to call more than once.
    ///
    /// The handler is deactivated under the sink lock, so no render starts
    /// after this returns even if the session is mid-dispatch elsewhere.
    pub fn unsubscribe(&mut self) -> bool {
        let Some(id) = self.subscription.take() else {
            return false;
        };
        {
            let _sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
            self.active.store(false, Ordering::Release);
        }
        let removed = self.session.unsubscribe(id);
        tracing::info!(subscription = %id, removed, "stopped listening for tool calls");
        removed
    }
}

impl Drop for InvocationListener {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
