//! The mountable chart panel.
//!
//! [`ChartPanel`] wires the pieces together for one mounted lifetime:
//! it installs the session configuration, owns the render sink, and keeps
//! an [`InvocationListener`] subscribed until it is unmounted.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::canvas::{ChartRenderer, MountPoint, RenderSink};
use crate::config::BridgeConfig;
use crate::error::{ChartBridgeError, Result};
use crate::listener::{InvocationListener, ToolRoute};
use crate::live::session::LiveSession;
use crate::live::setup::build_session_config;

/// A chart surface driven by a live session's tool calls.
pub struct ChartPanel {
    session: Arc<dyn LiveSession>,
    sink: Arc<Mutex<RenderSink>>,
    listener: InvocationListener,
    config: BridgeConfig,
}

fn route_for(config: &BridgeConfig) -> ToolRoute {
    ToolRoute::new(config.tool.declaration().name(), config.chart_field.clone())
}

fn install(session: &dyn LiveSession, config: &BridgeConfig) -> Result<()> {
    let declaration = config.tool.declaration();
    declaration
        .validate()
        .map_err(|e| ChartBridgeError::Declaration(format!("{}: {e}", declaration.name())))?;

    let session_config = build_session_config(config);
    session.set_config(&session_config)?;
    tracing::info!(
        model = %session_config.model,
        tool = declaration.name(),
        tools = session_config.tools.len(),
        "session configuration installed"
    );
    Ok(())
}

impl ChartPanel {
    /// Configure `session` and start listening.
    ///
    /// # Errors
    ///
    /// Returns declaration validation failures and whatever `set_config`
    /// reports; nothing is subscribed in that case.
    pub fn mount(
        session: Arc<dyn LiveSession>,
        renderer: Arc<dyn ChartRenderer>,
        config: BridgeConfig,
    ) -> Result<Self> {
        install(session.as_ref(), &config)?;

        let sink = Arc::new(Mutex::new(RenderSink::new(renderer)));
        let listener = InvocationListener::subscribe(
            session.clone(),
            route_for(&config),
            sink.clone(),
            &config.acknowledge,
        );

        Ok(Self {
            session,
            sink,
            listener,
            config,
        })
    }

    fn sink(&self) -> Result<MutexGuard<'_, RenderSink>> {
        self.sink
            .lock()
            .map_err(|_| ChartBridgeError::Session("render sink lock poisoned".to_owned()))
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Apply a new configuration.
    ///
    /// The session configuration is always re-installed. The listener is
    /// replaced only when the watched tool, chart field or acknowledgement
    /// policy changed.
    ///
    /// # Errors
    ///
    /// Same as [`mount`](Self::mount); on error the previous configuration
    /// stays in effect locally.
    pub fn reconfigure(&mut self, config: BridgeConfig) -> Result<()> {
        install(self.session.as_ref(), &config)?;

        let route = route_for(&config);
        if &route != self.listener.route() || config.acknowledge != self.config.acknowledge {
            self.listener.unsubscribe();
            self.listener = InvocationListener::subscribe(
                self.session.clone(),
                route,
                self.sink.clone(),
                &config.acknowledge,
            );
        }
        self.config = config;
        Ok(())
    }

    /// Attach the visual surface. Renders immediately if a spec is waiting.
    ///
    /// # Errors
    ///
    /// Propagates render-effect failures.
    pub fn attach(&self, mount: MountPoint) -> Result<bool> {
        self.sink()?.attach(mount)
    }

    /// Detach the visual surface.
    ///
    /// # Errors
    ///
    /// Fails only if the sink lock is poisoned.
    pub fn detach(&self) -> Result<Option<MountPoint>> {
        Ok(self.sink()?.detach())
    }

    /// The most recent chart spec, if any.
    pub fn last_spec(&self) -> Option<String> {
        self.sink().ok()?.last_spec().map(str::to_owned)
    }

    pub fn renders_issued(&self) -> u64 {
        self.sink().map(|s| s.renders_issued()).unwrap_or(0)
    }

    pub fn is_listening(&self) -> bool {
        self.listener.is_listening()
    }

    /// Tear down: stop listening and abandon any pending render.
    pub fn unmount(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        self.listener.unsubscribe();
        if let Ok(mut sink) = self.sink.lock() {
            sink.cancel_in_flight();
        }
    }
}

impl Drop for ChartPanel {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::ChartDocument;
    use crate::config::AcknowledgeConfig;
    use crate::live::declaration::ChartTool;
    use crate::live::events::{FunctionArgs, FunctionCall, ToolCall, ToolResponse};
    use crate::live::session::{LocalSession, SubscriptionId, ToolCallHandler};
    use crate::live::setup::SessionConfig;
    use tokio_util::sync::CancellationToken;

    #[derive(Default)]
    struct NullRenderer;

    impl ChartRenderer for NullRenderer {
        fn render(&self, _: &MountPoint, _: &ChartDocument, _: CancellationToken) -> Result<()> {
            Ok(())
        }
    }

    /// Session that rejects every configuration.
    struct RejectingSession {
        subscriptions: Mutex<usize>,
    }

    impl LiveSession for RejectingSession {
        fn set_config(&self, _config: &SessionConfig) -> Result<()> {
            Err(ChartBridgeError::ConfigInstall("quota exceeded".to_owned()))
        }

        fn subscribe_tool_calls(&self, _handler: ToolCallHandler) -> SubscriptionId {
            *self.subscriptions.lock().unwrap() += 1;
            SubscriptionId::next()
        }

        fn unsubscribe(&self, _id: SubscriptionId) -> bool {
            true
        }

        fn send_tool_response(&self, _response: ToolResponse) -> Result<()> {
            Ok(())
        }
    }

    fn graph_call(name: &str, spec: &str) -> ToolCall {
        ToolCall::new(vec![FunctionCall::new(
            name,
            "x1",
            FunctionArgs::new().with("json_graph", spec),
        )])
    }

    #[test]
    fn mount_installs_config_and_subscribes() {
        let session = Arc::new(LocalSession::new());
        let panel = ChartPanel::mount(
            session.clone(),
            Arc::new(NullRenderer),
            BridgeConfig::default(),
        )
        .unwrap();

        let installed = session.installed_config().unwrap();
        assert_eq!(installed, build_session_config(&BridgeConfig::default()));
        assert_eq!(session.subscriber_count(), 1);
        assert!(panel.is_listening());
    }

    #[test]
    fn config_install_failure_propagates_without_subscribing() {
        let session = Arc::new(RejectingSession {
            subscriptions: Mutex::new(0),
        });
        let result = ChartPanel::mount(
            session.clone(),
            Arc::new(NullRenderer),
            BridgeConfig::default(),
        );
        let err = result.err().unwrap();
        assert_eq!(err.code(), "CONFIG_INSTALL_FAILED");
        assert_eq!(*session.subscriptions.lock().unwrap(), 0);
    }

    #[test]
    fn unmount_revokes_subscription() {
        let session = Arc::new(LocalSession::new());
        let panel = ChartPanel::mount(
            session.clone(),
            Arc::new(NullRenderer),
            BridgeConfig::default(),
        )
        .unwrap();
        panel.unmount();
        assert_eq!(session.subscriber_count(), 0);
    }

    #[test]
    fn reconfigure_switches_watched_tool() {
        let session = Arc::new(LocalSession::new());
        let mut panel = ChartPanel::mount(
            session.clone(),
            Arc::new(NullRenderer),
            BridgeConfig::default(),
        )
        .unwrap();

        panel
            .reconfigure(BridgeConfig {
                tool: ChartTool::RenderAltair,
                ..BridgeConfig::default()
            })
            .unwrap();
        assert_eq!(session.subscriber_count(), 1);

        session
            .emit_tool_call(&graph_call("checkProcedureAlignment", r#"{"mark":"bar"}"#))
            .unwrap();
        assert_eq!(panel.last_spec(), None);

        session
            .emit_tool_call(&graph_call("render_altair", r#"{"mark":"bar"}"#))
            .unwrap();
        assert_eq!(panel.last_spec().as_deref(), Some(r#"{"mark":"bar"}"#));

        let installed = session.installed_config().unwrap();
        assert_eq!(
            installed.function_declarations().next().map(|d| d.name()),
            Some("render_altair")
        );
    }

    #[test]
    fn reconfigure_with_same_route_keeps_listener() {
        let session = Arc::new(LocalSession::new());
        let mut panel = ChartPanel::mount(
            session.clone(),
            Arc::new(NullRenderer),
            BridgeConfig::default(),
        )
        .unwrap();
        panel
            .reconfigure(BridgeConfig {
                voice_name: "Puck".to_owned(),
                ..BridgeConfig::default()
            })
            .unwrap();
        assert_eq!(session.subscriber_count(), 1);
        assert_eq!(panel.config().voice_name, "Puck");
    }

    #[test]
    fn reconfigure_applies_new_acknowledgement_policy() {
        let session = Arc::new(LocalSession::new());
        let mut panel = ChartPanel::mount(
            session.clone(),
            Arc::new(NullRenderer),
            BridgeConfig::default(),
        )
        .unwrap();

        session
            .emit_tool_call(&graph_call("checkProcedureAlignment", r#"{"mark":"bar"}"#))
            .unwrap();
        assert!(session.sent_responses().is_empty());

        panel
            .reconfigure(BridgeConfig {
                acknowledge: AcknowledgeConfig {
                    enabled: true,
                    delay_ms: 0,
                },
                ..BridgeConfig::default()
            })
            .unwrap();
        assert_eq!(session.subscriber_count(), 1);

        session
            .emit_tool_call(&graph_call("checkProcedureAlignment", r#"{"mark":"line"}"#))
            .unwrap();
        assert_eq!(session.sent_responses().len(), 1);

        panel.reconfigure(BridgeConfig::default()).unwrap();
        assert_eq!(session.subscriber_count(), 1);
        session
            .emit_tool_call(&graph_call("checkProcedureAlignment", r#"{"mark":"area"}"#))
            .unwrap();
        assert_eq!(session.sent_responses().len(), 1);
        assert_eq!(panel.last_spec().as_deref(), Some(r#"{"mark":"area"}"#));
    }

    #[test]
    fn unmount_from_earlier_subscriber_blocks_render() {
        let session = Arc::new(LocalSession::new());
        let slot: Arc<Mutex<Option<ChartPanel>>> = Arc::new(Mutex::new(None));

        let teardown = slot.clone();
        session.subscribe_tool_calls(Arc::new(move |_: &ToolCall| -> Result<()> {
            if let Some(panel) = teardown.lock().unwrap().take() {
                panel.unmount();
            }
            Ok(())
        }));

        let panel = ChartPanel::mount(
            session.clone(),
            Arc::new(NullRenderer),
            BridgeConfig::default(),
        )
        .unwrap();
        panel.attach(MountPoint::with_id("m", 10.0, 10.0)).unwrap();
        let sink = panel.sink.clone();
        *slot.lock().unwrap() = Some(panel);

        assert_eq!(
            session
                .emit_tool_call(&graph_call("checkProcedureAlignment", r#"{"mark":"bar"}"#))
                .unwrap(),
            1
        );
        assert_eq!(session.subscriber_count(), 1);
        let sink = sink.lock().unwrap();
        assert_eq!(sink.renders_issued(), 0);
        assert_eq!(sink.last_spec(), None);
    }

    #[test]
    fn spec_waits_for_surface() {
        let session = Arc::new(LocalSession::new());
        let panel = ChartPanel::mount(
            session.clone(),
            Arc::new(NullRenderer),
            BridgeConfig::default(),
        )
        .unwrap();

        session
            .emit_tool_call(&graph_call("checkProcedureAlignment", r#"{"mark":"point"}"#))
            .unwrap();
        assert_eq!(panel.renders_issued(), 0);

        assert!(panel.attach(MountPoint::with_id("m", 10.0, 10.0)).unwrap());
        assert_eq!(panel.renders_issued(), 1);
        assert!(panel.detach().unwrap().is_some());
    }
}
