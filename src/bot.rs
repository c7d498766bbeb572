//! Bot startup and the event loop.
//!
//! [`Session`] is the connection-independent core: it owns the bus and the
//! plugins and turns raw callbacks into dispatched events. [`Bot`] wires a
//! session to a real [`IrcClient`] and runs until the connection closes or
//! the process is interrupted.

use crate::bus::EventBus;
use crate::config::Config;
use crate::connection::{ClientOptions, Connection, IrcClient, RawEvent};
use crate::event::NormalizedEvent;
use crate::normalizer::{Routed, normalize};
use crate::outbound::{EchoReceiver, Outbound};
use crate::plugins::{CommandDispatcher, PluginHandle, PluginRegistry};
use crate::telemetry::{DispatchTimer, spans};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// The bus and plugins for one connection.
pub struct Session {
    conn: Arc<dyn Connection>,
    bus: EventBus,
    echoes: EchoReceiver,
    plugins: Vec<PluginHandle>,
}

impl Session {
    pub fn new(conn: Arc<dyn Connection>) -> Self {
        let (outbound, echoes) = Outbound::new(conn.clone());
        Self {
            conn,
            bus: EventBus::new(outbound),
            echoes,
            plugins: Vec::new(),
        }
    }

    /// Start the command dispatcher, then every plugin in order.
    pub fn start(&mut self, plugins: Vec<PluginHandle>) {
        let mut commands = PluginHandle::new(
            Box::new(CommandDispatcher::new()),
            Value::Object(Default::default()),
        );
        commands.begin(&mut self.bus);
        self.plugins.push(commands);

        for mut plugin in plugins {
            plugin.begin(&mut self.bus);
            self.plugins.push(plugin);
        }
        info!(
            plugins = self.plugins.len(),
            subscribers = self.bus.subscriber_count(),
            "session started"
        );
    }

    pub fn plugins(&self) -> &[PluginHandle] {
        &self.plugins
    }

    /// Normalize and dispatch one raw callback, then anything it caused the
    /// bot to send.
    ///
    /// Returns the event as the last subscriber left it, or `None` when the
    /// callback is not published.
    pub fn handle_raw(&mut self, raw: RawEvent) -> Option<NormalizedEvent> {
        let routed = normalize(raw, &self.conn.nick())?;
        let event = self.dispatch(routed);
        self.drain_echoes();
        Some(event)
    }

    /// Deliver one routed event to the bus.
    pub fn dispatch(&mut self, (category, event): Routed) -> NormalizedEvent {
        let _span = spans::dispatch(category.as_str(), event.kind.as_str()).entered();
        let _timer = DispatchTimer::new(event.kind.as_str());
        self.bus.dispatch(category, event)
    }

    /// Dispatch queued `self*` events until none remain. Returns how many ran.
    pub fn drain_echoes(&mut self) -> usize {
        let mut count = 0;
        while let Ok(routed) = self.echoes.try_recv() {
            self.dispatch(routed);
            count += 1;
        }
        count
    }

    /// Wait for the next `self*` event, e.g. one sent from a spawned task.
    pub async fn next_echo(&mut self) -> Option<Routed> {
        self.echoes.recv().await
    }

    /// Stop every running plugin, in start order.
    pub fn stop(&mut self) {
        for plugin in &mut self.plugins {
            plugin.stop();
        }
    }
}

enum Input {
    Raw(Option<RawEvent>),
    Echo(Routed),
    Shutdown,
}

/// A configured bot, ready to connect.
pub struct Bot {
    config: Config,
    registry: PluginRegistry,
}

impl Bot {
    pub fn new(config: Config, registry: PluginRegistry) -> Self {
        Self { config, registry }
    }

    /// Load plugins, connect, and run until disconnected or interrupted.
    pub async fn run(self) -> anyhow::Result<()> {
        let plugins = self.registry.load_plugins(&self.config.plugins);
        info!(loaded = plugins.len(), "plugins loaded");

        let (client, mut events) = IrcClient::connect(ClientOptions::from(&self.config)).await?;
        let mut session = Session::new(Arc::new(client.clone()));
        session.start(plugins);

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            let input = tokio::select! {
                raw = events.recv() => Input::Raw(raw),
                Some(echo) = session.next_echo() => Input::Echo(echo),
                _ = &mut shutdown => Input::Shutdown,
            };
            match input {
                Input::Raw(Some(raw)) => {
                    session.handle_raw(raw);
                }
                Input::Raw(None) => {
                    warn!("connection closed");
                    break;
                }
                Input::Echo(echo) => {
                    session.dispatch(echo);
                    session.drain_echoes();
                }
                Input::Shutdown => {
                    info!("interrupted, shutting down");
                    if let Err(e) = client.quit("shutting down") {
                        warn!(error = %e, "failed to send QUIT");
                    }
                    break;
                }
            }
        }

        session.stop();
        Ok(())
    }
}
