//! Outbound actions that echo onto the event bus.
//!
//! Plugins never talk to the connection directly. [`Outbound`] forwards each
//! send to the connection and then queues a `self*` event under
//! `message_sent`, so outgoing traffic is observable exactly like incoming
//! traffic.

use crate::connection::Connection;
use crate::error::ConnectionError;
use crate::event::{EventKind, NormalizedEvent};
use crate::normalizer::Routed;
use futures_util::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Receives the events synthesized by [`Outbound`].
pub type EchoReceiver = mpsc::UnboundedReceiver<Routed>;

/// Cloneable handle for sending on behalf of the bot.
#[derive(Clone)]
pub struct Outbound {
    conn: Arc<dyn Connection>,
    echo: mpsc::UnboundedSender<Routed>,
}

impl Outbound {
    /// Wrap a connection. Synthesized events arrive on the returned receiver
    /// and are dispatched by whoever owns the bus.
    pub fn new(conn: Arc<dyn Connection>) -> (Self, EchoReceiver) {
        let (echo, rx) = mpsc::unbounded_channel();
        (Self { conn, echo }, rx)
    }

    /// The bot's current nickname.
    pub fn nick(&self) -> String {
        self.conn.nick()
    }

    pub fn say(&self, target: &str, text: &str) -> Result<(), ConnectionError> {
        self.conn.say(target, text)?;
        self.publish(EventKind::SelfMessage, target, text);
        Ok(())
    }

    pub fn notice(&self, target: &str, text: &str) -> Result<(), ConnectionError> {
        self.conn.notice(target, text)?;
        self.publish(EventKind::SelfNotice, target, text);
        Ok(())
    }

    pub fn action(&self, target: &str, text: &str) -> Result<(), ConnectionError> {
        self.conn.action(target, text)?;
        self.publish(EventKind::SelfAction, target, text);
        Ok(())
    }

    /// Join a channel; resolves when the server confirms. Nothing is echoed.
    pub fn join(&self, channel: &str) -> BoxFuture<'static, Result<(), ConnectionError>> {
        self.conn.join(channel)
    }

    /// Leave a channel. Nothing is echoed.
    pub fn part(&self, channel: &str, reason: Option<&str>) -> Result<(), ConnectionError> {
        self.conn.part(channel, reason)
    }

    fn publish(&self, kind: EventKind, target: &str, text: &str) {
        let event = NormalizedEvent::build(
            kind,
            Some(self.conn.nick()),
            Some(target.to_string()),
            Some(text.to_string()),
            None,
        );
        if self.echo.send((kind.category(), event)).is_err() {
            debug!(kind = %kind, "event bus gone, dropping echo");
        }
    }
}
