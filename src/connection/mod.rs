//! The IRC connection collaborator.
//!
//! Everything the bot needs from the network is behind [`Connection`] (the
//! outbound half) and a stream of [`RawEvent`]s (the inbound half). The
//! concrete tokio client lives in [`client`]; tests substitute their own.

pub mod client;

use crate::error::ConnectionError;
use futures_util::future::BoxFuture;
use sockbot_proto::Message;

pub use client::{ClientOptions, IrcClient};

/// Outbound operations of a connection.
pub trait Connection: Send + Sync {
    /// The nickname the connection currently holds.
    fn nick(&self) -> String;

    /// Send a PRIVMSG.
    fn say(&self, target: &str, text: &str) -> Result<(), ConnectionError>;

    /// Send a NOTICE.
    fn notice(&self, target: &str, text: &str) -> Result<(), ConnectionError>;

    /// Send a CTCP ACTION (`/me`).
    fn action(&self, target: &str, text: &str) -> Result<(), ConnectionError>;

    /// Join a channel. The future resolves once the server confirms the join
    /// or rejects it.
    fn join(&self, channel: &str) -> BoxFuture<'static, Result<(), ConnectionError>>;

    /// Leave a channel.
    fn part(&self, channel: &str, reason: Option<&str>) -> Result<(), ConnectionError>;
}

/// A protocol callback in the connection's native argument shape.
///
/// Each variant keeps the message it came from so subscribers can inspect
/// the original payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RawEvent {
    Join {
        channel: String,
        nick: String,
        message: Message,
    },
    Part {
        channel: String,
        nick: String,
        reason: Option<String>,
        message: Message,
    },
    Quit {
        nick: String,
        reason: Option<String>,
        message: Message,
    },
    Kick {
        channel: String,
        /// The user who was kicked.
        nick: String,
        /// The user who did the kicking.
        by: String,
        reason: Option<String>,
        message: Message,
    },
    Kill {
        nick: String,
        reason: Option<String>,
        message: Message,
    },
    /// Every PRIVMSG, including ones addressed to the bot itself.
    Message {
        actor: String,
        target: String,
        text: String,
        /// Addressed to the bot. The same line also arrives as [`RawEvent::Pm`].
        private: bool,
        message: Message,
    },
    /// A PRIVMSG addressed to the bot.
    Pm {
        actor: String,
        text: String,
        message: Message,
    },
    Notice {
        /// `None` for server notices.
        nick: Option<String>,
        target: String,
        text: String,
        message: Message,
    },
    Nick {
        old: String,
        new: String,
        message: Message,
    },
    Action {
        nick: String,
        target: String,
        text: String,
        message: Message,
    },
    /// Every line received, before any other interpretation.
    Raw(Message),
    /// `ERROR`, error numerics, and unparseable input.
    Error(Message),
}
