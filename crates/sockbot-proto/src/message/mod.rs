//! Owned IRC messages.
//!
//! A [`Message`] keeps the command as its raw token and the parameters as an
//! ordered list. The bot only interprets a handful of commands, so there is no
//! per-command enum; everything else is passed through untouched.

mod parse;
mod serialize;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MessageParseError, ProtocolError};

/// An owned IRC message.
///
/// # Example
///
/// ```
/// use sockbot_proto::Message;
///
/// let msg: Message = ":irc.example.net 001 sockbot :Welcome".parse().unwrap();
/// assert_eq!(msg.numeric(), Some(1));
/// assert_eq!(msg.param(1), Some("Welcome"));
/// ```
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Message {
    /// Raw IRCv3 tags (without the leading `@`), if the server sent any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    /// Message source (e.g., `nick!user@host` or a server name).
    pub prefix: Option<String>,
    /// Command token, upper-cased, or a three digit numeric.
    pub command: String,
    /// Command parameters, trailing parameter last.
    pub params: Vec<String>,
}

impl Message {
    /// Create a message with no source.
    pub fn new<C, I, P>(command: C, params: I) -> Self
    where
        C: Into<String>,
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            tags: None,
            prefix: None,
            command: command.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    /// Attach a source prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// `PRIVMSG <target> :<text>`
    pub fn privmsg(target: &str, text: &str) -> Self {
        Self::new("PRIVMSG", [target, text])
    }

    /// `NOTICE <target> :<text>`
    pub fn notice(target: &str, text: &str) -> Self {
        Self::new("NOTICE", [target, text])
    }

    /// `JOIN <channel>`
    pub fn join(channel: &str) -> Self {
        Self::new("JOIN", [channel])
    }

    /// `PART <channel> [:<reason>]`
    pub fn part(channel: &str, reason: Option<&str>) -> Self {
        match reason {
            Some(reason) => Self::new("PART", [channel, reason]),
            None => Self::new("PART", [channel]),
        }
    }

    /// `NICK <nick>`
    pub fn nick(nick: &str) -> Self {
        Self::new("NICK", [nick])
    }

    /// `USER <user> 0 * :<realname>`
    pub fn user(user: &str, real_name: &str) -> Self {
        Self::new("USER", [user, "0", "*", real_name])
    }

    /// `PASS <password>`
    pub fn pass(password: &str) -> Self {
        Self::new("PASS", [password])
    }

    /// `PONG <token>`
    pub fn pong(token: &str) -> Self {
        Self::new("PONG", [token])
    }

    /// `QUIT [:<reason>]`
    pub fn quit(reason: &str) -> Self {
        Self::new("QUIT", [reason])
    }

    /// Get the nickname from the message prefix, if the source is a user.
    ///
    /// Server sources (no `!` or `@`, containing a dot) yield `None`.
    pub fn source_nickname(&self) -> Option<&str> {
        let prefix = self.prefix.as_deref()?;
        match prefix.find(['!', '@']) {
            Some(end) => Some(&prefix[..end]),
            None if prefix.contains('.') => None,
            None => Some(prefix),
        }
    }

    /// Parameter at `index`, if present.
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// The numeric reply code, if the command is a three digit numeric.
    pub fn numeric(&self) -> Option<u16> {
        if self.command.len() == 3 && self.command.bytes().all(|b| b.is_ascii_digit()) {
            self.command.parse().ok()
        } else {
            None
        }
    }

    /// Whether this is an `ERROR` command or a 4xx/5xx error numeric.
    pub fn is_error(&self) -> bool {
        self.command == "ERROR" || matches!(self.numeric(), Some(400..=599))
    }
}

impl FromStr for Message {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Err(ProtocolError::InvalidMessage {
                string: s.to_owned(),
                cause: MessageParseError::EmptyMessage,
            });
        }

        let parsed = parse::ParsedMessage::parse(line).map_err(|cause| {
            ProtocolError::InvalidMessage {
                string: s.to_owned(),
                cause,
            }
        })?;

        Ok(Message {
            tags: parsed.tags.map(str::to_owned),
            prefix: parsed.prefix.map(str::to_owned),
            command: parsed.command.to_ascii_uppercase(),
            params: parsed.params.into_iter().map(str::to_owned).collect(),
        })
    }
}
