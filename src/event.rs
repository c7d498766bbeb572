//! Normalized events and their routing categories.
//!
//! Every protocol callback becomes a [`NormalizedEvent`]: who did it, what it
//! was aimed at, the text, and, when the text starts with the command
//! marker, a parsed command with its arguments. Plugins subscribe by
//! [`EventCategory`], never by protocol command.

use serde::Serialize;
use sockbot_proto::Message;
use std::fmt;
use std::str::FromStr;

/// Leading character that turns message text into a command.
pub const COMMAND_MARKER: char = '!';

// ============================================================================
// Event kinds
// ============================================================================

/// Raw event type, as named by the connection callbacks.
///
/// The `Self*` kinds are synthesized by [`crate::outbound::Outbound`] for
/// messages the bot sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    Join,
    Part,
    Quit,
    Kick,
    Kill,
    Message,
    Pm,
    Notice,
    Nick,
    Action,
    Raw,
    Error,
    SelfMessage,
    SelfNotice,
    SelfAction,
}

impl EventKind {
    pub const ALL: [EventKind; 15] = [
        Self::Join,
        Self::Part,
        Self::Quit,
        Self::Kick,
        Self::Kill,
        Self::Message,
        Self::Pm,
        Self::Notice,
        Self::Nick,
        Self::Action,
        Self::Raw,
        Self::Error,
        Self::SelfMessage,
        Self::SelfNotice,
        Self::SelfAction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::Part => "part",
            Self::Quit => "quit",
            Self::Kick => "kick",
            Self::Kill => "kill",
            Self::Message => "message",
            Self::Pm => "pm",
            Self::Notice => "notice",
            Self::Nick => "nick",
            Self::Action => "action",
            Self::Raw => "raw",
            Self::Error => "error",
            Self::SelfMessage => "selfMessage",
            Self::SelfNotice => "selfNotice",
            Self::SelfAction => "selfAction",
        }
    }

    /// Routing category for this kind.
    pub fn category(&self) -> EventCategory {
        match self {
            Self::Message | Self::Pm | Self::Notice | Self::Action => {
                EventCategory::MessageReceived
            }
            Self::Join | Self::Part | Self::Kick => EventCategory::ChannelAction,
            Self::Quit | Self::Nick | Self::Kill => EventCategory::UserAction,
            Self::SelfMessage | Self::SelfNotice | Self::SelfAction => EventCategory::MessageSent,
            Self::Raw => EventCategory::Raw,
            Self::Error => EventCategory::Error,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known event kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl FromStr for EventKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

// ============================================================================
// Categories
// ============================================================================

/// The channels plugins subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    MessageReceived,
    MessageSent,
    UserAction,
    ChannelAction,
    Raw,
    Error,
    /// Not routed to any category subscriber; visible to catch-all observers.
    Unknown,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MessageReceived => "message_received",
            Self::MessageSent => "message_sent",
            Self::UserAction => "user_action",
            Self::ChannelAction => "channel_action",
            Self::Raw => "raw",
            Self::Error => "error",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a raw event type name to its category. Total: unrecognized names
/// map to [`EventCategory::Unknown`].
pub fn select_event(raw_type: &str) -> EventCategory {
    raw_type
        .parse::<EventKind>()
        .map(|kind| kind.category())
        .unwrap_or(EventCategory::Unknown)
}

// ============================================================================
// Command parsing
// ============================================================================

/// Separators for command arguments. Line feed is not one, so a
/// multi-line argument stays one token.
pub fn is_command_space(c: char) -> bool {
    matches!(
        c,
        ' ' | '\u{000c}'
            | '\r'
            | '\t'
            | '\u{000b}'
            | '\u{00a0}'
            | '\u{1680}'
            | '\u{180e}'
            | '\u{2000}'..='\u{200a}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202f}'
            | '\u{205f}'
            | '\u{3000}'
    )
}

/// Split text into tokens on runs of [`is_command_space`].
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(is_command_space)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// A command taken off an event by the subscriber that handles it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command token, marker included (e.g. `!roll`).
    pub name: String,
    pub args: Vec<String>,
}

// ============================================================================
// Normalized events
// ============================================================================

/// The canonical record flowing through the [`crate::bus::EventBus`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Originating actor.
    pub who: Option<String>,
    /// Target channel or user.
    pub what: Option<String>,
    /// Message body, empty when the callback had none.
    pub text: String,
    /// Where a response should go: the actor for private messages, the
    /// target otherwise.
    pub reply: Option<String>,
    /// Original protocol payload.
    pub raw: Option<Message>,
    command: Option<String>,
    args: Vec<String>,
    consumed: bool,
}

impl NormalizedEvent {
    /// Build an event, parsing a command out of `text` when it starts with
    /// [`COMMAND_MARKER`].
    pub fn build(
        kind: EventKind,
        who: Option<String>,
        what: Option<String>,
        text: Option<String>,
        raw: Option<Message>,
    ) -> Self {
        let text = text.unwrap_or_default();
        let (command, args) = if text.starts_with(COMMAND_MARKER) {
            let mut tokens = tokenize(&text).into_iter();
            (tokens.next(), tokens.collect())
        } else {
            (None, Vec::new())
        };
        let reply = match kind {
            EventKind::Pm => who.clone(),
            _ => what.clone(),
        };

        Self {
            kind,
            who,
            what,
            text,
            reply,
            raw,
            command,
            args,
            consumed: false,
        }
    }

    pub fn category(&self) -> EventCategory {
        self.kind.category()
    }

    /// The pending command, if one was parsed and nobody has claimed it.
    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    /// Arguments of the pending command; empty when there is none.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Take the command off the event. Later subscribers see plain text.
    ///
    /// Returns `None` if there was no command or it was already claimed.
    pub fn claim_command(&mut self) -> Option<Command> {
        if self.consumed {
            return None;
        }
        let name = self.command.take()?;
        self.consumed = true;
        Some(Command {
            name,
            args: std::mem::take(&mut self.args),
        })
    }

    /// Whether a subscriber has claimed this event's command.
    pub fn is_consumed(&self) -> bool {
        self.consumed
    }
}
