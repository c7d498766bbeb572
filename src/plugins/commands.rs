//! Built-in chat commands (`!join`, `!part`).
//!
//! The dispatcher is subscribed to `message_received` before any plugin, so
//! it gets first claim on every command it knows.

use super::Plugin;
use crate::bus::EventBus;
use crate::event::{EventCategory, NormalizedEvent};
use crate::outbound::Outbound;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Runs a claimed command with its arguments.
pub type CommandHandler = fn(&Outbound, Vec<String>);

/// Routes command tokens (marker included, case-sensitive) to handlers.
#[derive(Clone)]
pub struct CommandDispatcher {
    handlers: HashMap<&'static str, CommandHandler>,
}

impl Default for CommandDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandDispatcher {
    /// A dispatcher holding the built-in commands.
    pub fn new() -> Self {
        let mut handlers: HashMap<&'static str, CommandHandler> = HashMap::new();
        handlers.insert("!join", handle_join);
        handlers.insert("!part", handle_part);
        Self { handlers }
    }

    /// Whether `command` names a built-in command.
    pub fn handles(&self, command: &str) -> bool {
        self.handlers.contains_key(command)
    }

    /// Claim and run the event's command if it is one of ours.
    ///
    /// Returns whether the event was handled.
    pub fn process(&self, out: &Outbound, event: &mut NormalizedEvent) -> bool {
        if !event.command().is_some_and(|c| self.handles(c)) {
            return false;
        }
        let Some(command) = event.claim_command() else {
            return false;
        };
        let Some(&handler) = self.handlers.get(command.name.as_str()) else {
            return false;
        };
        debug!(command = %command.name, args = command.args.len(), "running command");
        handler(out, command.args);
        true
    }
}

impl Plugin for CommandDispatcher {
    fn name(&self) -> &str {
        "commands"
    }

    fn begin(&mut self, _config: &Value, bus: &mut EventBus) {
        let dispatcher = self.clone();
        bus.on(EventCategory::MessageReceived, move |out, event| {
            dispatcher.process(out, event);
        });
    }
}

/// Split `args` into a channel and the free text after an optional `--`.
fn channel_and_text(mut args: Vec<String>) -> Option<(String, String)> {
    if args.is_empty() {
        return None;
    }
    let channel = args.remove(0);
    if args.first().is_some_and(|a| a == "--") {
        args.remove(0);
    }
    Some((channel, args.join(" ")))
}

/// `!join <channel> [--] [greeting...]`
fn handle_join(out: &Outbound, args: Vec<String>) {
    let Some((channel, greeting)) = channel_and_text(args) else {
        warn!("!join without a channel");
        return;
    };
    let joining = out.join(&channel);
    let out = out.clone();
    tokio::spawn(async move {
        if let Err(e) = joining.await {
            warn!(channel = %channel, error = %e, "join failed");
            return;
        }
        if !greeting.is_empty() {
            if let Err(e) = out.say(&channel, &greeting) {
                warn!(channel = %channel, error = %e, "failed to send greeting");
            }
        }
    });
}

/// `!part <channel> [--] [farewell...]`
fn handle_part(out: &Outbound, args: Vec<String>) {
    let Some((channel, farewell)) = channel_and_text(args) else {
        warn!("!part without a channel");
        return;
    };
    if !farewell.is_empty() {
        if let Err(e) = out.say(&channel, &farewell) {
            warn!(channel = %channel, error = %e, "failed to send farewell");
        }
    }
    if let Err(e) = out.part(&channel, None) {
        warn!(channel = %channel, error = %e, "part failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use crate::testing::{RecordingConnection, recording_bus};
    use std::time::Duration;

    fn message(text: &str) -> NormalizedEvent {
        NormalizedEvent::build(
            EventKind::Message,
            Some("bob".into()),
            Some("#lobby".into()),
            Some(text.into()),
            None,
        )
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[test]
    fn plain_text_is_not_handled() {
        let (bus, _echoes, conn) = recording_bus();
        let mut event = message("hello there");
        assert!(!CommandDispatcher::new().process(bus.outbound(), &mut event));
        assert!(conn.sent().is_empty());
    }

    #[test]
    fn unknown_command_is_left_alone() {
        let (bus, _echoes, _conn) = recording_bus();
        let mut event = message("!roll 4dF");
        assert!(!CommandDispatcher::new().process(bus.outbound(), &mut event));
        assert_eq!(event.command(), Some("!roll"));
        assert!(!event.is_consumed());
    }

    #[test]
    fn commands_are_case_sensitive() {
        let dispatcher = CommandDispatcher::new();
        assert!(dispatcher.handles("!join"));
        assert!(!dispatcher.handles("!JOIN"));

        let (bus, _echoes, conn) = recording_bus();
        let mut event = message("!JOIN #games");
        assert!(!dispatcher.process(bus.outbound(), &mut event));
        assert!(!event.is_consumed());
        assert!(conn.sent().is_empty());
    }

    #[tokio::test]
    async fn join_then_greets() {
        let (bus, _echoes, conn) = recording_bus();
        let mut event = message("!join #games -- hello all");

        assert!(CommandDispatcher::new().process(bus.outbound(), &mut event));
        assert_eq!(event.command(), None);
        assert!(event.args().is_empty());

        settle().await;
        assert_eq!(conn.sent(), vec!["join #games", "say #games hello all"]);
    }

    #[tokio::test]
    async fn join_without_greeting_says_nothing() {
        let (bus, _echoes, conn) = recording_bus();
        let mut event = message("!join #games");
        CommandDispatcher::new().process(bus.outbound(), &mut event);

        settle().await;
        assert_eq!(conn.sent(), vec!["join #games"]);
    }

    #[tokio::test]
    async fn rejected_join_skips_greeting() {
        let conn = RecordingConnection::rejecting_joins();
        let (out, _echoes) = Outbound::new(conn.clone());
        let mut event = message("!join #secret hi");
        CommandDispatcher::new().process(&out, &mut event);

        settle().await;
        assert_eq!(conn.sent(), vec!["join #secret"]);
    }

    #[test]
    fn part_says_farewell_first() {
        let (bus, _echoes, conn) = recording_bus();
        let mut event = message("!part #games -- see you");
        CommandDispatcher::new().process(bus.outbound(), &mut event);
        assert_eq!(conn.sent(), vec!["say #games see you", "part #games"]);
    }

    #[test]
    fn part_without_farewell() {
        let (bus, _echoes, conn) = recording_bus();
        let mut event = message("!part #games");
        CommandDispatcher::new().process(bus.outbound(), &mut event);
        assert_eq!(conn.sent(), vec!["part #games"]);
    }

    #[test]
    fn missing_channel_is_claimed_and_ignored() {
        let (bus, _echoes, conn) = recording_bus();
        let mut event = message("!part");
        assert!(CommandDispatcher::new().process(bus.outbound(), &mut event));
        assert!(event.is_consumed());
        assert!(conn.sent().is_empty());
    }

    #[test]
    fn second_dispatcher_sees_no_command() {
        let (bus, _echoes, conn) = recording_bus();
        let mut event = message("!part #games");
        let dispatcher = CommandDispatcher::new();

        assert!(dispatcher.process(bus.outbound(), &mut event));
        assert!(!dispatcher.process(bus.outbound(), &mut event));
        assert_eq!(conn.sent(), vec!["part #games"]);
    }

    #[test]
    fn begin_subscribes_to_received_messages() {
        let (mut bus, _echoes, conn) = recording_bus();
        CommandDispatcher::new().begin(&Value::Null, &mut bus);

        let event = bus.dispatch(EventCategory::MessageReceived, message("!part #games"));
        assert!(event.is_consumed());
        assert_eq!(conn.sent(), vec!["part #games"]);
    }
}
