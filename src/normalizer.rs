//! Raw protocol callbacks to normalized events.
//!
//! This is the only place that knows each callback's argument shape. Every
//! other part of the bot sees [`NormalizedEvent`]s routed by category.

use crate::connection::RawEvent;
use crate::event::{EventCategory, EventKind, NormalizedEvent};

/// A normalized event and the category it is published under.
pub type Routed = (EventCategory, NormalizedEvent);

/// Normalize one raw callback.
///
/// `own_nick` is the bot's current nickname, used as the target of a `pm`.
/// A `message` the client marked private is dropped because the same line
/// also arrives as a `pm`.
pub fn normalize(raw: RawEvent, own_nick: &str) -> Option<Routed> {
    let (kind, who, what, text, message) = match raw {
        RawEvent::Join {
            channel,
            nick,
            message,
        } => {
            let text = format!("joined channel {channel}");
            (EventKind::Join, Some(nick), Some(channel), Some(text), message)
        }
        RawEvent::Part {
            channel,
            nick,
            reason,
            message,
        } => {
            let text = format!("left channel {channel} ({})", reason.unwrap_or_default());
            (EventKind::Part, Some(nick), Some(channel), Some(text), message)
        }
        RawEvent::Quit {
            nick,
            reason,
            message,
        } => {
            let text = format!("quit ({})", reason.unwrap_or_default());
            (EventKind::Quit, Some(nick), None, Some(text), message)
        }
        RawEvent::Kick {
            channel,
            nick,
            by,
            reason,
            message,
        } => {
            let text = format!("kicked {nick} ({})", reason.unwrap_or_default());
            (EventKind::Kick, Some(by), Some(channel), Some(text), message)
        }
        RawEvent::Kill {
            nick,
            reason,
            message,
        } => {
            let text = format!("killed ({})", reason.unwrap_or_default());
            (EventKind::Kill, Some(nick), None, Some(text), message)
        }
        RawEvent::Message {
            actor,
            target,
            text,
            private,
            message,
        } => {
            if private {
                return None;
            }
            (EventKind::Message, Some(actor), Some(target), Some(text), message)
        }
        RawEvent::Pm {
            actor,
            text,
            message,
        } => (
            EventKind::Pm,
            Some(actor),
            Some(own_nick.to_string()),
            Some(text),
            message,
        ),
        RawEvent::Notice {
            nick,
            target,
            text,
            message,
        } => (EventKind::Notice, nick, Some(target), Some(text), message),
        RawEvent::Nick { old, new, message } => {
            let text = format!("changed nickname to {new}");
            (EventKind::Nick, Some(old), None, Some(text), message)
        }
        RawEvent::Action {
            nick,
            target,
            text,
            message,
        } => (EventKind::Action, Some(nick), Some(target), Some(text), message),
        RawEvent::Raw(message) => (EventKind::Raw, None, None, None, message),
        RawEvent::Error(message) => (EventKind::Error, None, None, None, message),
    };

    let event = NormalizedEvent::build(kind, who, what, text, Some(message));
    Some((kind.category(), event))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sockbot_proto::Message;

    const ME: &str = "sockbot";

    fn msg(line: &str) -> Message {
        line.parse().unwrap()
    }

    fn routed(raw: RawEvent) -> Routed {
        normalize(raw, ME).expect("event should be published")
    }

    fn assert_shape(
        (category, event): &Routed,
        expected_category: EventCategory,
        who: Option<&str>,
        what: Option<&str>,
        text: &str,
    ) {
        assert_eq!(*category, expected_category);
        assert_eq!(event.who.as_deref(), who);
        assert_eq!(event.what.as_deref(), what);
        assert_eq!(event.text, text);
    }

    #[test]
    fn join() {
        let raw = msg(":bob!b@h JOIN #lobby");
        let r = routed(RawEvent::Join {
            channel: "#lobby".into(),
            nick: "bob".into(),
            message: raw.clone(),
        });
        assert_shape(
            &r,
            EventCategory::ChannelAction,
            Some("bob"),
            Some("#lobby"),
            "joined channel #lobby",
        );
        assert_eq!(r.1.kind, EventKind::Join);
        assert_eq!(r.1.command(), None);
        assert_eq!(r.1.reply.as_deref(), Some("#lobby"));
        assert_eq!(r.1.raw.as_ref(), Some(&raw));
    }

    #[test]
    fn part() {
        let r = routed(RawEvent::Part {
            channel: "#lobby".into(),
            nick: "bob".into(),
            reason: Some("off to bed".into()),
            message: msg(":bob PART #lobby :off to bed"),
        });
        assert_shape(
            &r,
            EventCategory::ChannelAction,
            Some("bob"),
            Some("#lobby"),
            "left channel #lobby (off to bed)",
        );
    }

    #[test]
    fn part_without_reason() {
        let r = routed(RawEvent::Part {
            channel: "#lobby".into(),
            nick: "bob".into(),
            reason: None,
            message: msg(":bob PART #lobby"),
        });
        assert_eq!(r.1.text, "left channel #lobby ()");
    }

    #[test]
    fn quit() {
        let r = routed(RawEvent::Quit {
            nick: "bob".into(),
            reason: Some("Ping timeout".into()),
            message: msg(":bob QUIT :Ping timeout"),
        });
        assert_shape(&r, EventCategory::UserAction, Some("bob"), None, "quit (Ping timeout)");
    }

    #[test]
    fn kick_attributes_to_kicker() {
        let r = routed(RawEvent::Kick {
            channel: "#lobby".into(),
            nick: "bob".into(),
            by: "alice".into(),
            reason: Some("flooding".into()),
            message: msg(":alice KICK #lobby bob :flooding"),
        });
        assert_shape(
            &r,
            EventCategory::ChannelAction,
            Some("alice"),
            Some("#lobby"),
            "kicked bob (flooding)",
        );
    }

    #[test]
    fn kill() {
        let r = routed(RawEvent::Kill {
            nick: "bob".into(),
            reason: Some("spam".into()),
            message: msg(":oper KILL bob :spam"),
        });
        assert_shape(&r, EventCategory::UserAction, Some("bob"), None, "killed (spam)");
    }

    #[test]
    fn channel_message() {
        let r = routed(RawEvent::Message {
            actor: "bob".into(),
            target: "#lobby".into(),
            text: "!roll 4dF".into(),
            private: false,
            message: msg(":bob PRIVMSG #lobby :!roll 4dF"),
        });
        assert_shape(
            &r,
            EventCategory::MessageReceived,
            Some("bob"),
            Some("#lobby"),
            "!roll 4dF",
        );
        assert_eq!(r.1.command(), Some("!roll"));
        assert_eq!(r.1.args(), ["4dF"]);
    }

    #[test]
    fn message_to_self_is_dropped() {
        let raw = RawEvent::Message {
            actor: "bob".into(),
            target: ME.into(),
            text: "psst".into(),
            private: true,
            message: msg(":bob PRIVMSG sockbot :psst"),
        };
        assert_eq!(normalize(raw, ME), None);
    }

    #[test]
    fn private_flag_wins_over_current_nick() {
        // The nick may change between reading the line and dispatching it.
        let raw = RawEvent::Message {
            actor: "bob".into(),
            target: "SockBot".into(),
            text: "psst".into(),
            private: true,
            message: msg(":bob PRIVMSG SockBot :psst"),
        };
        assert_eq!(normalize(raw, "sockbot_"), None);
    }

    #[test]
    fn pm_targets_self_and_replies_to_sender() {
        let r = routed(RawEvent::Pm {
            actor: "bob".into(),
            text: "psst".into(),
            message: msg(":bob PRIVMSG sockbot :psst"),
        });
        assert_shape(&r, EventCategory::MessageReceived, Some("bob"), Some(ME), "psst");
        assert_eq!(r.1.kind, EventKind::Pm);
        assert_eq!(r.1.reply.as_deref(), Some("bob"));
    }

    #[test]
    fn notice() {
        let r = routed(RawEvent::Notice {
            nick: Some("bob".into()),
            target: "#lobby".into(),
            text: "heads up".into(),
            message: msg(":bob NOTICE #lobby :heads up"),
        });
        assert_shape(
            &r,
            EventCategory::MessageReceived,
            Some("bob"),
            Some("#lobby"),
            "heads up",
        );
    }

    #[test]
    fn server_notice_has_no_actor() {
        let r = routed(RawEvent::Notice {
            nick: None,
            target: "*".into(),
            text: "Looking up your hostname".into(),
            message: msg(":irc.example.net NOTICE * :Looking up your hostname"),
        });
        assert_eq!(r.1.who, None);
    }

    #[test]
    fn nick_change() {
        let r = routed(RawEvent::Nick {
            old: "bob".into(),
            new: "bobby".into(),
            message: msg(":bob NICK bobby"),
        });
        assert_shape(
            &r,
            EventCategory::UserAction,
            Some("bob"),
            None,
            "changed nickname to bobby",
        );
    }

    #[test]
    fn action() {
        let r = routed(RawEvent::Action {
            nick: "bob".into(),
            target: "#lobby".into(),
            text: "waves".into(),
            message: msg(":bob PRIVMSG #lobby :\x01ACTION waves\x01"),
        });
        assert_shape(
            &r,
            EventCategory::MessageReceived,
            Some("bob"),
            Some("#lobby"),
            "waves",
        );
        assert_eq!(r.1.kind, EventKind::Action);
    }

    #[test]
    fn raw_and_error_carry_only_payload() {
        let line = msg(":irc.example.net 433 * sockbot :Nickname is already in use");
        for (raw, kind, category) in [
            (RawEvent::Raw(line.clone()), EventKind::Raw, EventCategory::Raw),
            (RawEvent::Error(line.clone()), EventKind::Error, EventCategory::Error),
        ] {
            let (cat, event) = routed(raw);
            assert_eq!(cat, category);
            assert_eq!(event.kind, kind);
            assert_eq!(event.who, None);
            assert_eq!(event.what, None);
            assert_eq!(event.text, "");
            assert_eq!(event.raw.as_ref(), Some(&line));
        }
    }
}
