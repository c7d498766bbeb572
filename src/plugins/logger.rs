//! Chat transcript logger.
//!
//! Writes one line per event to a sink, defaulting to the `sockbot::chat`
//! tracing target. Can also announce the bot with a delayed notice.

use super::Plugin;
use crate::bus::EventBus;
use crate::event::{EventCategory, NormalizedEvent};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Receives finished log lines.
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

/// `HH:MM:SS` in UTC.
pub fn format_time(now: DateTime<Utc>) -> String {
    now.format("%H:%M:%S").to_string()
}

/// `({time}) {actor} => {target}: {text}`.
///
/// With no text the target is logged as the text instead, and the arrow is
/// omitted.
pub fn log_line(time: &str, actor: Option<&str>, target: Option<&str>, text: &str) -> String {
    let (target, text) = if text.is_empty() {
        ("", target.unwrap_or_default())
    } else {
        (target.unwrap_or_default(), text)
    };
    let arrow = if target.is_empty() {
        String::new()
    } else {
        format!(" => {target}")
    };
    format!("({time}) {}{arrow}: {text}", actor.unwrap_or_default())
}

fn event_line(event: &NormalizedEvent) -> String {
    log_line(
        &format_time(Utc::now()),
        event.who.as_deref(),
        event.what.as_deref(),
        &event.text,
    )
}

fn error_line(event: &NormalizedEvent) -> String {
    let raw = serde_json::to_string(&event.raw).unwrap_or_else(|_| "null".to_string());
    log_line(&format_time(Utc::now()), Some("ERROR"), None, &raw)
}

/// Optional notice sent once after startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Announce {
    pub target: String,
    pub text: String,
    #[serde(default)]
    pub delay_secs: u64,
}

fn chat_sink() -> LogSink {
    Arc::new(|line| info!(target: "sockbot::chat", "{}", line))
}

/// The logger plugin.
pub struct Logger {
    sink: LogSink,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    pub fn new() -> Self {
        Self::with_sink(chat_sink())
    }

    pub fn with_sink(sink: LogSink) -> Self {
        Self { sink }
    }
}

impl Plugin for Logger {
    fn name(&self) -> &str {
        "logger"
    }

    fn defaults(&self) -> Option<Value> {
        Some(Value::Object(Default::default()))
    }

    fn begin(&mut self, config: &Value, bus: &mut EventBus) {
        for category in [
            EventCategory::MessageReceived,
            EventCategory::MessageSent,
            EventCategory::UserAction,
            EventCategory::ChannelAction,
        ] {
            let sink = self.sink.clone();
            bus.on(category, move |_, event| sink(&event_line(event)));
        }
        let sink = self.sink.clone();
        bus.on(EventCategory::Error, move |_, event| sink(&error_line(event)));

        let Some(announce) = config.get("announce").filter(|v| !v.is_null()) else {
            return;
        };
        let announce: Announce = match serde_json::from_value(announce.clone()) {
            Ok(announce) => announce,
            Err(e) => {
                warn!(error = %e, "ignoring malformed logger announce config");
                return;
            }
        };
        let out = bus.outbound().clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(announce.delay_secs)).await;
            if let Err(e) = out.notice(&announce.target, &announce.text) {
                warn!(target = %announce.target, error = %e, "announce failed");
            }
        });
    }
}
