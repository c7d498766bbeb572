//! Test doubles shared by unit tests.

use crate::bus::EventBus;
use crate::connection::Connection;
use crate::error::ConnectionError;
use crate::outbound::{EchoReceiver, Outbound};
use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use std::sync::Arc;

/// Records every outbound call as a line like `say #lobby hello`.
pub struct RecordingConnection {
    nick: Mutex<String>,
    sent: Mutex<Vec<String>>,
    fail_sends: bool,
    reject_joins: bool,
}

impl RecordingConnection {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::with_flags(false, false))
    }

    /// Every send returns [`ConnectionError::Closed`].
    pub fn failing() -> Arc<Self> {
        Arc::new(Self::with_flags(true, false))
    }

    /// Joins are sent but the server refuses them.
    pub fn rejecting_joins() -> Arc<Self> {
        Arc::new(Self::with_flags(false, true))
    }

    fn with_flags(fail_sends: bool, reject_joins: bool) -> Self {
        Self {
            nick: Mutex::new("sockbot".into()),
            sent: Mutex::new(Vec::new()),
            fail_sends,
            reject_joins,
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    fn record(&self, line: String) -> Result<(), ConnectionError> {
        if self.fail_sends {
            return Err(ConnectionError::Closed);
        }
        self.sent.lock().push(line);
        Ok(())
    }
}

impl Connection for RecordingConnection {
    fn nick(&self) -> String {
        self.nick.lock().clone()
    }

    fn say(&self, target: &str, text: &str) -> Result<(), ConnectionError> {
        self.record(format!("say {target} {text}"))
    }

    fn notice(&self, target: &str, text: &str) -> Result<(), ConnectionError> {
        self.record(format!("notice {target} {text}"))
    }

    fn action(&self, target: &str, text: &str) -> Result<(), ConnectionError> {
        self.record(format!("action {target} {text}"))
    }

    fn join(&self, channel: &str) -> BoxFuture<'static, Result<(), ConnectionError>> {
        let result = self.record(format!("join {channel}")).and_then(|()| {
            if self.reject_joins {
                Err(ConnectionError::JoinRejected {
                    channel: channel.to_string(),
                    reason: "Cannot join channel (+i)".into(),
                })
            } else {
                Ok(())
            }
        });
        Box::pin(async move { result })
    }

    fn part(&self, channel: &str, reason: Option<&str>) -> Result<(), ConnectionError> {
        match reason {
            Some(reason) => self.record(format!("part {channel} {reason}")),
            None => self.record(format!("part {channel}")),
        }
    }
}

/// A bus over a fresh [`RecordingConnection`].
pub fn recording_bus() -> (EventBus, EchoReceiver, Arc<RecordingConnection>) {
    let conn = RecordingConnection::new();
    let (outbound, echoes) = Outbound::new(conn.clone());
    (EventBus::new(outbound), echoes, conn)
}
