//! Mock connection.
//!
//! Records every outbound call as a line such as `say #lobby hello`.

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use sockbot::connection::Connection;
use sockbot::error::ConnectionError;
use std::sync::Arc;

pub struct MockConnection {
    nick: String,
    sent: Mutex<Vec<String>>,
}

impl MockConnection {
    pub fn new(nick: &str) -> Arc<Self> {
        Arc::new(Self {
            nick: nick.to_string(),
            sent: Mutex::new(Vec::new()),
        })
    }

    /// Everything sent so far.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    fn record(&self, line: String) -> Result<(), ConnectionError> {
        self.sent.lock().push(line);
        Ok(())
    }
}

impl Connection for MockConnection {
    fn nick(&self) -> String {
        self.nick.clone()
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
        let result = self.record(format!("join {channel}"));
        Box::pin(async move { result })
    }

    fn part(&self, channel: &str, _reason: Option<&str>) -> Result<(), ConnectionError> {
        self.record(format!("part {channel}"))
    }
}
