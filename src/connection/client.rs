//! Tokio IRC client.
//!
//! One task writes queued lines to the socket; another reads lines, keeps
//! the connection alive (PING, autojoin, nick tracking, join confirmation)
//! and translates each message into [`RawEvent`]s for the bot loop.

use super::{Connection, RawEvent};
use crate::config::Config;
use crate::error::ConnectionError;
use futures_util::future::BoxFuture;
use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use sockbot_proto::{Ctcp, LineCodec, Message};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_util::codec::Framed;
use tracing::{Instrument, debug, info, warn};

/// Longest line accepted from the server: 512 bytes plus the IRCv3 tag
/// allowance.
pub const MAX_LINE_LEN: usize = 512 + 8191;

/// Numerics that mean a JOIN was refused. The channel is the second param.
const JOIN_FAILURES: [u16; 7] = [403, 405, 471, 473, 474, 475, 477];

/// Receives translated protocol events.
pub type EventReceiver = mpsc::UnboundedReceiver<RawEvent>;

type JoinResult = Result<(), ConnectionError>;

/// Connection parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    pub server: String,
    pub port: u16,
    pub nick: String,
    pub user_name: String,
    pub real_name: String,
    pub password: Option<String>,
    /// Joined after the server welcomes us.
    pub channels: Vec<String>,
}

impl From<&Config> for ClientOptions {
    fn from(config: &Config) -> Self {
        let (server, port) = config.address();
        Self {
            server,
            port,
            nick: config.nick.clone(),
            user_name: config.user_name().to_string(),
            real_name: config.real_name().to_string(),
            password: config.password.clone(),
            channels: config.channels.clone(),
        }
    }
}

impl ClientOptions {
    pub fn address(&self) -> String {
        format!("{}:{}", self.server, self.port)
    }
}

/// State shared by the handle and the reader task.
struct Shared {
    nick: RwLock<String>,
    /// Outstanding joins, keyed by lowercased channel name.
    pending_joins: Mutex<HashMap<String, Vec<oneshot::Sender<JoinResult>>>>,
}

impl Shared {
    /// Resolve every waiter on `channel`, building one result per waiter.
    fn settle_join(&self, channel: &str, result: impl Fn() -> JoinResult) {
        let waiters = self.pending_joins.lock().remove(&channel.to_lowercase());
        for waiter in waiters.into_iter().flatten() {
            let _ = waiter.send(result());
        }
    }

    fn fail_all_joins(&self) {
        let pending = std::mem::take(&mut *self.pending_joins.lock());
        for waiter in pending.into_values().flatten() {
            let _ = waiter.send(Err(ConnectionError::Closed));
        }
    }
}

/// Handle to a live connection. Cheap to clone.
#[derive(Clone)]
pub struct IrcClient {
    outgoing: mpsc::UnboundedSender<Message>,
    shared: Arc<Shared>,
}

impl IrcClient {
    /// Connect and register. Events start flowing on the returned receiver;
    /// it closes when the connection does.
    pub async fn connect(
        options: ClientOptions,
    ) -> Result<(Self, EventReceiver), ConnectionError> {
        let address = options.address();
        let span = crate::telemetry::spans::connection(&address, &options.nick);
        info!(parent: &span, "connecting");

        let stream = TcpStream::connect(&address)
            .await
            .map_err(|source| ConnectionError::Connect {
                address: address.clone(),
                source,
            })?;
        let framed = Framed::new(stream, LineCodec::with_max_len(MAX_LINE_LEN).lenient());
        let (mut sink, mut lines) = framed.split();

        let (outgoing, mut queued) = mpsc::unbounded_channel::<Message>();
        let (events, event_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            nick: RwLock::new(options.nick.clone()),
            pending_joins: Mutex::new(HashMap::new()),
        });

        tokio::spawn(
            async move {
                while let Some(message) = queued.recv().await {
                    debug!(line = %message.to_string().trim_end(), "send");
                    if let Err(e) = sink.send(message.to_string()).await {
                        warn!(error = %e, "write failed, closing");
                        break;
                    }
                }
                let _ = sink.close().await;
            }
            .instrument(span.clone()),
        );

        let reader = Reader {
            shared: shared.clone(),
            outgoing: outgoing.clone(),
            events,
            channels: options.channels.clone(),
        };
        tokio::spawn(
            async move {
                while let Some(line) = lines.next().await {
                    match line {
                        Ok(line) if line.is_empty() => {}
                        Ok(line) => reader.handle_line(&line),
                        Err(e) => {
                            warn!(error = %e, "read failed, closing");
                            break;
                        }
                    }
                }
                info!("disconnected");
                reader.shared.fail_all_joins();
            }
            .instrument(span),
        );

        let client = Self { outgoing, shared };
        client.register(&options)?;
        Ok((client, event_rx))
    }

    fn register(&self, options: &ClientOptions) -> Result<(), ConnectionError> {
        if let Some(password) = &options.password {
            self.send(Message::pass(password))?;
        }
        self.send(Message::nick(&options.nick))?;
        self.send(Message::user(&options.user_name, &options.real_name))
    }

    fn send(&self, message: Message) -> Result<(), ConnectionError> {
        self.outgoing
            .send(message)
            .map_err(|_| ConnectionError::Closed)
    }

    /// Send one message per line of `text`.
    fn send_lines(
        &self,
        text: &str,
        build: impl Fn(&str) -> Message,
    ) -> Result<(), ConnectionError> {
        for line in text.split(['\r', '\n']).filter(|l| !l.is_empty()) {
            self.send(build(line))?;
        }
        Ok(())
    }

    /// Say goodbye. The connection closes once the server acknowledges.
    pub fn quit(&self, reason: &str) -> Result<(), ConnectionError> {
        self.send(Message::quit(reason))
    }
}

impl Connection for IrcClient {
    fn nick(&self) -> String {
        self.shared.nick.read().clone()
    }

    fn say(&self, target: &str, text: &str) -> Result<(), ConnectionError> {
        self.send_lines(text, |line| Message::privmsg(target, line))
    }

    fn notice(&self, target: &str, text: &str) -> Result<(), ConnectionError> {
        self.send_lines(text, |line| Message::notice(target, line))
    }

    fn action(&self, target: &str, text: &str) -> Result<(), ConnectionError> {
        self.send_lines(text, |line| Message::privmsg(target, &Ctcp::action(line)))
    }

    fn join(&self, channel: &str) -> BoxFuture<'static, Result<(), ConnectionError>> {
        let (tx, rx) = oneshot::channel();
        self.shared
            .pending_joins
            .lock()
            .entry(channel.to_lowercase())
            .or_default()
            .push(tx);
        if let Err(e) = self.send(Message::join(channel)) {
            self.shared.pending_joins.lock().remove(&channel.to_lowercase());
            return Box::pin(async move { Err(e) });
        }
        Box::pin(async move { rx.await.unwrap_or(Err(ConnectionError::Closed)) })
    }

    fn part(&self, channel: &str, reason: Option<&str>) -> Result<(), ConnectionError> {
        self.send(Message::part(channel, reason))
    }
}

/// Inbound half of the connection.
struct Reader {
    shared: Arc<Shared>,
    outgoing: mpsc::UnboundedSender<Message>,
    events: mpsc::UnboundedSender<RawEvent>,
    channels: Vec<String>,
}

impl Reader {
    fn handle_line(&self, line: &str) {
        debug!(line = %line, "recv");
        match line.parse::<Message>() {
            Ok(message) => self.handle(message),
            Err(e) => {
                warn!(error = %e, "unparseable line");
                self.emit(RawEvent::Error(Message::new("ERROR", [line])));
            }
        }
    }

    fn handle(&self, message: Message) {
        let own_nick = self.shared.nick.read().clone();
        for event in translate(&message, &own_nick) {
            self.emit(event);
        }
        self.keep_alive(&message, &own_nick);
    }

    /// Connection housekeeping the bot never has to think about.
    fn keep_alive(&self, message: &Message, own_nick: &str) {
        let from_self = message
            .source_nickname()
            .is_some_and(|nick| nick.eq_ignore_ascii_case(own_nick));

        match message.command.as_str() {
            "PING" => self.reply(Message::pong(message.param(0).unwrap_or_default())),
            "001" => {
                if let Some(nick) = message.param(0) {
                    *self.shared.nick.write() = nick.to_string();
                }
                info!(nick = %self.shared.nick.read(), "registered");
                for channel in &self.channels {
                    self.reply(Message::join(channel));
                }
            }
            "NICK" if from_self => {
                if let Some(nick) = message.param(0) {
                    info!(old = %own_nick, new = %nick, "nickname changed");
                    *self.shared.nick.write() = nick.to_string();
                }
            }
            "JOIN" if from_self => {
                if let Some(channel) = message.param(0) {
                    info!(channel = %channel, "joined");
                    self.shared.settle_join(channel, || Ok(()));
                }
            }
            _ => {
                let refused = message.numeric().is_some_and(|n| JOIN_FAILURES.contains(&n));
                if let (true, Some(channel)) = (refused, message.param(1)) {
                    let reason = message.params.last().cloned().unwrap_or_default();
                    warn!(channel = %channel, reason = %reason, "join refused");
                    self.shared.settle_join(channel, || {
                        Err(ConnectionError::JoinRejected {
                            channel: channel.to_string(),
                            reason: reason.clone(),
                        })
                    });
                }
            }
        }
    }

    fn reply(&self, message: Message) {
        if self.outgoing.send(message).is_err() {
            debug!("writer gone, dropping reply");
        }
    }

    fn emit(&self, event: RawEvent) {
        if self.events.send(event).is_err() {
            debug!("bot loop gone, dropping event");
        }
    }
}

/// Translate one message into the callbacks it represents.
///
/// Every message yields [`RawEvent::Raw`] first. Error replies yield
/// [`RawEvent::Error`] and nothing else.
pub fn translate(message: &Message, own_nick: &str) -> Vec<RawEvent> {
    let mut events = vec![RawEvent::Raw(message.clone())];
    if message.is_error() {
        events.push(RawEvent::Error(message.clone()));
        return events;
    }

    let source = message.source_nickname().map(str::to_string);
    let param = |i: usize| message.param(i).map(str::to_string);
    let message_owned = || message.clone();

    let event = match (message.command.as_str(), source) {
        ("JOIN", Some(nick)) => param(0).map(|channel| RawEvent::Join {
            channel,
            nick,
            message: message_owned(),
        }),
        ("PART", Some(nick)) => param(0).map(|channel| RawEvent::Part {
            channel,
            nick,
            reason: param(1),
            message: message_owned(),
        }),
        ("QUIT", Some(nick)) => Some(RawEvent::Quit {
            nick,
            reason: param(0),
            message: message_owned(),
        }),
        ("KICK", Some(by)) => match (param(0), param(1)) {
            (Some(channel), Some(nick)) => Some(RawEvent::Kick {
                channel,
                nick,
                by,
                reason: param(2),
                message: message_owned(),
            }),
            _ => None,
        },
        ("KILL", _) => param(0).map(|nick| RawEvent::Kill {
            nick,
            reason: param(1),
            message: message_owned(),
        }),
        ("NICK", Some(old)) => param(0).map(|new| RawEvent::Nick {
            old,
            new,
            message: message_owned(),
        }),
        ("NOTICE", nick) => match (param(0), param(1)) {
            (Some(target), Some(text)) => Some(RawEvent::Notice {
                nick,
                target,
                text,
                message: message_owned(),
            }),
            _ => None,
        },
        ("PRIVMSG", Some(actor)) => match (param(0), param(1)) {
            (Some(target), Some(text)) => {
                privmsg(&mut events, actor, target, text, message, own_nick);
                None
            }
            _ => None,
        },
        _ => None,
    };
    events.extend(event);
    events
}

fn privmsg(
    events: &mut Vec<RawEvent>,
    actor: String,
    target: String,
    text: String,
    message: &Message,
    own_nick: &str,
) {
    if let Some(ctcp) = Ctcp::parse(&text) {
        if ctcp.is_action() {
            events.push(RawEvent::Action {
                nick: actor,
                target,
                text: ctcp.params.unwrap_or_default().to_string(),
                message: message.clone(),
            });
        }
        return;
    }

    let private = target.eq_ignore_ascii_case(own_nick);
    events.push(RawEvent::Message {
        actor: actor.clone(),
        target,
        text: text.clone(),
        private,
        message: message.clone(),
    });
    if private {
        events.push(RawEvent::Pm {
            actor,
            text,
            message: message.clone(),
        });
    }
}
