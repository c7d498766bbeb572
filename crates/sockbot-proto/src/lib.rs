//! # sockbot-proto
//!
//! The wire half of sockbot: newline framing for tokio and a small parser
//! for the subset of IRC messages a chat bot needs to understand.
//!
//! ```rust
//! use sockbot_proto::Message;
//!
//! let msg: Message = ":bob!b@host PRIVMSG #lobby :hello there".parse().unwrap();
//! assert_eq!(msg.source_nickname(), Some("bob"));
//! assert_eq!(msg.command, "PRIVMSG");
//! assert_eq!(msg.params, vec!["#lobby", "hello there"]);
//!
//! let reply = Message::privmsg("#lobby", "hi bob");
//! assert_eq!(reply.to_string(), "PRIVMSG #lobby :hi bob\r\n");
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod ctcp;
pub mod error;
pub mod line;
pub mod message;

pub use self::ctcp::Ctcp;
pub use self::error::ProtocolError;
pub use self::line::LineCodec;
pub use self::message::Message;
