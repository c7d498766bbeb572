//! CTCP (Client-to-Client Protocol) framing.
//!
//! CTCP requests ride inside PRIVMSG/NOTICE text between `\x01` delimiters.
//! The bot only acts on `ACTION`, but any request parses.
//!
//! ```
//! use sockbot_proto::ctcp::Ctcp;
//!
//! let ctcp = Ctcp::parse("\x01ACTION waves hello\x01").unwrap();
//! assert!(ctcp.is_action());
//! assert_eq!(ctcp.params, Some("waves hello"));
//!
//! assert_eq!(Ctcp::action("dances"), "\x01ACTION dances\x01");
//! ```

/// The CTCP delimiter character (`\x01`).
pub const CTCP_DELIM: char = '\x01';

/// A CTCP request borrowed from message text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ctcp<'a> {
    /// Request name as sent (e.g., `ACTION`, `VERSION`).
    pub command: &'a str,
    /// Everything after the first space, if anything.
    pub params: Option<&'a str>,
}

impl<'a> Ctcp<'a> {
    /// Parse CTCP-framed text. The closing delimiter is optional since some
    /// clients omit it.
    pub fn parse(text: &'a str) -> Option<Self> {
        let inner = text.strip_prefix(CTCP_DELIM)?;
        let inner = inner.strip_suffix(CTCP_DELIM).unwrap_or(inner);
        if inner.is_empty() {
            return None;
        }

        match inner.split_once(' ') {
            Some((command, params)) => Some(Self {
                command,
                params: Some(params),
            }),
            None => Some(Self {
                command: inner,
                params: None,
            }),
        }
    }

    /// Whether this is a `/me` action.
    pub fn is_action(&self) -> bool {
        self.command.eq_ignore_ascii_case("ACTION")
    }

    /// Frame `text` as an ACTION request.
    pub fn action(text: &str) -> String {
        format!("{CTCP_DELIM}ACTION {text}{CTCP_DELIM}")
    }
}
