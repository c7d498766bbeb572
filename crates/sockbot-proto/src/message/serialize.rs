use std::fmt::{self, Display, Formatter};

use super::Message;

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(ref tags) = self.tags {
            write!(f, "@{} ", tags)?;
        }

        if let Some(ref prefix) = self.prefix {
            write!(f, ":{} ", prefix)?;
        }

        write!(f, "{}", self.command)?;

        let last = self.params.len().saturating_sub(1);
        for (i, param) in self.params.iter().enumerate() {
            let needs_colon = i == last
                && (self.params.len() > 1
                    || param.is_empty()
                    || param.contains(' ')
                    || param.starts_with(':'));
            if needs_colon {
                write!(f, " :{}", param)?;
            } else {
                write!(f, " {}", param)?;
            }
        }

        write!(f, "\r\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_param_no_colon() {
        assert_eq!(Message::join("#lobby").to_string(), "JOIN #lobby\r\n");
        assert_eq!(Message::pong("abc").to_string(), "PONG abc\r\n");
    }

    #[test]
    fn test_single_param_with_space() {
        assert_eq!(Message::quit("gone away").to_string(), "QUIT :gone away\r\n");
    }

    #[test]
    fn test_trailing_param() {
        assert_eq!(
            Message::user("sockbot", "sockbot").to_string(),
            "USER sockbot 0 * :sockbot\r\n"
        );
        assert_eq!(
            Message::part("#a", Some("bye")).to_string(),
            "PART #a :bye\r\n"
        );
    }

    #[test]
    fn test_prefix_and_tags() {
        let msg: Message = "@a=b :bob!b@h PRIVMSG #a :hi there".parse().unwrap();
        assert_eq!(msg.to_string(), "@a=b :bob!b@h PRIVMSG #a :hi there\r\n");
    }
}
