//! The relay's control-command vocabulary.
//!
//! Every inbound line is classified by exact, case-sensitive comparison
//! against the two control literals.  There is no escaping: a client that
//! wants to *say* "exit" to the room cannot – that line always means
//! "disconnect me".  Everything that is not a control line, including the
//! empty line, is an ordinary message and is relayed verbatim.

// ── Protocol literals ─────────────────────────────────────────────────────────

/// Greeting sent to every client immediately after its connection is
/// accepted, before any relayed traffic.
pub const WELCOME_LINE: &str = "Welcome!";

/// Control line that disconnects only the issuing connection.
pub const EXIT_COMMAND: &str = "exit";

/// Control line that disconnects the issuing connection and shuts the whole
/// server down.
pub const DOWN_COMMAND: &str = "down";

// ── Command classification ────────────────────────────────────────────────────

/// Interpretation of one inbound line.
///
/// Borrowed from the line it was parsed from; `Broadcast` carries the
/// original text untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// Disconnect the issuing connection.  Never relayed, never replied to.
    Exit,
    /// Disconnect every connection and stop the server.  Never relayed.
    Down,
    /// Any other line, relayed verbatim to every connected client.
    Broadcast(&'a str),
}

impl<'a> Command<'a> {
    /// Classifies one inbound line.
    ///
    /// Matching is exact and case-sensitive: `"Exit"`, `"exit "` and
    /// `" down"` are all ordinary broadcast lines.
    pub fn parse(line: &'a str) -> Self {
        match line {
            EXIT_COMMAND => Command::Exit,
            DOWN_COMMAND => Command::Down,
            other => Command::Broadcast(other),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exit_literal() {
        assert_eq!(Command::parse("exit"), Command::Exit);
    }

    #[test]
    fn test_parse_down_literal() {
        assert_eq!(Command::parse("down"), Command::Down);
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert_eq!(Command::parse("Exit"), Command::Broadcast("Exit"));
        assert_eq!(Command::parse("DOWN"), Command::Broadcast("DOWN"));
    }

    #[test]
    fn test_parse_does_not_trim_whitespace() {
        // Lines with surrounding whitespace are not commands – they relay
        // exactly as typed.
        assert_eq!(Command::parse("exit "), Command::Broadcast("exit "));
        assert_eq!(Command::parse(" down"), Command::Broadcast(" down"));
    }

    #[test]
    fn test_parse_empty_line_is_a_broadcast() {
        assert_eq!(Command::parse(""), Command::Broadcast(""));
    }

    #[test]
    fn test_parse_ordinary_line_carries_original_text() {
        let cmd = Command::parse("hello, room");
        assert_eq!(cmd, Command::Broadcast("hello, room"));
    }

    #[test]
    fn test_parse_line_containing_command_word_is_a_broadcast() {
        assert_eq!(
            Command::parse("time to exit now"),
            Command::Broadcast("time to exit now")
        );
    }
}
