//! Classification of client input into protocol actions

use crate::smtp::engine::SmtpState;
use std::fmt;

/// A classified client input token. Stateless commands are grouped in
/// their own variant so the transition engine can handle them without
/// consulting the state table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Virtual action issued once when a client connects.
    Connect,
    Helo,
    Ehlo,
    /// MAIL FROM:
    Mail,
    /// RCPT TO:
    Rcpt,
    Data,
    /// The bare `.` terminator ending mail input.
    DataEnd,
    Quit,
    /// Anything unrecognized; inside DATA this is how content lines are carried.
    Unrecog,
    /// Empty line; separates headers from body during DATA.
    BlankLine,
    /// Commands whose reply does not depend on the current state.
    Stateless(StatelessAction),
}

/// The stateless subset: allowed at any point of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatelessAction {
    Rset,
    Vrfy,
    Expn,
    Help,
    Noop,
}

impl Action {
    /// Classify one input line given the current protocol state.
    ///
    /// Returns the action plus the parameter remainder of the line, if
    /// any. Verb matching is case-insensitive; parameters keep their
    /// original casing and whitespace. In the DATA states the lexing
    /// switches to content mode: everything except the `.` terminator
    /// (and, in the header phase, the blank separator line) is carried
    /// as `Unrecog` parameters.
    pub fn classify(line: &str, state: SmtpState) -> (Action, Option<String>) {
        match state {
            SmtpState::DataHdr => {
                if line == "." {
                    (Action::DataEnd, None)
                } else if line.is_empty() {
                    (Action::BlankLine, None)
                } else {
                    (Action::Unrecog, Some(line.to_owned()))
                }
            }
            SmtpState::DataBody => {
                if line == "." {
                    (Action::DataEnd, None)
                } else if line.is_empty() {
                    // preserve blank lines in message bodies
                    (Action::Unrecog, Some("\n".to_owned()))
                } else {
                    (Action::Unrecog, Some(line.to_owned()))
                }
            }
            _ => Self::classify_command(line),
        }
    }

    fn classify_command(line: &str) -> (Action, Option<String>) {
        let upper = line.to_ascii_uppercase();
        if upper.starts_with("HELO ") {
            (Action::Helo, Some(line[5..].to_owned()))
        } else if upper.starts_with("EHLO ") {
            (Action::Ehlo, Some(line[5..].to_owned()))
        } else if upper.starts_with("MAIL FROM:") {
            (Action::Mail, Some(line[10..].to_owned()))
        } else if upper.starts_with("RCPT TO:") {
            (Action::Rcpt, Some(line[8..].to_owned()))
        } else if upper.starts_with("DATA") {
            (Action::Data, None)
        } else if upper.starts_with("QUIT") {
            (Action::Quit, None)
        } else if upper.starts_with("RSET") {
            (Action::Stateless(StatelessAction::Rset), None)
        } else if upper.starts_with("NOOP") {
            (Action::Stateless(StatelessAction::Noop), None)
        } else if upper.starts_with("EXPN") {
            (Action::Stateless(StatelessAction::Expn), None)
        } else if upper.starts_with("VRFY") {
            (Action::Stateless(StatelessAction::Vrfy), None)
        } else if upper.starts_with("HELP") {
            (Action::Stateless(StatelessAction::Help), None)
        } else {
            (Action::Unrecog, None)
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Connect => "CONNECT",
            Action::Helo => "HELO",
            Action::Ehlo => "EHLO",
            Action::Mail => "MAIL",
            Action::Rcpt => "RCPT",
            Action::Data => "DATA",
            Action::DataEnd => "DATA_END",
            Action::Quit => "QUIT",
            Action::Unrecog => "UNRECOG",
            Action::BlankLine => "BLANK_LINE",
            Action::Stateless(cmd) => match cmd {
                StatelessAction::Rset => "RSET",
                StatelessAction::Vrfy => "VRFY",
                StatelessAction::Expn => "EXPN",
                StatelessAction::Help => "HELP",
                StatelessAction::Noop => "NOOP",
            },
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_verbs() {
        let (action, params) = Action::classify("HELO client.local", SmtpState::Greet);
        assert_eq!(action, Action::Helo);
        assert_eq!(params.as_deref(), Some("client.local"));

        let (action, params) = Action::classify("MAIL FROM:<a@x>", SmtpState::Mail);
        assert_eq!(action, Action::Mail);
        assert_eq!(params.as_deref(), Some("<a@x>"));

        let (action, params) = Action::classify("RCPT TO:<b@y>", SmtpState::Rcpt);
        assert_eq!(action, Action::Rcpt);
        assert_eq!(params.as_deref(), Some("<b@y>"));

        assert_eq!(Action::classify("DATA", SmtpState::Rcpt).0, Action::Data);
        assert_eq!(Action::classify("QUIT", SmtpState::Quit).0, Action::Quit);
    }

    #[test]
    fn test_verbs_are_case_insensitive() {
        assert_eq!(Action::classify("helo x", SmtpState::Greet).0, Action::Helo);
        assert_eq!(
            Action::classify("mail from:<a@x>", SmtpState::Mail).0,
            Action::Mail
        );
        assert_eq!(
            Action::classify("rset", SmtpState::Mail).0,
            Action::Stateless(StatelessAction::Rset)
        );
    }

    #[test]
    fn test_params_keep_original_casing() {
        let (_, params) = Action::classify("MAIL FROM:<Alice@Example.COM>", SmtpState::Mail);
        assert_eq!(params.as_deref(), Some("<Alice@Example.COM>"));
    }

    #[test]
    fn test_leading_whitespace_is_not_a_verb() {
        let (action, params) = Action::classify("  HELO x", SmtpState::Greet);
        assert_eq!(action, Action::Unrecog);
        assert_eq!(params, None);
    }

    #[test]
    fn test_stateless_commands() {
        for (line, expected) in [
            ("RSET", StatelessAction::Rset),
            ("NOOP", StatelessAction::Noop),
            ("EXPN", StatelessAction::Expn),
            ("VRFY whoever", StatelessAction::Vrfy),
            ("HELP", StatelessAction::Help),
        ] {
            assert_eq!(
                Action::classify(line, SmtpState::Greet).0,
                Action::Stateless(expected)
            );
        }
    }

    #[test]
    fn test_data_hdr_classification() {
        assert_eq!(
            Action::classify(".", SmtpState::DataHdr),
            (Action::DataEnd, None)
        );
        assert_eq!(
            Action::classify("", SmtpState::DataHdr),
            (Action::BlankLine, None)
        );
        let (action, params) = Action::classify("Subject: Hi", SmtpState::DataHdr);
        assert_eq!(action, Action::Unrecog);
        assert_eq!(params.as_deref(), Some("Subject: Hi"));
    }

    #[test]
    fn test_data_body_classification() {
        assert_eq!(
            Action::classify(".", SmtpState::DataBody),
            (Action::DataEnd, None)
        );
        // blank body lines are substituted so they survive capture
        let (action, params) = Action::classify("", SmtpState::DataBody);
        assert_eq!(action, Action::Unrecog);
        assert_eq!(params.as_deref(), Some("\n"));

        let (action, params) = Action::classify("..not terminator", SmtpState::DataBody);
        assert_eq!(action, Action::Unrecog);
        assert_eq!(params.as_deref(), Some("..not terminator"));
    }

    #[test]
    fn test_commands_are_not_verbs_in_data_mode() {
        let (action, params) = Action::classify("QUIT", SmtpState::DataBody);
        assert_eq!(action, Action::Unrecog);
        assert_eq!(params.as_deref(), Some("QUIT"));
    }

    #[test]
    fn test_unknown_verb() {
        assert_eq!(
            Action::classify("FOOBAR", SmtpState::Greet),
            (Action::Unrecog, None)
        );
    }
}
