//! Protocol state machine: requests, responses and the transition table
//!
//! The engine is a pure function of (action, state). Every pair yields a
//! response; unlisted combinations fall back to `503 Bad sequence of
//! commands` without a state change.
//!
//! ```text
//! -----------+-------------------------------------------------------------------------------------
//! |                                  State
//! | Action   +-------------+-----------+-----------+--------------+--------------+-------------+------------
//! |          | CONNECT     | GREET     | MAIL      | RCPT         | DATA_HDR     | DATA_BODY   | QUIT
//! -----------+-------------+-----------+-----------+--------------+--------------+-------------+------------
//! connect    | 220/GREET   | 503/=     | 503/=     | 503/=        | 503/=        | 503/=       | 503/=
//! helo/ehlo  | 503/=       | 250/MAIL  | 503/=     | 503/=        | 503/=        | 503/=       | 503/=
//! mail       | 503/=       | 503/=     | 250/RCPT  | 503/=        | 503/=        | 503/=       | 250/RCPT
//! rcpt       | 503/=       | 503/=     | 503/=     | 250/=        | 503/=        | 503/=       | 503/=
//! data       | 503/=       | 503/=     | 503/=     | 354/DATA_HDR | 503/=        | 503/=       | 503/=
//! data_end   | 503/=       | 503/=     | 503/=     | 503/=        | 250/QUIT     | 250/QUIT    | 503/=
//! unrecog    | 500/=       | 500/=     | 500/=     | 500/=        | silent/=     | silent/=    | 500/=
//! blank_line | 503/=       | 503/=     | 503/=     | 503/=        | silent/BODY  | silent/=    | 503/=
//! quit       | 503/=       | 503/=     | 503/=     | 503/=        | 503/=        | 503/=       | 221/CONNECT
//! rset       | 250/GREET   | 250/GREET | 250/GREET | 250/GREET    | 250/GREET    | 250/GREET   | 250/GREET
//! vrfy/expn  | 252/=       | 252/=     | 252/=     | 252/=        | 252/=        | 252/=       | 252/=
//! help       | 211/=       | 211/=     | 211/=     | 211/=        | 211/=        | 211/=       | 211/=
//! noop       | 250/=       | 250/=     | 250/=     | 250/=        | 250/=        | 250/=       | 250/=
//! ```
//!
//! MAIL is deliberately accepted in the QUIT state so a client can pipe
//! several messages through one connection without an intervening RSET.

use crate::smtp::action::{Action, StatelessAction};

/// Position in the SMTP protocol state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpState {
    /// Waiting for a client connection; also the terminal state after QUIT.
    Connect,
    /// Connection greeted, waiting for HELO/EHLO.
    Greet,
    /// Waiting for MAIL FROM.
    Mail,
    /// Waiting for RCPT TO (or more of them, or DATA).
    Rcpt,
    /// Collecting message headers.
    DataHdr,
    /// Collecting message body text.
    DataBody,
    /// Message complete; QUIT or another MAIL may follow.
    Quit,
}

/// A classified client request: the action, its parameters and the state
/// it was received in.
#[derive(Debug, Clone)]
pub struct SmtpRequest {
    action: Action,
    params: Option<String>,
    state: SmtpState,
}

/// What the driver should put on the wire, if anything. Content lines
/// consumed during DATA produce `Silent` responses that still carry a
/// state transition for the assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Transmit { code: u16, text: String },
    Silent,
}

/// Outcome of executing a request against the transition table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpResponse {
    pub reply: Reply,
    pub next_state: SmtpState,
}

impl SmtpResponse {
    fn transmit(code: u16, text: impl Into<String>, next_state: SmtpState) -> Self {
        Self {
            reply: Reply::Transmit {
                code,
                text: text.into(),
            },
            next_state,
        }
    }

    fn silent(next_state: SmtpState) -> Self {
        Self {
            reply: Reply::Silent,
            next_state,
        }
    }

    /// The response code, or `None` for silent responses.
    pub fn code(&self) -> Option<u16> {
        match self.reply {
            Reply::Transmit { code, .. } => Some(code),
            Reply::Silent => None,
        }
    }
}

impl SmtpRequest {
    pub fn new(action: Action, params: Option<String>, state: SmtpState) -> Self {
        Self {
            action,
            params,
            state,
        }
    }

    /// Classify one line of client input received in the given state.
    pub fn from_line(line: &str, state: SmtpState) -> Self {
        let (action, params) = Action::classify(line, state);
        Self::new(action, params, state)
    }

    /// The virtual request executed when a client connects.
    pub fn initial() -> Self {
        Self::new(Action::Connect, None, SmtpState::Connect)
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn params(&self) -> Option<&str> {
        self.params.as_deref()
    }

    /// Run the request through the transition table. `host` is the name
    /// announced in the greeting and closing texts.
    pub fn execute(&self, host: &str) -> SmtpResponse {
        match self.action {
            Action::Stateless(cmd) => Self::execute_stateless(cmd, self.state),
            action => self.execute_stateful(action, host),
        }
    }

    fn execute_stateless(cmd: StatelessAction, state: SmtpState) -> SmtpResponse {
        match cmd {
            StatelessAction::Rset => SmtpResponse::transmit(250, "OK", SmtpState::Greet),
            StatelessAction::Vrfy | StatelessAction::Expn => {
                SmtpResponse::transmit(252, "Not supported", state)
            }
            StatelessAction::Help => SmtpResponse::transmit(211, "No help available", state),
            StatelessAction::Noop => SmtpResponse::transmit(250, "OK", state),
        }
    }

    fn execute_stateful(&self, action: Action, host: &str) -> SmtpResponse {
        use Action as A;
        use SmtpState as S;

        match (action, self.state) {
            (A::Connect, S::Connect) => {
                SmtpResponse::transmit(220, format!("{host} SMTP service ready"), S::Greet)
            }
            (A::Helo | A::Ehlo, S::Greet) => SmtpResponse::transmit(250, "OK", S::Mail),
            // QUIT state tolerates a new MAIL to start the next message
            (A::Mail, S::Mail | S::Quit) => SmtpResponse::transmit(250, "OK", S::Rcpt),
            (A::Rcpt, S::Rcpt) => SmtpResponse::transmit(250, "OK", S::Rcpt),
            (A::Data, S::Rcpt) => SmtpResponse::transmit(
                354,
                "Start mail input; end with <CRLF>.<CRLF>",
                S::DataHdr,
            ),
            (A::DataEnd, S::DataHdr | S::DataBody) => SmtpResponse::transmit(250, "OK", S::Quit),
            (A::Unrecog, S::DataHdr | S::DataBody) => SmtpResponse::silent(self.state),
            (A::BlankLine, S::DataHdr | S::DataBody) => SmtpResponse::silent(S::DataBody),
            (A::Quit, S::Quit) => SmtpResponse::transmit(
                221,
                format!("{host} service closing transmission channel"),
                S::Connect,
            ),
            (A::Unrecog, _) => SmtpResponse::transmit(500, "Command not recognized", self.state),
            _ => SmtpResponse::transmit(
                503,
                format!("Bad sequence of commands: {action}"),
                self.state,
            ),
        }
    }
}
