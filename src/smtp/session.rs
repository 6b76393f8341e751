//! Transaction driver: one accepted connection from greeting to QUIT

use crate::smtp::engine::{Reply, SmtpRequest, SmtpResponse, SmtpState};
use crate::smtp::error::SmtpError;
use crate::smtp::message::SmtpMessage;
use std::io::{BufRead, Write};
use tracing::debug;

/// Drive a full SMTP exchange over the given line streams and return the
/// messages delivered during it.
///
/// Emits the initial 220 greeting, then reads lines until the state
/// machine returns to its connect state (QUIT) or the input ends. Each
/// line runs through classification and the transition table; responses
/// with a wire form are written back, silent ones only feed the message
/// assembler. A message is finished every time the engine reports the
/// end-of-data transition, so one connection may produce several.
///
/// Protocol misuse never fails the transaction (the client just gets a
/// 4xx/5xx reply); I/O errors and assembler invariant violations do, and
/// the caller is expected to drop any partial capture.
pub fn handle_transaction<R, W>(
    input: &mut R,
    out: &mut W,
    host: &str,
) -> Result<Vec<SmtpMessage>, SmtpError>
where
    R: BufRead,
    W: Write,
{
    let greeting = SmtpRequest::initial().execute(host);
    send_reply(out, &greeting)?;
    let mut state = greeting.next_state;

    let mut messages = Vec::new();
    let mut message = SmtpMessage::new();

    while state != SmtpState::Connect {
        let Some(line) = read_line(input)? else {
            break;
        };
        debug!(%line, "client");

        let request = SmtpRequest::from_line(&line, state);
        let response = request.execute(host);
        state = response.next_state;
        send_reply(out, &response)?;
        message.store(&response, request.params())?;

        if state == SmtpState::Quit {
            messages.push(std::mem::take(&mut message));
        }
    }

    Ok(messages)
}

/// Read one ISO-8859-1 line, without its terminator. `None` on EOF.
fn read_line<R: BufRead>(input: &mut R) -> std::io::Result<Option<String>> {
    let mut buf = Vec::new();
    if input.read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    // ISO-8859-1: every octet maps to the scalar of the same value
    Ok(Some(buf.into_iter().map(char::from).collect()))
}

fn send_reply<W: Write>(out: &mut W, response: &SmtpResponse) -> std::io::Result<()> {
    if let Reply::Transmit { code, text } = &response.reply {
        debug!(code, %text, "server");
        write!(out, "{code} {text}\r\n")?;
        out.flush()?;
    }
    Ok(())
}
