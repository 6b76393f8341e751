//! Captured message: ordered headers plus body text

use crate::smtp::engine::{SmtpResponse, SmtpState};
use crate::smtp::error::SmtpError;
use std::fmt;

/// One header with all values seen for its name, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Header {
    name: String,
    values: Vec<String>,
}

/// A message captured by the sink: headers and body exactly as they were
/// received during one DATA exchange. Header names keep their first-seen
/// order and original casing; repeated names accumulate values. The body
/// is the raw content lines joined with `\n`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmtpMessage {
    headers: Vec<Header>,
    body: String,
}

impl SmtpMessage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one (response, params) pair produced by the transition
    /// engine into the message under assembly.
    ///
    /// Header lines are only consumed while the response leaves the
    /// session in the header phase, body lines only in the body phase;
    /// everything else is ignored. A continuation line (leading
    /// whitespace) extends the most recent header value; one arriving
    /// before any header is an invariant violation and aborts the
    /// transaction. Header lines without a `:` are dropped.
    pub fn store(&mut self, response: &SmtpResponse, params: Option<&str>) -> Result<(), SmtpError> {
        let Some(params) = params else {
            return Ok(());
        };

        match response.next_state {
            SmtpState::DataHdr => {
                if params.chars().next().is_some_and(char::is_whitespace) {
                    self.append_to_last_header(params)?;
                } else if let Some((name, value)) = params.split_once(':') {
                    self.add_header(name.trim(), value.trim());
                }
                Ok(())
            }
            SmtpState::DataBody => {
                self.body.push_str(params);
                self.body.push('\n');
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn add_header(&mut self, name: &str, value: &str) {
        match self.headers.iter_mut().find(|header| header.name == name) {
            Some(header) => header.values.push(value.to_owned()),
            None => self.headers.push(Header {
                name: name.to_owned(),
                values: vec![value.to_owned()],
            }),
        }
    }

    fn append_to_last_header(&mut self, value: &str) -> Result<(), SmtpError> {
        let header = self.headers.last_mut().ok_or(SmtpError::StrayContinuation)?;
        // values is never empty once the header exists
        if let Some(last) = header.values.last_mut() {
            last.push(' ');
            last.push_str(value.trim());
        }
        Ok(())
    }

    /// Header names in first-seen order.
    pub fn header_names(&self) -> impl Iterator<Item = &str> {
        self.headers.iter().map(|header| header.name.as_str())
    }

    /// All values recorded for a header name; empty if the header is absent.
    pub fn header_values(&self, name: &str) -> &[String] {
        self.headers
            .iter()
            .find(|header| header.name == name)
            .map(|header| header.values.as_slice())
            .unwrap_or(&[])
    }

    /// First value recorded for a header name.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.header_values(name).first().map(String::as_str)
    }

    /// The accumulated body text.
    pub fn body(&self) -> &str {
        &self.body
    }
}

impl fmt::Display for SmtpMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for header in &self.headers {
            for value in &header.values {
                writeln!(f, "{}: {}", header.name, value)?;
            }
        }
        writeln!(f)?;
        writeln!(f, "{}", self.body)
    }
}
