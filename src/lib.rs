//! # mailsink
//!
//! mailsink is a dummy SMTP sink server for integration tests.
//!
//! It accepts SMTP connections, walks each transaction through a full
//! command/response state machine, captures every delivered message
//! (headers and body) and keeps it in an in-process queue for the test
//! to inspect. Nothing is ever relayed or persisted.
//!
//! ## Quick Start
//!
//! ```rust
//! use mailsink::{SmtpServer, AUTO_PORT};
//! use std::io::{BufRead, BufReader, Write};
//! use std::net::TcpStream;
//! use std::time::{Duration, Instant};
//!
//! // Start the sink on a free port
//! let mut server = SmtpServer::start(AUTO_PORT).unwrap();
//!
//! // Application under test delivers a message
//! let mut stream = TcpStream::connect(("127.0.0.1", server.port())).unwrap();
//! let mut replies = BufReader::new(stream.try_clone().unwrap());
//! let mut reply = String::new();
//! for command in [
//!     "", // greeting
//!     "HELO test.local",
//!     "MAIL FROM:<sender@example.com>",
//!     "RCPT TO:<receiver@example.com>",
//!     "DATA",
//! ] {
//!     if !command.is_empty() {
//!         write!(stream, "{command}\r\n").unwrap();
//!     }
//!     reply.clear();
//!     replies.read_line(&mut reply).unwrap();
//! }
//! write!(stream, "Subject: Hello\r\n\r\nHi there\r\n.\r\nQUIT\r\n").unwrap();
//! reply.clear();
//! replies.read_line(&mut reply).unwrap(); // 250 OK
//!
//! // Check what arrived
//! let deadline = Instant::now() + Duration::from_secs(5);
//! while server.snapshot().is_empty() && Instant::now() < deadline {
//!     std::thread::sleep(Duration::from_millis(10));
//! }
//! let received = server.snapshot();
//! assert_eq!(received.len(), 1);
//! assert_eq!(received[0].header_value("Subject"), Some("Hello"));
//! assert_eq!(received[0].body(), "Hi there\n");
//!
//! server.stop();
//! ```
//!
//! ## Supported SMTP commands
//!
//! - `HELO` / `EHLO` - Identify the sender
//! - `MAIL FROM` - Start a message envelope
//! - `RCPT TO` - Add a destination
//! - `DATA` - Send headers and body, terminated by a lone `.`
//! - `QUIT` - Close the session
//! - `RSET`, `NOOP`, `VRFY`, `EXPN`, `HELP` - Acknowledged at any time
//!
//! ## Notes
//!
//! - Runs in-memory only; messages are never forwarded or persisted.
//! - Addresses are not validated and no size limits are enforced.
//! - SSL/TLS and real authentication are not supported.
//! - A client may deliver several messages on one connection by issuing
//!   a new `MAIL FROM` after the end-of-data acknowledgement.

mod smtp;

pub use smtp::{
    Action, Mailbox, Reply, SmtpError, SmtpMessage, SmtpRequest, SmtpResponse, SmtpServer,
    SmtpState, StatelessAction, AUTO_PORT, DEFAULT_PORT,
};
