//! SMTP sink implementation

pub mod action;
pub mod engine;
pub mod error;
pub mod mailbox;
pub mod message;
pub mod server;
pub mod session;

pub use action::{Action, StatelessAction};
pub use engine::{Reply, SmtpRequest, SmtpResponse, SmtpState};
pub use error::SmtpError;
pub use mailbox::Mailbox;
pub use message::SmtpMessage;
pub use server::{SmtpServer, AUTO_PORT, DEFAULT_PORT};
