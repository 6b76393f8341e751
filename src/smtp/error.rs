//! Error types for the SMTP sink

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SmtpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A header continuation line arrived before any header was stored.
    /// Invariant violation; the transaction is aborted without capture.
    #[error("header continuation before any header")]
    StrayContinuation,
}
