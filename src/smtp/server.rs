//! Server lifecycle: bind, accept loop, capture hand-off, shutdown

use crate::smtp::error::SmtpError;
use crate::smtp::mailbox::Mailbox;
use crate::smtp::message::SmtpMessage;
use crate::smtp::session::handle_transaction;
use std::io::BufReader;
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// The standard SMTP port.
pub const DEFAULT_PORT: u16 = 25;

/// Ask the OS for any free port.
pub const AUTO_PORT: u16 = 0;

/// How long [`SmtpServer::stop`] waits for in-flight transactions.
const STOP_TIMEOUT: Duration = Duration::from_secs(20);

/// A running SMTP sink.
///
/// Created already running via [`SmtpServer::start`]; accepts connections in a
/// background worker, drives each on its own thread and appends every
/// completed transaction's messages to the capture queue. Messages are
/// never forwarded anywhere; they stay in memory until read or cleared.
#[derive(Debug)]
pub struct SmtpServer {
    mailbox: Mailbox,
    port: u16,
    stopped: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
    worker_done: mpsc::Receiver<()>,
}

impl SmtpServer {
    /// Bind the port and start accepting. [`AUTO_PORT`] requests an
    /// OS-assigned ephemeral port; see [`port`](SmtpServer::port) for
    /// the actual one. Announces itself as `localhost`.
    pub fn start(port: u16) -> Result<Self, SmtpError> {
        Self::start_with_host(port, "localhost")
    }

    /// Like [`start`](SmtpServer::start) with a custom host name in the
    /// greeting and closing texts.
    pub fn start_with_host(port: u16, host: &str) -> Result<Self, SmtpError> {
        let listener = TcpListener::bind(("0.0.0.0", port))?;
        let port = listener.local_addr()?.port();

        let mailbox = Mailbox::new();
        let stopped = Arc::new(AtomicBool::new(false));
        let (done_tx, worker_done) = mpsc::channel();

        let worker = thread::spawn({
            let mailbox = mailbox.clone();
            let stopped = Arc::clone(&stopped);
            let host = host.to_owned();
            move || {
                serve(&listener, &mailbox, &stopped, &host);
                drop(done_tx);
            }
        });

        info!(port, "SMTP sink listening");
        Ok(Self {
            mailbox,
            port,
            stopped,
            worker: Some(worker),
            worker_done,
        })
    }

    /// The port the server is bound to.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Live handle to the capture queue. Reads through it are
    /// destructive; use [`snapshot`](SmtpServer::snapshot) to observe
    /// without consuming.
    pub fn received(&self) -> Mailbox {
        self.mailbox.clone()
    }

    /// Non-destructive copy of all captured messages, oldest first.
    pub fn snapshot(&self) -> Vec<SmtpMessage> {
        self.mailbox.snapshot()
    }

    /// Forget all captured messages.
    pub fn reset(&self) {
        self.mailbox.clear();
    }

    /// Stop accepting and wait for in-flight transactions to finish,
    /// bounded by a 20 second timeout after which the worker is
    /// abandoned. Idempotent.
    pub fn stop(&mut self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }

        // wake the accept loop so it observes the stop flag
        let _ = TcpStream::connect(("127.0.0.1", self.port));

        match self.worker_done.recv_timeout(STOP_TIMEOUT) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if let Some(worker) = self.worker.take() {
                    let _ = worker.join();
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!("timed out waiting for in-flight transactions; abandoning worker");
                self.worker.take();
            }
        }
        info!(port = self.port, "SMTP sink stopped");
    }
}

impl Drop for SmtpServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Accept loop. Runs until the stop flag is raised or the listener
/// fails; joins the per-connection threads before returning so that
/// transactions still in flight may complete.
fn serve(listener: &TcpListener, mailbox: &Mailbox, stopped: &Arc<AtomicBool>, host: &str) {
    let mut connections = Vec::new();

    loop {
        match listener.accept() {
            Ok((socket, peer)) => {
                if stopped.load(Ordering::SeqCst) {
                    break;
                }
                debug!(%peer, "client connected");
                let mailbox = mailbox.clone();
                let host = host.to_owned();
                connections.push(thread::spawn(move || {
                    handle_client(socket, &mailbox, &host);
                }));
                connections.retain(|connection| !connection.is_finished());
            }
            Err(err) => {
                if !stopped.load(Ordering::SeqCst) {
                    error!(%err, "accept failed, shutting down");
                    stopped.store(true, Ordering::SeqCst);
                }
                break;
            }
        }
    }

    for connection in connections {
        let _ = connection.join();
    }
}

/// Handle one client. The socket is released on every exit path; on
/// error the partial capture is discarded.
fn handle_client(socket: TcpStream, mailbox: &Mailbox, host: &str) {
    let peer = socket.peer_addr().ok();

    let reader = match socket.try_clone() {
        Ok(clone) => clone,
        Err(err) => {
            warn!(?peer, %err, "could not clone client socket");
            return;
        }
    };
    let mut input = BufReader::new(reader);
    let mut out = socket;

    match handle_transaction(&mut input, &mut out, host) {
        Ok(messages) => {
            debug!(?peer, count = messages.len(), "transaction complete");
            mailbox.offer_all(messages);
        }
        Err(err) => warn!(?peer, %err, "transaction aborted"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_port_is_assigned() {
        let server = SmtpServer::start(AUTO_PORT).unwrap();
        assert_ne!(server.port(), 0);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut server = SmtpServer::start(AUTO_PORT).unwrap();
        server.stop();
        server.stop();
    }

    #[test]
    fn test_reset_is_idempotent() {
        let server = SmtpServer::start(AUTO_PORT).unwrap();
        server.reset();
        server.reset();
        assert!(server.snapshot().is_empty());
    }

    #[test]
    fn test_stop_waits_for_worker() {
        let mut server = SmtpServer::start(AUTO_PORT).unwrap();
        server.stop();
        assert!(server.worker.is_none());
    }
}
