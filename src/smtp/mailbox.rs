//! Thread-safe capture queue for received messages

use crate::smtp::message::SmtpMessage;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A cloneable handle to the process-wide FIFO of captured messages.
///
/// Connections act as producers, test code as consumer; both may run
/// concurrently. All messages of one transaction are enqueued under a
/// single critical section, and [`snapshot`](Mailbox::snapshot) takes
/// the same lock, so an observer never sees a partial transaction.
#[derive(Debug, Clone, Default)]
pub struct Mailbox {
    queue: Arc<Mutex<VecDeque<SmtpMessage>>>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<SmtpMessage>> {
        // a panicked producer cannot leave the queue in a bad state,
        // so poisoning is ignored
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append one message.
    pub fn offer(&self, message: SmtpMessage) {
        self.lock().push_back(message);
    }

    /// Append all messages of one transaction as an atomic batch.
    pub fn offer_all(&self, messages: Vec<SmtpMessage>) {
        if messages.is_empty() {
            return;
        }
        self.lock().extend(messages);
    }

    /// Remove and return the oldest message, if any.
    pub fn poll(&self) -> Option<SmtpMessage> {
        self.lock().pop_front()
    }

    /// Remove and return everything currently queued, oldest first.
    pub fn drain(&self) -> Vec<SmtpMessage> {
        self.lock().drain(..).collect()
    }

    /// Non-destructive copy of the queue contents, oldest first.
    pub fn snapshot(&self) -> Vec<SmtpMessage> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Forget all captured messages.
    pub fn clear(&self) {
        self.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smtp::engine::{SmtpRequest, SmtpState};
    use std::thread;

    fn message(subject: &str) -> SmtpMessage {
        let mut message = SmtpMessage::new();
        let request = SmtpRequest::from_line(&format!("Subject: {subject}"), SmtpState::DataHdr);
        let response = request.execute("localhost");
        message.store(&response, request.params()).unwrap();
        message
    }

    #[test]
    fn test_fifo_order() {
        let mailbox = Mailbox::new();
        mailbox.offer(message("one"));
        mailbox.offer(message("two"));

        assert_eq!(mailbox.len(), 2);
        assert_eq!(mailbox.poll().unwrap().header_value("Subject"), Some("one"));
        assert_eq!(mailbox.poll().unwrap().header_value("Subject"), Some("two"));
        assert!(mailbox.poll().is_none());
    }

    #[test]
    fn test_snapshot_is_non_destructive() {
        let mailbox = Mailbox::new();
        mailbox.offer(message("kept"));

        assert_eq!(mailbox.snapshot().len(), 1);
        assert_eq!(mailbox.snapshot().len(), 1);
        assert_eq!(mailbox.len(), 1);
    }

    #[test]
    fn test_batch_preserves_transaction_order() {
        let mailbox = Mailbox::new();
        mailbox.offer_all(vec![message("one"), message("two")]);
        mailbox.offer_all(Vec::new());

        let seen: Vec<_> = mailbox.drain();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].header_value("Subject"), Some("one"));
        assert_eq!(seen[1].header_value("Subject"), Some("two"));
        assert!(mailbox.is_empty());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mailbox = Mailbox::new();
        mailbox.offer(message("gone"));
        mailbox.clear();
        mailbox.clear();
        assert!(mailbox.is_empty());
    }

    #[test]
    fn test_concurrent_producers() {
        let mailbox = Mailbox::new();
        let handles: Vec<_> = (0..8)
            .map(|producer| {
                let mailbox = mailbox.clone();
                thread::spawn(move || {
                    mailbox.offer_all(vec![
                        message(&format!("{producer}-a")),
                        message(&format!("{producer}-b")),
                    ]);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // batches may interleave between transactions, never within one
        let seen = mailbox.drain();
        assert_eq!(seen.len(), 16);
        for pair in seen.chunks(2) {
            let first = pair[0].header_value("Subject").unwrap();
            let second = pair[1].header_value("Subject").unwrap();
            assert_eq!(first.strip_suffix("-a"), second.strip_suffix("-b"));
        }
    }
}
