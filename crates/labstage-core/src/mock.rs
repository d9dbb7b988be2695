//! Scripted [`CommandTransport`] for driver tests.
//!
//! `MockTransport` records every line a driver sends and answers reads from
//! a queue of scripted replies. When the queue is empty it falls back to an
//! optional responder closure, called with the most recent command, which is
//! how a test models a device that keeps answering "busy" forever.
//!
//! # Example
//!
//! ```
//! use labstage_core::mock::MockTransport;
//! use labstage_core::CommandTransport;
//!
//! # tokio_test::block_on(async {
//! let mock = MockTransport::new().with_replies(["3"]);
//! assert_eq!(mock.query("CONNECT?").await.unwrap(), "3");
//! assert_eq!(mock.sent(), vec!["CONNECT?".to_string()]);
//! # })
//! ```

use crate::error::{TransportError, TransportResult};
use crate::transport::{CommandTransport, DEFAULT_READ_TIMEOUT};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

type Responder = Box<dyn FnMut(&str) -> Option<String> + Send>;

#[derive(Default)]
struct MockState {
    sent: Vec<String>,
    replies: VecDeque<String>,
    responder: Option<Responder>,
    last_command: Option<String>,
    fail_next: bool,
}

/// In-memory transport with scripted replies and a send log.
#[derive(Default)]
pub struct MockTransport {
    state: Mutex<MockState>,
}

impl MockTransport {
    /// Empty mock: every read fails with a timeout until replies are queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue replies, returned in order by `read_line`.
    pub fn with_replies<I, S>(self, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state
            .lock()
            .replies
            .extend(replies.into_iter().map(Into::into));
        self
    }

    /// Answer reads from `responder` once the scripted queue runs dry.
    ///
    /// The closure receives the last command sent; returning `None` makes the
    /// read time out.
    pub fn with_responder<F>(self, responder: F) -> Self
    where
        F: FnMut(&str) -> Option<String> + Send + 'static,
    {
        self.state.lock().responder = Some(Box::new(responder));
        self
    }

    /// Queue one more reply.
    pub fn push_reply(&self, reply: impl Into<String>) {
        self.state.lock().replies.push_back(reply.into());
    }

    /// Every command line sent so far, oldest first.
    pub fn sent(&self) -> Vec<String> {
        self.state.lock().sent.clone()
    }

    /// Forget the send log.
    pub fn clear_sent(&self) {
        self.state.lock().sent.clear();
    }

    /// Number of scripted replies not yet consumed.
    pub fn pending_replies(&self) -> usize {
        self.state.lock().replies.len()
    }

    /// Make the next send or read fail with [`TransportError::Disconnected`].
    pub fn trigger_failure(&self) {
        self.state.lock().fail_next = true;
    }
}

#[async_trait]
impl CommandTransport for MockTransport {
    async fn send(&self, command: &str) -> TransportResult<()> {
        let mut state = self.state.lock();
        if std::mem::take(&mut state.fail_next) {
            return Err(TransportError::Disconnected);
        }
        state.sent.push(command.to_string());
        state.last_command = Some(command.to_string());
        Ok(())
    }

    async fn read_line(&self) -> TransportResult<String> {
        let mut state = self.state.lock();
        if std::mem::take(&mut state.fail_next) {
            return Err(TransportError::Disconnected);
        }
        if let Some(reply) = state.replies.pop_front() {
            return Ok(reply);
        }
        let last = state.last_command.clone().unwrap_or_default();
        state
            .responder
            .as_mut()
            .and_then(|respond| respond(&last))
            .ok_or(TransportError::Timeout(DEFAULT_READ_TIMEOUT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replies_come_back_in_order() {
        let mock = MockTransport::new().with_replies(["first", "second"]);
        assert_eq!(mock.read_line().await.unwrap(), "first");
        assert_eq!(mock.read_line().await.unwrap(), "second");
        assert!(matches!(
            mock.read_line().await,
            Err(TransportError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn responder_sees_last_command() {
        let mock = MockTransport::new().with_responder(|cmd| {
            cmd.strip_prefix("SRQ:D,")
                .map(|axis| format!("C,{axis},K,K,K,B"))
        });
        assert_eq!(mock.query("SRQ:D,2").await.unwrap(), "C,2,K,K,K,B");
        mock.send("LE:A").await.unwrap();
        assert!(mock.read_line().await.is_err());
    }

    #[tokio::test]
    async fn scripted_replies_take_priority_over_responder() {
        let mock = MockTransport::new()
            .with_replies(["OK"])
            .with_responder(|_| Some("fallback".to_string()));
        assert_eq!(mock.query("X").await.unwrap(), "OK");
        assert_eq!(mock.query("X").await.unwrap(), "fallback");
    }

    #[tokio::test]
    async fn trigger_failure_affects_one_call() {
        let mock = MockTransport::new();
        mock.trigger_failure();
        assert!(matches!(
            mock.send("H:D,1").await,
            Err(TransportError::Disconnected)
        ));
        mock.send("H:D,1").await.unwrap();
        assert_eq!(mock.sent(), vec!["H:D,1".to_string()]);
    }
}
