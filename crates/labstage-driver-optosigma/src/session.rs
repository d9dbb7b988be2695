//! The link shared by a stage and its axes.
//!
//! A motion command is several lines long (command, status polls, final
//! reply), so holding the transport's port lock for one line is not enough.
//! Every public stage or axis operation takes [`Session::exclusive`] first
//! and keeps it until its last line is read.

use crate::axis::PollSettings;
use crate::error::StageResult;
use crate::observer::StageObserver;
use crate::protocol::Command;
use crate::reply::Reply;
use labstage_core::CommandTransport;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

pub(crate) struct Session {
    transport: Arc<dyn CommandTransport>,
    pub(crate) observer: Arc<dyn StageObserver>,
    pub(crate) poll: PollSettings,
    op_lock: Mutex<()>,
}

impl Session {
    pub(crate) fn new(
        transport: Arc<dyn CommandTransport>,
        observer: Arc<dyn StageObserver>,
        poll: PollSettings,
    ) -> Self {
        Self {
            transport,
            observer,
            poll,
            op_lock: Mutex::new(()),
        }
    }

    /// Claim the controller for one whole operation.
    ///
    /// Not reentrant: helpers called while the guard is held must not take
    /// it again.
    pub(crate) async fn exclusive(&self) -> MutexGuard<'_, ()> {
        self.op_lock.lock().await
    }

    pub(crate) async fn send(&self, command: &Command) -> StageResult<()> {
        let line = command.to_string();
        tracing::debug!(command = %line, "send");
        self.transport.send(&line).await?;
        Ok(())
    }

    pub(crate) async fn query(&self, command: &Command) -> StageResult<String> {
        let line = command.to_string();
        let raw = self.transport.query(&line).await?;
        tracing::trace!(command = %line, reply = %raw, "query");
        Ok(raw)
    }

    /// Read one line; `NG` goes to the observer but is still returned.
    pub(crate) async fn read_reply(&self) -> StageResult<Reply> {
        let reply = Reply::from_line(self.transport.read_line().await?);
        if reply.is_not_good() {
            self.observer.not_good(reply.as_str());
        }
        Ok(reply)
    }
}
