//! Shared fixtures for SBIS26 driver tests.

#![allow(dead_code)]

use labstage_core::mock::MockTransport;
use labstage_driver_optosigma::{PollSettings, Sbis26, StageObserver, StatusToken};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const BATCH_DEFAULT: &str =
    "D:B,1,200000,200000,100,2,200000,200000,100,3,200000,200000,100";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    NotGood(String),
    SpeedRejected(u8),
    Polled(u8, String),
    ReadyTimeout(u8, Duration),
    Clamped(u8, i64, i64),
}

#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<Event>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn timeouts(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::ReadyTimeout(..)))
            .count()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl StageObserver for RecordingObserver {
    fn not_good(&self, raw: &str) {
        self.push(Event::NotGood(raw.to_string()));
    }

    fn speed_rejected(&self, axis: u8, _speed: i64, _range: i64, _acceleration: i64) {
        self.push(Event::SpeedRejected(axis));
    }

    fn polled(&self, axis: u8, status: &StatusToken) {
        self.push(Event::Polled(axis, status.to_string()));
    }

    fn ready_timeout(&self, axis: u8, elapsed: Duration) {
        self.push(Event::ReadyTimeout(axis, elapsed));
    }

    fn clamped(&self, axis: u8, requested: i64, sent: i64) {
        self.push(Event::Clamped(axis, requested, sent));
    }
}

pub struct Rig {
    pub stage: Sbis26,
    pub mock: Arc<MockTransport>,
    pub observer: Arc<RecordingObserver>,
}

impl Rig {
    /// Lines sent after the stage finished opening.
    pub fn sent(&self) -> Vec<String> {
        self.mock.sent()
    }
}

/// Open a stage on `mock` with default polling and clear the opening batch
/// command from the send log.
pub async fn rig(mock: MockTransport) -> Rig {
    rig_with_poll(mock, PollSettings::default()).await
}

pub async fn rig_with_poll(mock: MockTransport, poll: PollSettings) -> Rig {
    let mock = Arc::new(mock);
    let observer = Arc::new(RecordingObserver::default());
    let stage = Sbis26::open(mock.clone(), observer.clone(), poll)
        .await
        .expect("stage opens on mock transport");
    assert_eq!(mock.sent(), vec![BATCH_DEFAULT.to_string()]);
    mock.clear_sent();
    Rig {
        stage,
        mock,
        observer,
    }
}

/// Responder that reports every axis busy forever.
pub fn always_busy(cmd: &str) -> Option<String> {
    cmd.strip_prefix("SRQ:D,")
        .map(|axis| format!("C,{axis},K,K,K,B"))
}

pub fn ready(axis: u8) -> String {
    format!("C,{axis},K,K,K,R")
}

pub fn busy(axis: u8) -> String {
    format!("C,{axis},K,K,K,B")
}
