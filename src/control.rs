// State shared between the poller thread and the tray

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

/// Pause flag written by the tray, read once per poll
#[derive(Debug, Clone, Default)]
pub struct PauseSwitch(Arc<AtomicBool>);

impl PauseSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_paused(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn set_paused(&self, paused: bool) {
        self.0.store(paused, Ordering::Release);
    }

    /// Flip the flag, returning the new state
    pub fn toggle(&self) -> bool {
        !self.0.fetch_xor(true, Ordering::AcqRel)
    }
}

/// What the poller tells the tray
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    NowPlaying(String),
    Stopped,
}

pub type StatusSender = Sender<StatusUpdate>;
pub type StatusReceiver = Receiver<StatusUpdate>;

pub fn status_channel() -> (StatusSender, StatusReceiver) {
    mpsc::channel()
}
