//! Outward notifications for UI shells

pub use crossbeam_channel::{Receiver, Sender};
use crossbeam_channel::unbounded;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    PlaybackStarted,
    PlaybackStopped,
    ActionCountChanged(usize),
    PresetSaved(String),
    SetupModeChanged(bool),
}

/// Fire-and-forget sender. Never blocks; a dropped receiver is ignored.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    tx: Option<Sender<Notification>>,
}

impl Notifier {
    pub fn new(tx: Sender<Notification>) -> Self {
        Self { tx: Some(tx) }
    }

    /// A notifier that drops everything.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn channel() -> (Self, Receiver<Notification>) {
        let (tx, rx) = unbounded();
        (Self::new(tx), rx)
    }

    pub fn send(&self, notification: Notification) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(notification);
        }
    }
}
