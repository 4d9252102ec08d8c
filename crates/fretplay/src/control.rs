//! Stop predicates and the control channel read at unit boundaries.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::duration::Tempo;

/// Cooperative stop check, polled once before every unit.
pub trait StopCondition: Send + Sync {
    fn should_stop(&self) -> bool;
}

impl<F> StopCondition for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn should_stop(&self) -> bool {
        self()
    }
}

impl StopCondition for CancellationToken {
    fn should_stop(&self) -> bool {
        self.is_cancelled()
    }
}

impl StopCondition for AtomicBool {
    fn should_stop(&self) -> bool {
        self.load(Ordering::Acquire)
    }
}

impl<T: StopCondition + ?Sized> StopCondition for Arc<T> {
    fn should_stop(&self) -> bool {
        (**self).should_stop()
    }
}

/// Never stops.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverStop;

impl StopCondition for NeverStop {
    fn should_stop(&self) -> bool {
        false
    }
}

/// Requests applied at the next unit boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlMessage {
    Stop,
    SetLoop(bool),
    /// Tempo for units not yet started
    Retune(Tempo),
}

/// Cloneable sender side of a playback's control channel.
#[derive(Debug, Clone)]
pub struct PlaybackControl {
    tx: mpsc::UnboundedSender<ControlMessage>,
}

impl PlaybackControl {
    pub fn channel() -> (Self, ControlReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            PlaybackControl { tx },
            ControlReceiver {
                rx: Arc::new(Mutex::new(rx)),
            },
        )
    }

    /// Returns false once the playback has finished and dropped its receiver.
    pub fn send(&self, message: ControlMessage) -> bool {
        self.tx.send(message).is_ok()
    }

    pub fn stop(&self) -> bool {
        self.send(ControlMessage::Stop)
    }

    pub fn set_loop(&self, looping: bool) -> bool {
        self.send(ControlMessage::SetLoop(looping))
    }

    pub fn retune(&self, tempo: Tempo) -> bool {
        self.send(ControlMessage::Retune(tempo))
    }
}

/// Receiving side, drained by the scheduler without waiting. Clones share
/// one queue, so a session can hand it to each scheduler it builds.
#[derive(Debug, Clone)]
pub struct ControlReceiver {
    rx: Arc<Mutex<mpsc::UnboundedReceiver<ControlMessage>>>,
}

impl ControlReceiver {
    /// Everything queued right now, in send order.
    pub fn drain(&self) -> Vec<ControlMessage> {
        let mut rx = self.rx.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut pending = Vec::new();
        while let Ok(message) = rx.try_recv() {
            pending.push(message);
        }
        pending
    }
}
