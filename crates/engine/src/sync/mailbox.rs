use std::fmt::Debug;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::debug;

pub fn inbox<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
    bounded(capacity)
}

/// Best-effort delivery: never blocks, drops the message if the inbox is full
/// or its owner has gone away.
pub fn offer<T: Debug>(sender: &Sender<T>, message: T, target: &'static str) -> bool {
    match sender.try_send(message) {
        Ok(()) => true,
        Err(TrySendError::Full(message)) => {
            debug!(target_actor = target, ?message, "directive_dropped_inbox_full");
            false
        }
        Err(TrySendError::Disconnected(message)) => {
            debug!(target_actor = target, ?message, "directive_dropped_disconnected");
            false
        }
    }
}
