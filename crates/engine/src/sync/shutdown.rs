use crossbeam_channel::{bounded, Receiver, Sender};

/// Owner side of the broadcast stop.
///
/// The signal holds the only sender of a channel nobody ever sends on.
/// Broadcasting drops that sender, which disconnects the channel, so every
/// token's receiver becomes ready inside `select!` at the same moment.
/// Dropping the signal broadcasts as well.
#[derive(Debug)]
pub struct ShutdownSignal {
    trigger: Option<Sender<()>>,
    token: ShutdownToken,
}

#[derive(Debug, Clone)]
pub struct ShutdownToken {
    receiver: Receiver<()>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (trigger, receiver) = bounded(0);
        Self {
            trigger: Some(trigger),
            token: ShutdownToken { receiver },
        }
    }

    pub fn token(&self) -> ShutdownToken {
        self.token.clone()
    }

    pub fn broadcast(&mut self) {
        self.trigger.take();
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ShutdownSignal {
    fn drop(&mut self) {
        self.broadcast();
    }
}

impl ShutdownToken {
    /// Ready (with a disconnect error) once shutdown was broadcast. Meant for `select!`.
    pub fn receiver(&self) -> &Receiver<()> {
        &self.receiver
    }
}
