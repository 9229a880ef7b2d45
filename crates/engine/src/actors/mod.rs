use std::io;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{never, Receiver};
use tracing::info;

use crate::render::RenderQueue;
use crate::sync::{SharedWorld, ShutdownToken};

mod ghost;
mod guardian;
mod patroller;
mod portal;
mod trap;
mod treasure;

pub use ghost::{pursuit_step, Ghost, GhostMode};
pub use guardian::{within_range, Guardian, GuardianState};
pub use patroller::Patroller;
pub use portal::{Portal, PortalOutcome, PortalPhase};
pub use trap::TrapActor;
pub use treasure::{Treasure, TreasureState};

pub(crate) use trap::spring_trap;

/// What every loop needs besides its own state: the world, a way to ask for a
/// frame, and the stop signal.
#[derive(Debug, Clone)]
pub struct ActorContext {
    pub world: SharedWorld,
    pub render: RenderQueue,
    pub shutdown: ShutdownToken,
}

impl ActorContext {
    pub fn request_render(&self) {
        self.render.request_frame(&self.world);
    }
}

pub(crate) fn spawn_actor<F>(name: &'static str, body: F) -> io::Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new().name(name.to_string()).spawn(move || {
        info!(actor = name, "actor_started");
        body();
        info!(actor = name, "actor_stopped");
    })
}

/// An inbox whose senders are all gone would make `select!` spin; swap it for
/// one that never fires.
pub(crate) fn retire_inbox<T>(inbox: &mut Receiver<T>, actor: &'static str) {
    info!(actor, "inbox_disconnected");
    *inbox = never();
}
