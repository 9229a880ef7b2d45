use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use thiserror::Error;
use tracing::{info, warn};

use crate::actors::{
    spawn_actor, ActorContext, Ghost, Guardian, Patroller, Portal, TrapActor, Treasure,
};
use crate::avatar::{AvatarController, Command, Flow};
use crate::config::SimConfig;
use crate::coordinator::{Coordinator, Outbox};
use crate::directives::{
    GhostDirective, GuardianDirective, PortalDirective, TrapDirective, TreasureDirective,
};
use crate::monitor::InteractionMonitor;
use crate::render::{spawn_render_worker, RenderWorker, Surface};
use crate::sync::{inbox, share_world, SharedWorld, ShutdownSignal};
use crate::world::GridState;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to start render worker: {0}")]
    RenderWorker(#[source] io::Error),
    #[error("failed to spawn {name} thread: {source}")]
    SpawnThread {
        name: &'static str,
        #[source]
        source: io::Error,
    },
}

struct Inboxes {
    portal: Receiver<PortalDirective>,
    trap: Receiver<TrapDirective>,
    ghost: Receiver<GhostDirective>,
    treasure: Receiver<TreasureDirective>,
    guardian: Receiver<GuardianDirective>,
    outbox: Outbox,
    portal_sender: Sender<PortalDirective>,
}

/// A running game: every actor thread, the render worker, and the avatar
/// controller driven by the caller's input.
pub struct Session<S> {
    world: SharedWorld,
    signal: ShutdownSignal,
    worker: RenderWorker<S>,
    controller: AvatarController,
    actors: Vec<(&'static str, JoinHandle<()>)>,
    grace: Duration,
}

impl<S> Session<S>
where
    S: Surface + Send + 'static,
{
    pub fn start(grid: GridState, surface: S, config: &SimConfig) -> Result<Self, SessionError> {
        let config = config.clone().validated();
        let world = share_world(grid);
        let (_, worker) = spawn_render_worker(surface, config.render_queue_capacity)
            .map_err(SessionError::RenderWorker)?;

        let (portal_tx, portal_rx) = inbox(config.inbox_capacity);
        let (trap_tx, trap_rx) = inbox(config.inbox_capacity);
        let (ghost_tx, ghost_rx) = inbox(config.inbox_capacity);
        let (treasure_tx, treasure_rx) = inbox(config.inbox_capacity);
        let (guardian_tx, guardian_rx) = inbox(config.inbox_capacity);

        let controller =
            AvatarController::new(Arc::clone(&world), portal_tx.clone(), treasure_tx.clone());
        let inboxes = Inboxes {
            portal: portal_rx,
            trap: trap_rx,
            ghost: ghost_rx,
            treasure: treasure_rx,
            guardian: guardian_rx,
            outbox: Outbox {
                ghost: ghost_tx,
                guardian: guardian_tx,
                treasure: treasure_tx,
                trap: trap_tx,
            },
            portal_sender: portal_tx,
        };

        let mut session = Self {
            world,
            signal: ShutdownSignal::new(),
            worker,
            controller,
            actors: Vec::new(),
            grace: config.shutdown_grace(),
        };

        if let Err(error) = session.spawn_all(&config, inboxes) {
            warn!(error = %error, "session_start_aborted");
            session.shutdown();
            return Err(error);
        }
        info!(actors = session.actors.len(), "session_started");
        session.request_render();
        Ok(session)
    }

    fn context(&self) -> ActorContext {
        ActorContext {
            world: Arc::clone(&self.world),
            render: self.worker.queue().clone(),
            shutdown: self.signal.token(),
        }
    }

    fn spawn<F>(&mut self, name: &'static str, body: F) -> Result<(), SessionError>
    where
        F: FnOnce() + Send + 'static,
    {
        let handle =
            spawn_actor(name, body).map_err(|source| SessionError::SpawnThread { name, source })?;
        self.actors.push((name, handle));
        Ok(())
    }

    fn spawn_all(&mut self, config: &SimConfig, inboxes: Inboxes) -> Result<(), SessionError> {
        let Inboxes {
            portal,
            trap,
            ghost,
            treasure,
            guardian,
            outbox,
            portal_sender,
        } = inboxes;
        let treasure_sender = outbox.treasure.clone();

        let (ctx, actor) = (self.context(), Patroller::from_config(config));
        self.spawn("patroller", move || actor.run(ctx))?;

        let (ctx, actor) = (self.context(), Portal::from_config(config));
        self.spawn("portal", move || actor.run(ctx, portal))?;

        let (ctx, actor) = (self.context(), TrapActor::from_config(config));
        self.spawn("trap", move || actor.run(ctx, trap))?;

        let (ctx, actor) = (self.context(), Ghost::from_config(config));
        self.spawn("ghost", move || actor.run(ctx, ghost))?;

        let (ctx, actor) = (self.context(), Treasure::default());
        self.spawn("treasure", move || actor.run(ctx, treasure))?;

        let (ctx, actor) = (self.context(), Guardian::from_config(config));
        self.spawn("guardian", move || actor.run(ctx, guardian))?;

        let (ctx, actor) = (self.context(), Coordinator::from_config(config));
        self.spawn("coordinator", move || actor.run(ctx, outbox))?;

        let (ctx, actor) = (self.context(), InteractionMonitor::from_config(config));
        self.spawn("monitor", move || actor.run(ctx, portal_sender, treasure_sender))?;

        Ok(())
    }

    pub fn world(&self) -> &SharedWorld {
        &self.world
    }

    pub fn request_render(&self) -> bool {
        self.worker.queue().request_frame(&self.world)
    }

    /// Feeds commands to the avatar until one asks to stop or the input runs dry.
    pub fn run_input<I>(&self, commands: I) -> Flow
    where
        I: IntoIterator<Item = Command>,
    {
        for command in commands {
            let flow = self.controller.apply(command);
            self.request_render();
            if flow == Flow::Stop {
                info!("quit_requested");
                return Flow::Stop;
            }
        }
        info!("input_exhausted");
        Flow::Continue
    }

    /// Stops every thread and returns the surface. `None` if the render
    /// worker panicked.
    pub fn shutdown(mut self) -> Option<S> {
        info!("shutdown_started");
        self.signal.broadcast();
        thread::sleep(self.grace);

        for (name, handle) in self.actors.drain(..) {
            if handle.join().is_err() {
                warn!(actor = name, "actor_panicked");
            }
        }

        self.request_render();
        let surface = self.worker.close();
        info!("shutdown_complete");
        surface
    }
}
