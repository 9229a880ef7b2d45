use std::thread;
use std::time::Duration;

use crossbeam_channel::{after, select, Receiver};
use tracing::{debug, info, warn};

use crate::config::SimConfig;
use crate::directives::TrapDirective;
use crate::world::{Element, GridState, Position};

use super::{retire_inbox, ActorContext};

pub const TRAP_ARMED: &str = "Trap armed!";
pub const TRAP_DISARMED: &str = "Trap disarmed";
pub const TRAP_EXPIRED: &str = "Trap expired";

// Traps have no owner-side record; the glyph on the grid is the state.
fn arm(grid: &mut GridState, at: Position) -> bool {
    if grid.place_if_vacant(at, Element::TRAP) {
        grid.set_status(TRAP_ARMED);
        true
    } else {
        false
    }
}

/// Removes the trap at `at` if it is still there. The status is only written
/// when this call actually removed it, so a second clear is silent.
fn disarm(grid: &mut GridState, at: Position, status: &str) -> bool {
    if grid.clear_if(at, Element::TRAP) {
        grid.set_status(status);
        true
    } else {
        false
    }
}

/// Clear performed by the avatar walking in; the caller writes its own status.
pub(crate) fn spring_trap(grid: &mut GridState, at: Position) -> bool {
    grid.clear_if(at, Element::TRAP)
}

#[derive(Debug, Clone)]
pub struct TrapActor {
    expiry: Duration,
}

impl TrapActor {
    pub fn new(expiry: Duration) -> Self {
        Self { expiry }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(Duration::from_millis(config.trap_expiry_ms))
    }

    pub fn handle(&self, ctx: &ActorContext, directive: TrapDirective) {
        match directive {
            TrapDirective::Activate { at } => {
                if !ctx.world.with(|grid| arm(grid, at)) {
                    debug!(x = at.x, y = at.y, "trap_activate_skipped_occupied");
                    return;
                }
                info!(x = at.x, y = at.y, "trap_armed");
                ctx.request_render();
                self.schedule_expiry(ctx, at);
            }
            TrapDirective::Deactivate { at } => {
                if ctx.world.with(|grid| disarm(grid, at, TRAP_DISARMED)) {
                    info!(x = at.x, y = at.y, "trap_disarmed");
                    ctx.request_render();
                }
            }
        }
    }

    /// Detached timer; it races the avatar and explicit deactivation, and the
    /// identity check in `disarm` settles who wins.
    fn schedule_expiry(&self, ctx: &ActorContext, at: Position) {
        let ctx = ctx.clone();
        let fires = after(self.expiry);
        let spawned = thread::Builder::new()
            .name("trap-expiry".to_string())
            .spawn(move || {
                select! {
                    recv(ctx.shutdown.receiver()) -> _ => {}
                    recv(fires) -> _ => {
                        if ctx.world.with(|grid| disarm(grid, at, TRAP_EXPIRED)) {
                            info!(x = at.x, y = at.y, "trap_expired");
                            ctx.request_render();
                        }
                    }
                }
            });
        if let Err(error) = spawned {
            warn!(error = %error, x = at.x, y = at.y, "trap_expiry_spawn_failed");
        }
    }

    pub fn run(self, ctx: ActorContext, mut inbox: Receiver<TrapDirective>) {
        loop {
            select! {
                recv(ctx.shutdown.receiver()) -> _ => break,
                recv(inbox) -> message => match message {
                    Ok(directive) => self.handle(&ctx, directive),
                    Err(_) => retire_inbox(&mut inbox, "trap"),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::render::RenderQueue;
    use crate::sync::{share_world, ShutdownSignal};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum TrapState {
        Armed,
        Disarmed,
    }

    fn trap_state(grid: &GridState, at: Position) -> TrapState {
        if grid.holds(at, Element::TRAP) {
            TrapState::Armed
        } else {
            TrapState::Disarmed
        }
    }

    fn context() -> (ActorContext, ShutdownSignal) {
        let signal = ShutdownSignal::new();
        let ctx = ActorContext {
            world: share_world(GridState::empty(20, 20, Position::new(1, 1)).expect("grid")),
            render: RenderQueue::disconnected(),
            shutdown: signal.token(),
        };
        (ctx, signal)
    }

    fn wait_for(ctx: &ActorContext, at: Position, state: TrapState) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if trap_state(&ctx.world.enter(), at) == state {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn armed_trap_expires_by_itself() {
        let (ctx, _signal) = context();
        let trap = TrapActor::new(Duration::from_millis(30));
        let at = Position::new(10, 10);

        trap.handle(&ctx, TrapDirective::Activate { at });
        assert_eq!(ctx.world.enter().status(), TRAP_ARMED);

        assert!(wait_for(&ctx, at, TrapState::Disarmed));
        assert_eq!(ctx.world.enter().status(), TRAP_EXPIRED);
    }

    #[test]
    fn activate_on_occupied_cell_is_skipped() {
        let (ctx, _signal) = context();
        let at = Position::new(4, 4);
        ctx.world.with(|grid| grid.set_cell(at, Element::VEGETATION));

        TrapActor::new(Duration::from_millis(30)).handle(&ctx, TrapDirective::Activate { at });

        let grid = ctx.world.enter();
        assert!(grid.holds(at, Element::VEGETATION));
        assert_eq!(grid.status(), "");
    }

    #[test]
    fn second_clear_is_silent() {
        let mut grid = GridState::empty(20, 20, Position::new(1, 1)).expect("grid");
        let at = Position::new(3, 3);
        assert!(arm(&mut grid, at));

        assert!(disarm(&mut grid, at, TRAP_DISARMED));
        grid.set_status("something else");
        assert!(!disarm(&mut grid, at, TRAP_EXPIRED));

        assert_eq!(grid.status(), "something else");
        assert_eq!(trap_state(&grid, at), TrapState::Disarmed);
    }

    #[test]
    fn expiry_after_explicit_deactivate_changes_nothing() {
        let (ctx, _signal) = context();
        let trap = TrapActor::new(Duration::from_millis(30));
        let at = Position::new(6, 6);

        trap.handle(&ctx, TrapDirective::Activate { at });
        trap.handle(&ctx, TrapDirective::Deactivate { at });
        assert_eq!(ctx.world.enter().status(), TRAP_DISARMED);

        thread::sleep(Duration::from_millis(80));
        assert_eq!(ctx.world.enter().status(), TRAP_DISARMED);
    }

    #[test]
    fn shutdown_cancels_pending_expiry() {
        let (ctx, mut signal) = context();
        let trap = TrapActor::new(Duration::from_millis(40));
        let at = Position::new(8, 8);

        trap.handle(&ctx, TrapDirective::Activate { at });
        signal.broadcast();
        thread::sleep(Duration::from_millis(100));

        assert_eq!(trap_state(&ctx.world.enter(), at), TrapState::Armed);
    }

    #[test]
    fn spring_clears_without_status() {
        let mut grid = GridState::empty(20, 20, Position::new(1, 1)).expect("grid");
        let at = Position::new(2, 1);
        assert!(arm(&mut grid, at));
        grid.clear_status();

        assert!(spring_trap(&mut grid, at));
        assert!(!spring_trap(&mut grid, at));
        assert_eq!(grid.status(), "");
    }
}
