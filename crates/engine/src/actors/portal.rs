use std::time::{Duration, Instant};

use crossbeam_channel::{select, tick, Receiver};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::config::{SimConfig, SpawnArea};
use crate::directives::PortalDirective;
use crate::world::{Element, GridState, Position};

use super::{retire_inbox, ActorContext};

pub const PORTAL_APPEARED: &str = "A portal appeared!";
pub const PORTAL_USED: &str = "Portal used! Teleported!";
pub const PORTAL_CLOSED: &str = "The portal closed on its own";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalPhase {
    Idle,
    Open(Position),
}

/// How an opening ended. Each opening ends exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalOutcome {
    /// `to` is `None` when no landing cell was found and the avatar stayed put.
    Teleported { to: Option<Position> },
    AutoClosed,
}

#[derive(Debug)]
pub struct Portal {
    phase: PortalPhase,
    spawn_area: SpawnArea,
    spawn_attempts: u32,
    teleport_attempts: u32,
    spawn_interval: Duration,
    open_for: Duration,
    rng: StdRng,
}

impl Portal {
    pub fn from_config(config: &SimConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn with_rng(config: &SimConfig, rng: StdRng) -> Self {
        Self {
            phase: PortalPhase::Idle,
            spawn_area: config.spawn_area,
            spawn_attempts: config.portal_spawn_attempts,
            teleport_attempts: config.teleport_attempts,
            spawn_interval: Duration::from_millis(config.portal_spawn_interval_ms),
            open_for: Duration::from_millis(config.portal_open_ms),
            rng,
        }
    }

    pub fn phase(&self) -> PortalPhase {
        self.phase
    }

    /// Tries a bounded number of random cells and opens on the first vacant one.
    pub fn open(&mut self, grid: &mut GridState) -> Option<Position> {
        if self.phase != PortalPhase::Idle {
            return None;
        }
        for _ in 0..self.spawn_attempts {
            let candidate = self.spawn_area.sample(&mut self.rng);
            if grid.place_if_vacant(candidate, Element::PORTAL) {
                grid.set_status(PORTAL_APPEARED);
                self.phase = PortalPhase::Open(candidate);
                return Some(candidate);
            }
        }
        None
    }

    pub fn use_portal(&mut self, grid: &mut GridState, at: Position) -> PortalOutcome {
        self.phase = PortalPhase::Idle;
        grid.clear_if(at, Element::PORTAL);

        let mut landed = None;
        for _ in 0..self.teleport_attempts {
            let candidate = self.spawn_area.sample(&mut self.rng);
            if grid.set_avatar(candidate) {
                landed = Some(candidate);
                break;
            }
        }
        grid.set_status(PORTAL_USED);
        PortalOutcome::Teleported { to: landed }
    }

    pub fn expire(&mut self, grid: &mut GridState, at: Position) -> PortalOutcome {
        self.phase = PortalPhase::Idle;
        grid.clear_if(at, Element::PORTAL);
        grid.set_status(PORTAL_CLOSED);
        PortalOutcome::AutoClosed
    }

    /// Waits for a matching use or the deadline, whichever comes first.
    /// `None` means shutdown interrupted the wait; the glyph is left as is.
    pub fn hold_open(
        &mut self,
        ctx: &ActorContext,
        inbox: &mut Receiver<PortalDirective>,
        portal_at: Position,
    ) -> Option<PortalOutcome> {
        let closes = crossbeam_channel::at(Instant::now() + self.open_for);
        loop {
            select! {
                recv(ctx.shutdown.receiver()) -> _ => return None,
                recv(inbox) -> message => match message {
                    Ok(PortalDirective::Use { at: used }) if used == portal_at => {
                        return Some(ctx.world.with(|grid| self.use_portal(grid, portal_at)));
                    }
                    Ok(directive) => debug!(?directive, "portal_use_mismatched"),
                    Err(_) => retire_inbox(inbox, "portal"),
                },
                recv(closes) -> _ => {
                    return Some(ctx.world.with(|grid| self.expire(grid, portal_at)));
                }
            }
        }
    }

    pub fn run(mut self, ctx: ActorContext, mut inbox: Receiver<PortalDirective>) {
        let spawner = tick(self.spawn_interval);
        loop {
            select! {
                recv(ctx.shutdown.receiver()) -> _ => break,
                recv(inbox) -> message => match message {
                    Ok(directive) => debug!(?directive, "portal_use_while_idle"),
                    Err(_) => retire_inbox(&mut inbox, "portal"),
                },
                recv(spawner) -> _ => {
                    let Some(portal_at) = ctx.world.with(|grid| self.open(grid)) else {
                        debug!("portal_spawn_no_vacant_cell");
                        continue;
                    };
                    info!(x = portal_at.x, y = portal_at.y, "portal_opened");
                    ctx.request_render();

                    let Some(outcome) = self.hold_open(&ctx, &mut inbox, portal_at) else {
                        break;
                    };
                    info!(?outcome, "portal_closed");
                    ctx.request_render();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::render::RenderQueue;
    use crate::sync::{inbox, share_world, ShutdownSignal};

    fn config(open_ms: u64) -> SimConfig {
        SimConfig {
            portal_open_ms: open_ms,
            spawn_area: SpawnArea {
                min_x: 1,
                min_y: 1,
                width: 8,
                height: 8,
            },
            ..SimConfig::default()
        }
    }

    fn portal(open_ms: u64) -> Portal {
        Portal::with_rng(&config(open_ms), StdRng::seed_from_u64(3))
    }

    #[test]
    fn open_places_glyph_on_vacant_cell() {
        let mut grid = GridState::empty(10, 10, Position::new(0, 0)).expect("grid");
        let mut portal = portal(100);

        let at = portal.open(&mut grid).expect("opened");

        assert!(grid.holds(at, Element::PORTAL));
        assert_eq!(portal.phase(), PortalPhase::Open(at));
        assert_eq!(grid.status(), PORTAL_APPEARED);
        assert_eq!(portal.open(&mut grid), None);
    }

    #[test]
    fn open_gives_up_when_area_is_full() {
        let mut grid = GridState::empty(10, 10, Position::new(0, 0)).expect("grid");
        for y in 1..9 {
            for x in 1..9 {
                grid.set_cell(Position::new(x, y), Element::VEGETATION);
            }
        }
        let mut portal = portal(100);

        assert_eq!(portal.open(&mut grid), None);
        assert_eq!(portal.phase(), PortalPhase::Idle);
        assert_eq!(grid.status(), "");
    }

    #[test]
    fn use_teleports_and_clears_glyph() {
        let mut grid = GridState::empty(10, 10, Position::new(0, 0)).expect("grid");
        let mut portal = portal(100);
        let at = portal.open(&mut grid).expect("opened");

        let outcome = portal.use_portal(&mut grid, at);

        let PortalOutcome::Teleported { to: Some(to) } = outcome else {
            panic!("expected a landing cell, got {outcome:?}");
        };
        assert_eq!(grid.avatar(), to);
        assert!(!grid.holds(at, Element::PORTAL));
        assert_eq!(grid.status(), PORTAL_USED);
        assert_eq!(portal.phase(), PortalPhase::Idle);
    }

    #[test]
    fn teleport_without_landing_cell_keeps_avatar() {
        let mut grid = GridState::empty(10, 10, Position::new(0, 0)).expect("grid");
        let mut portal = portal(100);
        let at = portal.open(&mut grid).expect("opened");
        for y in 1..9 {
            for x in 1..9 {
                if Position::new(x, y) != at {
                    grid.set_cell(Position::new(x, y), Element::WALL);
                }
            }
        }
        grid.clear_if(at, Element::PORTAL);
        grid.set_cell(at, Element::WALL);

        let outcome = portal.use_portal(&mut grid, at);

        assert_eq!(outcome, PortalOutcome::Teleported { to: None });
        assert_eq!(grid.avatar(), Position::new(0, 0));
        assert_eq!(grid.status(), PORTAL_USED);
    }

    fn context(grid: GridState) -> (ActorContext, ShutdownSignal) {
        let signal = ShutdownSignal::new();
        let ctx = ActorContext {
            world: share_world(grid),
            render: RenderQueue::disconnected(),
            shutdown: signal.token(),
        };
        (ctx, signal)
    }

    #[test]
    fn unused_portal_closes_on_its_own() {
        let (ctx, _signal) = context(GridState::empty(10, 10, Position::new(0, 0)).expect("grid"));
        let (_tx, mut rx) = inbox::<PortalDirective>(4);
        let mut portal = portal(40);
        let at = ctx.world.with(|grid| portal.open(grid)).expect("opened");

        let outcome = portal.hold_open(&ctx, &mut rx, at);

        assert_eq!(outcome, Some(PortalOutcome::AutoClosed));
        assert_eq!(portal.phase(), PortalPhase::Idle);
        let grid = ctx.world.enter();
        assert!(!grid.holds(at, Element::PORTAL));
        assert_eq!(grid.status(), PORTAL_CLOSED);
    }

    #[test]
    fn matching_use_wins_over_deadline_and_mismatch_is_ignored() {
        let (ctx, _signal) = context(GridState::empty(10, 10, Position::new(0, 0)).expect("grid"));
        let (tx, mut rx) = inbox::<PortalDirective>(4);
        let mut portal = portal(5_000);
        let at = ctx.world.with(|grid| portal.open(grid)).expect("opened");

        tx.send(PortalDirective::Use {
            at: Position::new(at.x + 20, at.y),
        })
        .expect("send");
        tx.send(PortalDirective::Use { at }).expect("send");

        let started = Instant::now();
        let outcome = portal.hold_open(&ctx, &mut rx, at);

        assert!(matches!(outcome, Some(PortalOutcome::Teleported { .. })));
        assert!(started.elapsed() < Duration::from_millis(5_000));
        assert_eq!(ctx.world.enter().status(), PORTAL_USED);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn shutdown_interrupts_open_wait() {
        let (ctx, mut signal) =
            context(GridState::empty(10, 10, Position::new(0, 0)).expect("grid"));
        let (_tx, mut rx) = inbox::<PortalDirective>(4);
        let mut portal = portal(10_000);
        let at = ctx.world.with(|grid| portal.open(grid)).expect("opened");

        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            signal.broadcast();
        });
        let outcome = portal.hold_open(&ctx, &mut rx, at);
        stopper.join().expect("join");

        assert_eq!(outcome, None);
    }

    fn wait_for(ctx: &ActorContext, ready: impl Fn(&GridState) -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if ctx.world.with(|grid| ready(grid)) {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        false
    }

    #[test]
    fn use_after_auto_close_does_not_teleport() {
        let start = Position::new(0, 0);
        let (ctx, mut signal) = context(GridState::empty(10, 10, start).expect("grid"));
        let (tx, rx) = inbox::<PortalDirective>(4);
        let config = SimConfig {
            portal_spawn_interval_ms: 30,
            ..config(10)
        };
        let portal = Portal::with_rng(&config, StdRng::seed_from_u64(5));
        let runner = {
            let ctx = ctx.clone();
            thread::spawn(move || portal.run(ctx, rx))
        };

        let find_portal = |grid: &GridState| {
            (1..9)
                .flat_map(|y| (1..9).map(move |x| Position::new(x, y)))
                .find(|pos| grid.holds(*pos, Element::PORTAL))
        };
        assert!(wait_for(&ctx, |grid| find_portal(grid).is_some()));
        let at = ctx.world.with(|grid| find_portal(grid)).expect("portal cell");
        assert!(wait_for(&ctx, |grid| grid.status() == PORTAL_CLOSED));

        tx.send(PortalDirective::Use { at }).expect("send");
        thread::sleep(Duration::from_millis(10));

        {
            let grid = ctx.world.enter();
            assert_eq!(grid.avatar(), start);
            assert_ne!(grid.status(), PORTAL_USED);
        }
        signal.broadcast();
        runner.join().expect("join");
    }
}
