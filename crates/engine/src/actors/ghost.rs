use std::time::Duration;

use crossbeam_channel::{select, tick, Receiver};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::config::SimConfig;
use crate::directives::GhostDirective;
use crate::world::{Element, GridState, Position};

use super::{retire_inbox, ActorContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GhostMode {
    Patrol,
    Pursue,
}

const WANDER_STEPS: [(i32, i32); 5] = [(0, -1), (0, 1), (-1, 0), (1, 0), (0, 0)];

/// One step toward `target`, closing the horizontal gap before the vertical one.
pub fn pursuit_step(from: Position, target: Position) -> Position {
    if from.x != target.x {
        from.offset((target.x - from.x).signum(), 0)
    } else {
        from.offset(0, (target.y - from.y).signum())
    }
}

/// Drifts through open floor. Passable for the avatar, and can vanish.
#[derive(Debug)]
pub struct Ghost {
    position: Position,
    mode: GhostMode,
    visible: bool,
    tick: Duration,
    rng: StdRng,
}

impl Ghost {
    pub fn new(start: Position, tick: Duration, rng: StdRng) -> Self {
        Self {
            position: start,
            mode: GhostMode::Patrol,
            visible: true,
            tick,
            rng,
        }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(
            config.ghost_start,
            Duration::from_millis(config.ghost_tick_ms),
            StdRng::from_entropy(),
        )
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn mode(&self) -> GhostMode {
        self.mode
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn apply(&mut self, directive: GhostDirective) {
        match directive {
            GhostDirective::Pursue => {
                self.mode = GhostMode::Pursue;
                self.visible = true;
            }
            GhostDirective::Patrol => self.mode = GhostMode::Patrol,
            GhostDirective::Hide => self.visible = false,
        }
    }

    pub fn enter_world(&self, grid: &mut GridState) {
        if self.visible {
            grid.place_if_vacant(self.position, Element::GHOST);
        }
    }

    pub fn step(&mut self, grid: &mut GridState) {
        grid.clear_if(self.position, Element::GHOST);

        let next = match self.mode {
            GhostMode::Pursue => pursuit_step(self.position, grid.avatar()),
            GhostMode::Patrol => {
                let (dx, dy) = WANDER_STEPS[self.rng.gen_range(0..WANDER_STEPS.len())];
                self.position.offset(dx, dy)
            }
        };
        if next != self.position && grid.is_vacant(next) {
            self.position = next;
        }

        if self.visible {
            grid.place_if_vacant(self.position, Element::GHOST);
        }
    }

    pub fn run(mut self, ctx: ActorContext, mut inbox: Receiver<GhostDirective>) {
        ctx.world.with(|grid| self.enter_world(grid));
        ctx.request_render();

        let ticker = tick(self.tick);
        loop {
            select! {
                recv(ctx.shutdown.receiver()) -> _ => break,
                recv(inbox) -> message => match message {
                    Ok(directive) => {
                        debug!(?directive, "ghost_directive");
                        self.apply(directive);
                    }
                    Err(_) => retire_inbox(&mut inbox, "ghost"),
                },
                recv(ticker) -> _ => {
                    ctx.world.with(|grid| self.step(grid));
                    ctx.request_render();
                }
            }
        }
    }
}
