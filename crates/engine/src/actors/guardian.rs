use std::time::Duration;

use crossbeam_channel::{select, tick, Receiver};
use tracing::{debug, info};

use crate::config::SimConfig;
use crate::directives::GuardianDirective;
use crate::world::{Element, GridState, Position};

use super::{retire_inbox, ActorContext};

pub const GUARDIAN_WOKE: &str = "The guardian woke up!";
pub const GUARDIAN_SLEPT: &str = "The guardian fell asleep";
pub const GUARDIAN_SPOTTED: &str = "The guardian spotted you!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardianState {
    Asleep,
    Awake,
}

/// Chebyshev-style box check: both axis gaps within `range`.
pub fn within_range(a: Position, b: Position, range: i32) -> bool {
    (a.x - b.x).abs() <= range && (a.y - b.y).abs() <= range
}

/// Stationary watcher at its post.
#[derive(Debug, Clone)]
pub struct Guardian {
    post: Position,
    state: GuardianState,
    range: i32,
    tick: Duration,
}

impl Guardian {
    pub fn new(post: Position, range: i32, tick: Duration) -> Self {
        Self {
            post,
            state: GuardianState::Asleep,
            range,
            tick,
        }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(
            config.guardian_post,
            config.guardian_detection_range,
            Duration::from_millis(config.guardian_tick_ms),
        )
    }

    pub fn state(&self) -> GuardianState {
        self.state
    }

    pub fn enter_world(&self, grid: &mut GridState) {
        if !grid.holds(self.post, Element::GUARDIAN) {
            grid.place_if_vacant(self.post, Element::GUARDIAN);
        }
    }

    /// Returns whether the state changed; repeats are silent.
    pub fn apply(&mut self, grid: &mut GridState, directive: GuardianDirective) -> bool {
        let (next, status) = match directive {
            GuardianDirective::Wake => (GuardianState::Awake, GUARDIAN_WOKE),
            GuardianDirective::Sleep => (GuardianState::Asleep, GUARDIAN_SLEPT),
        };
        if self.state == next {
            return false;
        }
        self.state = next;
        grid.set_status(status);
        true
    }

    /// Returns whether the avatar was spotted this tick.
    pub fn watch(&self, grid: &mut GridState) -> bool {
        if self.state != GuardianState::Awake || !within_range(self.post, grid.avatar(), self.range) {
            return false;
        }
        grid.set_status(GUARDIAN_SPOTTED);
        true
    }

    pub fn run(mut self, ctx: ActorContext, mut inbox: Receiver<GuardianDirective>) {
        ctx.world.with(|grid| self.enter_world(grid));
        ctx.request_render();

        let ticker = tick(self.tick);
        loop {
            select! {
                recv(ctx.shutdown.receiver()) -> _ => break,
                recv(inbox) -> message => match message {
                    Ok(directive) => {
                        if ctx.world.with(|grid| self.apply(grid, directive)) {
                            info!(state = ?self.state, "guardian_state_changed");
                            ctx.request_render();
                        }
                    }
                    Err(_) => retire_inbox(&mut inbox, "guardian"),
                },
                recv(ticker) -> _ => {
                    if ctx.world.with(|grid| self.watch(grid)) {
                        debug!("guardian_spotted_avatar");
                        ctx.request_render();
                    }
                }
            }
        }
    }
}
