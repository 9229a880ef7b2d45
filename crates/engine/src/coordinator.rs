use std::time::Duration;

use crossbeam_channel::{select, tick, Sender};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::actors::ActorContext;
use crate::config::{GuardedRegion, SimConfig, SpawnArea};
use crate::directives::{GhostDirective, GuardianDirective, TrapDirective, TreasureDirective};
use crate::sync::offer;
use crate::world::{Bounds, Position};

/// Directives for one coordination period. The ghost always gets one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectivePlan {
    pub ghost: GhostDirective,
    pub guardian: Option<GuardianDirective>,
    pub treasure: Option<TreasureDirective>,
    pub trap: Option<TrapDirective>,
}

/// Sending ends of the inboxes the coordinator drives.
#[derive(Debug, Clone)]
pub struct Outbox {
    pub ghost: Sender<GhostDirective>,
    pub guardian: Sender<GuardianDirective>,
    pub treasure: Sender<TreasureDirective>,
    pub trap: Sender<TrapDirective>,
}

impl Outbox {
    pub fn dispatch(&self, plan: DirectivePlan) {
        offer(&self.ghost, plan.ghost, "ghost");
        if let Some(directive) = plan.guardian {
            offer(&self.guardian, directive, "guardian");
        }
        if let Some(directive) = plan.treasure {
            offer(&self.treasure, directive, "treasure");
        }
        if let Some(directive) = plan.trap {
            offer(&self.trap, directive, "trap");
        }
    }
}

/// Watches where the avatar is and nudges the other actors accordingly.
/// Never writes to the grid itself.
#[derive(Debug)]
pub struct Coordinator {
    period: Duration,
    pursuit_x_threshold: i32,
    guarded_region: GuardedRegion,
    ghost_hide_one_in: u32,
    treasure_spawn_one_in: u32,
    trap_spawn_one_in: u32,
    trap_spawn_radius: i32,
    spawn_area: SpawnArea,
    avatar_was_guarded: bool,
    rng: StdRng,
}

impl Coordinator {
    pub fn from_config(config: &SimConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn with_rng(config: &SimConfig, rng: StdRng) -> Self {
        Self {
            period: Duration::from_millis(config.coordinator_period_ms),
            pursuit_x_threshold: config.ghost_pursuit_x_threshold,
            guarded_region: config.guarded_region,
            ghost_hide_one_in: config.ghost_hide_one_in.max(1),
            treasure_spawn_one_in: config.treasure_spawn_one_in.max(1),
            trap_spawn_one_in: config.trap_spawn_one_in.max(1),
            trap_spawn_radius: config.trap_spawn_radius.max(0),
            spawn_area: config.spawn_area,
            avatar_was_guarded: false,
            rng,
        }
    }

    pub fn plan(&mut self, avatar: Position, bounds: Bounds) -> DirectivePlan {
        let ghost = if avatar.x > self.pursuit_x_threshold {
            GhostDirective::Pursue
        } else if self.rng.gen_ratio(1, self.ghost_hide_one_in) {
            GhostDirective::Hide
        } else {
            GhostDirective::Patrol
        };

        // Wake every period inside the region; Sleep once, on leaving it.
        let guarded = self.guarded_region.contains(avatar);
        let guardian = if guarded {
            Some(GuardianDirective::Wake)
        } else if self.avatar_was_guarded {
            Some(GuardianDirective::Sleep)
        } else {
            None
        };
        self.avatar_was_guarded = guarded;

        let treasure = self
            .rng
            .gen_ratio(1, self.treasure_spawn_one_in)
            .then(|| TreasureDirective::Appear {
                at: self.spawn_area.sample(&mut self.rng),
            });

        let trap = if self.rng.gen_ratio(1, self.trap_spawn_one_in) {
            let radius = self.trap_spawn_radius;
            let at = avatar.offset(
                self.rng.gen_range(-radius..=radius),
                self.rng.gen_range(-radius..=radius),
            );
            bounds
                .contains(at)
                .then_some(TrapDirective::Activate { at })
        } else {
            None
        };

        DirectivePlan {
            ghost,
            guardian,
            treasure,
            trap,
        }
    }

    pub fn run(mut self, ctx: ActorContext, outbox: Outbox) {
        let ticker = tick(self.period);
        loop {
            select! {
                recv(ctx.shutdown.receiver()) -> _ => break,
                recv(ticker) -> _ => {
                    let (avatar, bounds) = ctx.world.with(|grid| (grid.avatar(), grid.bounds()));
                    let plan = self.plan(avatar, bounds);
                    debug!(?plan, "coordinator_plan");
                    outbox.dispatch(plan);
                }
            }
        }
    }
}
