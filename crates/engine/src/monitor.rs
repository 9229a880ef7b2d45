use std::thread;
use std::time::Duration;

use crossbeam_channel::{after, select, tick, Sender};
use tracing::{debug, warn};

use crate::actors::ActorContext;
use crate::config::SimConfig;
use crate::directives::{PortalDirective, TreasureDirective};
use crate::sync::offer;
use crate::world::{Element, GridState, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    Nothing,
    SchedulePortalUse(Position),
    CollectTreasure(Position),
}

/// Polls what the avatar is standing on and triggers the automatic
/// interactions: delayed portal use, instant treasure pickup.
#[derive(Debug, Clone)]
pub struct InteractionMonitor {
    period: Duration,
    auto_use_delay: Duration,
    scheduled: Option<Position>,
}

impl InteractionMonitor {
    pub fn new(period: Duration, auto_use_delay: Duration) -> Self {
        Self {
            period,
            auto_use_delay,
            scheduled: None,
        }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(
            Duration::from_millis(config.monitor_period_ms),
            Duration::from_millis(config.portal_auto_use_delay_ms),
        )
    }

    /// A portal cell is reported once until the avatar steps off it.
    pub fn observe(&mut self, grid: &GridState) -> Observation {
        let at = grid.avatar();
        if grid.holds(at, Element::PORTAL) {
            if self.scheduled == Some(at) {
                return Observation::Nothing;
            }
            self.scheduled = Some(at);
            return Observation::SchedulePortalUse(at);
        }

        self.scheduled = None;
        if grid.holds(at, Element::TREASURE) {
            Observation::CollectTreasure(at)
        } else {
            Observation::Nothing
        }
    }

    fn schedule_auto_use(&self, ctx: &ActorContext, portal: &Sender<PortalDirective>, at: Position) {
        let ctx = ctx.clone();
        let portal = portal.clone();
        let fires = after(self.auto_use_delay);
        let spawned = thread::Builder::new()
            .name("portal-auto-use".to_string())
            .spawn(move || {
                select! {
                    recv(ctx.shutdown.receiver()) -> _ => {}
                    recv(fires) -> _ => {
                        let still_there = ctx.world.with(|grid| grid.avatar() == at);
                        if still_there {
                            debug!(x = at.x, y = at.y, "portal_auto_use");
                            offer(&portal, PortalDirective::Use { at }, "portal");
                        }
                    }
                }
            });
        if let Err(error) = spawned {
            warn!(error = %error, "portal_auto_use_spawn_failed");
        }
    }

    pub fn run(
        mut self,
        ctx: ActorContext,
        portal: Sender<PortalDirective>,
        treasure: Sender<TreasureDirective>,
    ) {
        let ticker = tick(self.period);
        loop {
            select! {
                recv(ctx.shutdown.receiver()) -> _ => break,
                recv(ticker) -> _ => {
                    match ctx.world.with(|grid| self.observe(grid)) {
                        Observation::SchedulePortalUse(at) => {
                            self.schedule_auto_use(&ctx, &portal, at);
                        }
                        Observation::CollectTreasure(at) => {
                            offer(&treasure, TreasureDirective::Collect { at }, "treasure");
                        }
                        Observation::Nothing => {}
                    }
                }
            }
        }
    }
}
