use crossbeam_channel::{select, Receiver};
use tracing::{debug, info};

use crate::directives::TreasureDirective;
use crate::world::{Element, GridState, Position};

use super::{retire_inbox, ActorContext};

pub const TREASURE_APPEARED: &str = "A treasure appeared!";
pub const TREASURE_COLLECTED: &str = "Treasure collected!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreasureState {
    Absent,
    Present(Position),
}

/// At most one treasure on the map at a time.
#[derive(Debug, Clone)]
pub struct Treasure {
    state: TreasureState,
}

impl Default for Treasure {
    fn default() -> Self {
        Self {
            state: TreasureState::Absent,
        }
    }
}

impl Treasure {
    pub fn state(&self) -> TreasureState {
        self.state
    }

    /// Returns whether the grid changed.
    pub fn apply(&mut self, grid: &mut GridState, directive: TreasureDirective) -> bool {
        match directive {
            TreasureDirective::Appear { at } => {
                if let TreasureState::Present(current) = self.state {
                    if grid.holds(current, Element::TREASURE) {
                        return false;
                    }
                    self.state = TreasureState::Absent;
                }
                if !grid.place_if_vacant(at, Element::TREASURE) {
                    return false;
                }
                grid.set_status(TREASURE_APPEARED);
                self.state = TreasureState::Present(at);
                true
            }
            TreasureDirective::Collect { at } => {
                if !grid.clear_if(at, Element::TREASURE) {
                    return false;
                }
                grid.set_status(TREASURE_COLLECTED);
                self.state = TreasureState::Absent;
                true
            }
        }
    }

    pub fn run(mut self, ctx: ActorContext, mut inbox: Receiver<TreasureDirective>) {
        loop {
            select! {
                recv(ctx.shutdown.receiver()) -> _ => break,
                recv(inbox) -> message => match message {
                    Ok(directive) => {
                        if ctx.world.with(|grid| self.apply(grid, directive)) {
                            info!(?directive, "treasure_changed");
                            ctx.request_render();
                        } else {
                            debug!(?directive, "treasure_directive_ignored");
                        }
                    }
                    Err(_) => retire_inbox(&mut inbox, "treasure"),
                },
            }
        }
    }
}
