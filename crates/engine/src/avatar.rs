use crossbeam_channel::Sender;
use tracing::debug;

use crate::actors::spring_trap;
use crate::directives::{PortalDirective, TreasureDirective};
use crate::sync::{offer, SharedWorld};
use crate::world::{Element, GridState, Position};

pub const TRAP_STEPPED: &str = "You stepped on a trap! Careful!";
pub const GHOST_PASSED: &str = "You passed through the ghost... creepy!";
pub const LEAVING: &str = "Leaving the game...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move(Direction),
    Interact,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

fn blocked_message(element: Element) -> &'static str {
    if element.is(Element::WALL) {
        "You bumped into the wall!"
    } else if element.is(Element::ENEMY) {
        "An enemy blocks the way!"
    } else if element.is(Element::GUARDIAN) {
        "The guardian will not let you pass!"
    } else {
        "The way is blocked!"
    }
}

fn flavor_message(element: Element) -> Option<&'static str> {
    if element.is(Element::VEGETATION) {
        Some("You examine the vegetation... nothing interesting")
    } else if element.is(Element::WALL) {
        Some("You touch the wall... it is solid")
    } else if element.is(Element::ENEMY) {
        Some("The enemy glares at you menacingly!")
    } else if element.is(Element::GUARDIAN) {
        Some("The guardian stands still... for now")
    } else {
        None
    }
}

/// Applies one step. Returns whether the avatar moved.
pub fn move_avatar(grid: &mut GridState, direction: Direction) -> bool {
    let (dx, dy) = direction.delta();
    let target = grid.avatar().offset(dx, dy);
    let Some(element) = grid.cell(target) else {
        return false;
    };

    if element.blocking {
        grid.set_status(blocked_message(element));
        return false;
    }

    if spring_trap(grid, target) {
        grid.set_status(TRAP_STEPPED);
    } else if element.is(Element::GHOST) {
        grid.set_status(GHOST_PASSED);
    } else {
        grid.clear_status();
    }
    grid.set_avatar(target)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Underfoot {
    Portal(Position),
    Treasure(Position),
    Other(Position),
}

fn underfoot(grid: &GridState) -> Underfoot {
    let at = grid.avatar();
    if grid.holds(at, Element::PORTAL) {
        Underfoot::Portal(at)
    } else if grid.holds(at, Element::TREASURE) {
        Underfoot::Treasure(at)
    } else {
        Underfoot::Other(at)
    }
}

fn describe_surroundings(grid: &mut GridState, at: Position) {
    let message = Direction::ALL
        .iter()
        .filter_map(|direction| {
            let (dx, dy) = direction.delta();
            grid.cell(at.offset(dx, dy)).and_then(flavor_message)
        })
        .next()
        .map(str::to_string)
        .unwrap_or_else(|| format!("Interacting at ({}, {}) - nothing happens", at.x, at.y));
    grid.set_status(message);
}

/// Turns player commands into world changes. Runs on the foreground thread.
#[derive(Debug, Clone)]
pub struct AvatarController {
    world: SharedWorld,
    portal: Sender<PortalDirective>,
    treasure: Sender<TreasureDirective>,
}

impl AvatarController {
    pub fn new(
        world: SharedWorld,
        portal: Sender<PortalDirective>,
        treasure: Sender<TreasureDirective>,
    ) -> Self {
        Self {
            world,
            portal,
            treasure,
        }
    }

    pub fn apply(&self, command: Command) -> Flow {
        match command {
            Command::Move(direction) => {
                let moved = self.world.with(|grid| move_avatar(grid, direction));
                debug!(?direction, moved, "avatar_move");
            }
            Command::Interact => self.interact(),
            Command::Quit => {
                self.world.with(|grid| grid.set_status(LEAVING));
                return Flow::Stop;
            }
        }
        Flow::Continue
    }

    fn interact(&self) {
        let found = self.world.with(|grid| underfoot(grid));
        let status = match found {
            Underfoot::Portal(at) => {
                if offer(&self.portal, PortalDirective::Use { at }, "portal") {
                    "Using the portal..."
                } else {
                    "The portal does not respond..."
                }
            }
            Underfoot::Treasure(at) => {
                if offer(&self.treasure, TreasureDirective::Collect { at }, "treasure") {
                    "Collecting the treasure!"
                } else {
                    "Could not collect the treasure"
                }
            }
            Underfoot::Other(at) => {
                self.world.with(|grid| describe_surroundings(grid, at));
                return;
            }
        };
        self.world.with(|grid| grid.set_status(status));
    }
}
