use std::time::Duration;

use crossbeam_channel::{select, tick};
use tracing::debug;

use crate::config::SimConfig;
use crate::world::{Element, GridState, Position};

use super::ActorContext;

/// Walks back and forth along one row, turning around at anything in the way.
#[derive(Debug, Clone)]
pub struct Patroller {
    position: Position,
    direction: i32,
    tick: Duration,
}

impl Patroller {
    pub fn new(start: Position, tick: Duration) -> Self {
        Self {
            position: start,
            direction: 1,
            tick,
        }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(
            config.patroller_start,
            Duration::from_millis(config.patroller_tick_ms),
        )
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn direction(&self) -> i32 {
        self.direction
    }

    /// Claims the start cell: adopts an enemy glyph already there or places one.
    pub fn enter_world(&self, grid: &mut GridState) {
        if !grid.holds(self.position, Element::ENEMY) {
            grid.place_if_vacant(self.position, Element::ENEMY);
        }
    }

    /// One tick. Returns whether the patroller moved.
    pub fn step(&mut self, grid: &mut GridState) -> bool {
        if !grid.in_bounds(self.position) {
            return false;
        }

        let next = self.position.offset(self.direction, 0);
        if grid.is_vacant(next) && grid.avatar() != next {
            grid.clear_if(self.position, Element::ENEMY);
            grid.set_cell(next, Element::ENEMY);
            self.position = next;
            true
        } else {
            self.direction = -self.direction;
            false
        }
    }

    pub fn run(mut self, ctx: ActorContext) {
        ctx.world.with(|grid| self.enter_world(grid));
        ctx.request_render();

        let ticker = tick(self.tick);
        loop {
            select! {
                recv(ctx.shutdown.receiver()) -> _ => break,
                recv(ticker) -> _ => {
                    let moved = ctx.world.with(|grid| self.step(grid));
                    if moved {
                        debug!(x = self.position.x, y = self.position.y, "patroller_moved");
                        ctx.request_render();
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor() -> GridState {
        GridState::from_map_text("▤▤▤▤▤▤\n▤    ▤\n▤P   ▤\n▤▤▤▤▤▤").expect("map")
    }

    #[test]
    fn walks_until_blocked_then_turns_around() {
        let mut grid = corridor();
        let mut patroller = Patroller::new(Position::new(1, 1), Duration::from_millis(10));
        patroller.enter_world(&mut grid);

        assert!(patroller.step(&mut grid));
        assert!(patroller.step(&mut grid));
        assert!(patroller.step(&mut grid));
        assert_eq!(patroller.position(), Position::new(4, 1));

        assert!(!patroller.step(&mut grid));
        assert_eq!(patroller.direction(), -1);
        assert!(patroller.step(&mut grid));
        assert_eq!(patroller.position(), Position::new(3, 1));
        assert!(grid.holds(Position::new(3, 1), Element::ENEMY));
        assert!(grid.is_vacant(Position::new(4, 1)));
    }

    #[test]
    fn never_walks_onto_the_avatar() {
        let mut grid = corridor();
        grid.set_avatar(Position::new(2, 1));
        let mut patroller = Patroller::new(Position::new(1, 1), Duration::from_millis(10));
        patroller.enter_world(&mut grid);

        assert!(!patroller.step(&mut grid));
        assert_eq!(patroller.position(), Position::new(1, 1));
    }

    #[test]
    fn start_on_the_avatar_keeps_the_cell_walkable() {
        let mut grid = corridor();
        let avatar = grid.avatar();
        let mut patroller = Patroller::new(avatar, Duration::from_millis(10));
        patroller.enter_world(&mut grid);

        assert!(grid.can_enter(avatar));
        assert!(patroller.step(&mut grid));
        assert!(grid.holds(avatar.offset(1, 0), Element::ENEMY));
        assert!(grid.can_enter(avatar));
    }

    #[test]
    fn leaves_foreign_glyph_on_its_old_cell() {
        let mut grid = corridor();
        let mut patroller = Patroller::new(Position::new(1, 1), Duration::from_millis(10));
        // Something else took the start cell before the first step.
        grid.set_cell(Position::new(1, 1), Element::GHOST);

        assert!(patroller.step(&mut grid));
        assert!(grid.holds(Position::new(1, 1), Element::GHOST));
        assert!(grid.holds(Position::new(2, 1), Element::ENEMY));
    }

    #[test]
    fn out_of_bounds_start_is_inert() {
        let mut grid = corridor();
        let mut patroller = Patroller::new(Position::new(40, 40), Duration::from_millis(10));
        patroller.enter_world(&mut grid);
        assert!(!patroller.step(&mut grid));
        assert_eq!(patroller.position(), Position::new(40, 40));
    }
}
