use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Element;

/// Widest column an actor may touch; matches the 80-column screen minus the last cell.
pub const SAFE_WIDTH: i32 = 79;
/// Tallest row an actor may touch; matches the 30-row screen minus the last row.
pub const SAFE_HEIGHT: i32 = 29;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0
            && pos.y >= 0
            && pos.x < self.width
            && pos.y < self.height
            && pos.x < SAFE_WIDTH
            && pos.y < SAFE_HEIGHT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("cell count mismatch: expected {expected}, got {actual}")]
    CellCountMismatch { expected: usize, actual: usize },
    #[error("grid must be at least 1x1, got {width}x{height}")]
    Degenerate { width: i32, height: i32 },
    #[error("avatar start ({x}, {y}) is outside the grid or on a blocking cell")]
    InvalidAvatarStart { x: i32, y: i32 },
}

/// The shared world. Only ever touched through a [`crate::Gate`].
///
/// Cells are row-major; `(x, y)` is column `x` of row `y`.
#[derive(Debug, Clone, PartialEq)]
pub struct GridState {
    width: i32,
    height: i32,
    cells: Vec<Element>,
    avatar: Position,
    status: String,
}

/// Point-in-time copy of a [`GridState`] taken for drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    pub width: i32,
    pub height: i32,
    pub cells: Vec<Element>,
    pub avatar: Position,
    pub status: String,
}

impl FrameSnapshot {
    pub fn cell(&self, x: i32, y: i32) -> Option<Element> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get((y * self.width + x) as usize).copied()
    }
}

impl GridState {
    pub fn new(
        width: i32,
        height: i32,
        cells: Vec<Element>,
        avatar: Position,
    ) -> Result<Self, GridError> {
        if width <= 0 || height <= 0 {
            return Err(GridError::Degenerate { width, height });
        }
        let expected = width as usize * height as usize;
        let actual = cells.len();
        if expected != actual {
            return Err(GridError::CellCountMismatch { expected, actual });
        }
        let grid = Self {
            width,
            height,
            cells,
            avatar,
            status: String::new(),
        };
        if !grid.can_enter(avatar) {
            return Err(GridError::InvalidAvatarStart {
                x: avatar.x,
                y: avatar.y,
            });
        }
        Ok(grid)
    }

    /// All-empty grid with the avatar at `avatar`.
    pub fn empty(width: i32, height: i32, avatar: Position) -> Result<Self, GridError> {
        let len = width.max(0) as usize * height.max(0) as usize;
        Self::new(width, height, vec![Element::EMPTY; len], avatar)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn bounds(&self) -> Bounds {
        Bounds {
            width: self.width,
            height: self.height,
        }
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        self.bounds().contains(pos)
    }

    fn index_of(&self, pos: Position) -> Option<usize> {
        if !self.in_bounds(pos) {
            return None;
        }
        Some(pos.y as usize * self.width as usize + pos.x as usize)
    }

    pub fn cell(&self, pos: Position) -> Option<Element> {
        self.index_of(pos)
            .and_then(|index| self.cells.get(index).copied())
    }

    /// Writes `element` at `pos`. Out-of-bounds writes are dropped and return `false`.
    pub fn set_cell(&mut self, pos: Position, element: Element) -> bool {
        match self.index_of(pos) {
            Some(index) => {
                self.cells[index] = element;
                true
            }
            None => false,
        }
    }

    /// Empties `pos` only if it still holds `element`. Returns whether it did.
    pub fn clear_if(&mut self, pos: Position, element: Element) -> bool {
        match self.index_of(pos) {
            Some(index) if self.cells[index].is(element) => {
                self.cells[index] = Element::EMPTY;
                true
            }
            _ => false,
        }
    }

    /// Places `element` at `pos` only if the cell is vacant. A blocking element
    /// is never placed under the avatar.
    pub fn place_if_vacant(&mut self, pos: Position, element: Element) -> bool {
        if !self.is_vacant(pos) || (element.blocking && pos == self.avatar) {
            return false;
        }
        self.set_cell(pos, element)
    }

    pub fn holds(&self, pos: Position, element: Element) -> bool {
        self.cell(pos).is_some_and(|cell| cell.is(element))
    }

    /// In bounds and empty; where entity glyphs may be placed.
    pub fn is_vacant(&self, pos: Position) -> bool {
        self.cell(pos).is_some_and(|cell| cell.is_empty())
    }

    /// In bounds and not blocking; where the avatar may stand.
    pub fn can_enter(&self, pos: Position) -> bool {
        self.cell(pos).is_some_and(|cell| !cell.blocking)
    }

    pub fn avatar(&self) -> Position {
        self.avatar
    }

    /// Moves the avatar. Refuses targets the avatar could not stand on.
    pub fn set_avatar(&mut self, pos: Position) -> bool {
        if !self.can_enter(pos) {
            return false;
        }
        self.avatar = pos;
        true
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn clear_status(&mut self) {
        self.status.clear();
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            width: self.width,
            height: self.height,
            cells: self.cells.clone(),
            avatar: self.avatar,
            status: self.status.clone(),
        }
    }
}
