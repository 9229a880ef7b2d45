mod element;
mod grid;
mod map;

pub use element::{Color, Element};
pub use grid::{
    Bounds, FrameSnapshot, GridError, GridState, Position, SAFE_HEIGHT, SAFE_WIDTH,
};
pub use map::{load_map, MapError};
