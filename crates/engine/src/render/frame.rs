use std::io;

use tracing::warn;

use crate::sync::Gate;
use crate::world::{Color, Element, FrameSnapshot, GridState};

pub const SCREEN_WIDTH: i32 = 80;
pub const SCREEN_HEIGHT: i32 = 30;
pub const STATUS_MAX_CHARS: usize = 78;
pub const STATUS_TEXT_COLOR: Color = Color::DarkGray;
pub const INSTRUCTIONS: &str = "Use WASD to move and E to interact. ESC to quit.";

/// Low-level drawing primitives. Only the render worker's thread calls these.
pub trait Surface {
    fn clear(&mut self);
    fn set_cell(&mut self, x: u16, y: u16, glyph: char, fg: Color, bg: Color);
    fn flush(&mut self) -> io::Result<()>;
}

fn on_screen(x: i32, y: i32) -> bool {
    x >= 0 && y >= 0 && x < SCREEN_WIDTH && y < SCREEN_HEIGHT
}

fn put(surface: &mut dyn Surface, x: i32, y: i32, glyph: char, fg: Color, bg: Color) {
    if on_screen(x, y) {
        surface.set_cell(x as u16, y as u16, glyph, fg, bg);
    }
}

fn put_text(surface: &mut dyn Surface, row: i32, text: &str) {
    for (column, glyph) in text.chars().take(STATUS_MAX_CHARS).enumerate() {
        put(
            surface,
            column as i32,
            row,
            glyph,
            STATUS_TEXT_COLOR,
            Color::Default,
        );
    }
}

/// Draws one full frame from a detached copy of the world.
pub fn draw_frame(snapshot: &FrameSnapshot, surface: &mut dyn Surface) -> io::Result<()> {
    surface.clear();

    for y in 0..snapshot.height.min(SCREEN_HEIGHT) {
        for x in 0..snapshot.width.min(SCREEN_WIDTH) {
            if let Some(element) = snapshot.cell(x, y) {
                put(surface, x, y, element.glyph, element.fg, element.bg);
            }
        }
    }

    let avatar = snapshot.avatar;
    put(
        surface,
        avatar.x,
        avatar.y,
        Element::AVATAR.glyph,
        Element::AVATAR.fg,
        Element::AVATAR.bg,
    );

    put_text(surface, snapshot.height + 1, &snapshot.status);
    put_text(surface, snapshot.height + 3, INSTRUCTIONS);

    surface.flush()
}

/// Copies the world under the gate, then draws without holding it.
pub fn render_frame(world: &Gate<GridState>, surface: &mut dyn Surface) {
    let snapshot = world.enter().snapshot();
    if let Err(error) = draw_frame(&snapshot, surface) {
        warn!(error = %error, "frame_flush_failed");
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum SurfaceCall {
        Clear,
        Cell { x: u16, y: u16, glyph: char },
        Flush,
    }

    #[derive(Debug, Default)]
    pub(crate) struct RecordingSurface {
        pub(crate) calls: Vec<SurfaceCall>,
    }

    impl RecordingSurface {
        /// Calls from the last `clear` onward.
        pub(crate) fn last_frame(&self) -> RecordingSurface {
            let start = self
                .calls
                .iter()
                .rposition(|call| *call == SurfaceCall::Clear)
                .unwrap_or(0);
            RecordingSurface {
                calls: self.calls[start..].to_vec(),
            }
        }

        pub(crate) fn glyph_at(&self, x: u16, y: u16) -> Option<char> {
            self.calls.iter().rev().find_map(|call| match call {
                SurfaceCall::Cell {
                    x: cx,
                    y: cy,
                    glyph,
                } if *cx == x && *cy == y => Some(*glyph),
                _ => None,
            })
        }

        pub(crate) fn row_text(&self, y: u16) -> String {
            let mut cells = self
                .calls
                .iter()
                .filter_map(|call| match call {
                    SurfaceCall::Cell { x, y: cy, glyph } if *cy == y => Some((*x, *glyph)),
                    _ => None,
                })
                .collect::<Vec<_>>();
            cells.sort_by_key(|(x, _)| *x);
            cells.into_iter().map(|(_, glyph)| glyph).collect()
        }
    }

    impl Surface for RecordingSurface {
        fn clear(&mut self) {
            self.calls.push(SurfaceCall::Clear);
        }

        fn set_cell(&mut self, x: u16, y: u16, glyph: char, _fg: Color, _bg: Color) {
            self.calls.push(SurfaceCall::Cell { x, y, glyph });
        }

        fn flush(&mut self) -> io::Result<()> {
            self.calls.push(SurfaceCall::Flush);
            Ok(())
        }
    }
}
