mod frame;
mod queue;

pub use frame::{
    draw_frame, render_frame, Surface, INSTRUCTIONS, SCREEN_HEIGHT, SCREEN_WIDTH,
    STATUS_MAX_CHARS,
};
pub use queue::{spawn_render_worker, PaintOp, RenderQueue, RenderStats, RenderWorker};

#[cfg(test)]
pub(crate) use frame::testing;
