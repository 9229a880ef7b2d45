use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::{debug, info};

use crate::sync::SharedWorld;

use super::frame::{render_frame, Surface};

pub type PaintOp = Box<dyn FnOnce(&mut dyn Surface) + Send + 'static>;

enum RenderJob {
    Paint(PaintOp),
    Close,
}

#[derive(Debug, Default)]
struct RenderCounters {
    submitted: AtomicU64,
    dropped: AtomicU64,
    painted: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub submitted: u64,
    pub dropped: u64,
    pub painted: u64,
}

/// Producer handle for the render worker. Cheap to clone; every actor holds one.
#[derive(Clone)]
pub struct RenderQueue {
    sender: Sender<RenderJob>,
    closed: Arc<AtomicBool>,
    counters: Arc<RenderCounters>,
}

impl std::fmt::Debug for RenderQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderQueue")
            .field("closed", &self.is_closed())
            .field("stats", &self.stats())
            .finish()
    }
}

impl RenderQueue {
    /// Enqueues without blocking. Returns `false` when the request was dropped
    /// because the queue is full or already closed.
    pub fn submit(&self, op: PaintOp) -> bool {
        if self.is_closed() {
            return false;
        }
        match self.sender.try_send(RenderJob::Paint(op)) {
            Ok(()) => {
                self.counters.submitted.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Full(_)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                debug!("render_dropped_queue_full");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    pub fn request_frame(&self, world: &SharedWorld) -> bool {
        let world = Arc::clone(world);
        self.submit(Box::new(move |surface: &mut dyn Surface| {
            render_frame(&world, surface)
        }))
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> RenderStats {
        RenderStats {
            submitted: self.counters.submitted.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
            painted: self.counters.painted.load(Ordering::Relaxed),
        }
    }

    /// A queue nobody drains; submissions report failure. For tests that only
    /// care about the world, not the frames.
    #[cfg(test)]
    pub(crate) fn disconnected() -> Self {
        let (sender, _) = bounded(1);
        Self {
            sender,
            closed: Arc::new(AtomicBool::new(false)),
            counters: Arc::new(RenderCounters::default()),
        }
    }
}

/// The single consumer. Owns the surface for the whole session.
pub struct RenderWorker<S> {
    queue: RenderQueue,
    handle: JoinHandle<S>,
}

pub fn spawn_render_worker<S>(
    surface: S,
    capacity: usize,
) -> io::Result<(RenderQueue, RenderWorker<S>)>
where
    S: Surface + Send + 'static,
{
    let (sender, receiver) = bounded(capacity.max(1));
    let queue = RenderQueue {
        sender,
        closed: Arc::new(AtomicBool::new(false)),
        counters: Arc::new(RenderCounters::default()),
    };
    let counters = Arc::clone(&queue.counters);
    let handle = thread::Builder::new()
        .name("render".to_string())
        .spawn(move || drain(receiver, surface, &counters))?;

    Ok((
        queue.clone(),
        RenderWorker {
            queue,
            handle,
        },
    ))
}

fn drain<S: Surface>(receiver: Receiver<RenderJob>, mut surface: S, counters: &RenderCounters) -> S {
    for job in receiver.iter() {
        match job {
            RenderJob::Paint(op) => {
                op(&mut surface);
                counters.painted.fetch_add(1, Ordering::Relaxed);
            }
            RenderJob::Close => break,
        }
    }
    surface
}

impl<S> RenderWorker<S> {
    pub fn queue(&self) -> &RenderQueue {
        &self.queue
    }

    /// Refuses further submissions, lets the worker finish everything already
    /// queued, and hands the surface back for teardown. `None` if the worker panicked.
    pub fn close(self) -> Option<S> {
        self.queue.closed.store(true, Ordering::SeqCst);
        // Blocking send: the worker is draining, so room frees up.
        let _ = self.queue.sender.send(RenderJob::Close);
        let surface = self.handle.join().ok();
        let stats = self.queue.stats();
        info!(
            submitted = stats.submitted,
            dropped = stats.dropped,
            painted = stats.painted,
            "render_worker_stopped"
        );
        surface
    }
}
