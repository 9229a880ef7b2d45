use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::warn;

use crate::world::GridState;

static GATE_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_gate_poison_once(operation: &'static str) {
    if GATE_POISON_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn!(operation, "gate poisoned by a panicked holder; recovered inner value");
    }
}

pub type GateGuard<'a, T> = MutexGuard<'a, T>;

/// The world every actor shares.
pub type SharedWorld = Arc<Gate<GridState>>;

/// Single-holder exclusion around a value.
///
/// `enter` blocks until the caller is the only holder; access ends when the
/// returned guard is dropped, so every exit path releases it. Not re-entrant:
/// entering again while holding a guard on the same thread deadlocks.
#[derive(Debug, Default)]
pub struct Gate<T> {
    inner: Mutex<T>,
}

impl<T> Gate<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    pub fn enter(&self) -> GateGuard<'_, T> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn_gate_poison_once("enter");
                poisoned.into_inner()
            }
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.enter();
        f(&mut guard)
    }

    pub fn into_inner(self) -> T {
        match self.inner.into_inner() {
            Ok(value) => value,
            Err(poisoned) => {
                warn_gate_poison_once("into_inner");
                poisoned.into_inner()
            }
        }
    }
}

pub fn share_world(grid: GridState) -> SharedWorld {
    Arc::new(Gate::new(grid))
}
