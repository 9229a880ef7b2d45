mod gate;
mod mailbox;
mod shutdown;

pub use gate::{share_world, Gate, GateGuard, SharedWorld};
pub use mailbox::{inbox, offer};
pub use shutdown::{ShutdownSignal, ShutdownToken};
