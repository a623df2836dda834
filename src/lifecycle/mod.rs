//! Connection lifecycle: startup reconnection and runtime event handling.

mod attempt;
mod bootstrap;
mod controller;

pub use attempt::{run_attempt, spawn_attempt, AttemptOutcome, AttemptPath, RevocationPolicy};
pub use bootstrap::{BootstrapHandle, BootstrapReport, Bootstrapper};
pub use controller::{EventOutcome, LifecycleController};
