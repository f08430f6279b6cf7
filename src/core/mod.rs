//! Services orchestrating cycle mutations and financial reconciliation.

pub mod gate;
pub mod services;
pub mod time;

pub use gate::{AllowAll, CycleAction, MutationGate, ReadOnly};
pub use time::{Clock, FixedClock, SystemClock};
