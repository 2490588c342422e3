//! `dripfeed-scheduler`: Tokio-based trigger loop for the periodic sync and
//! the daily publish.
//!
//! # Overview
//!
//! Jobs live in memory; they are rebuilt from configuration at every start.
//! The [`engine::SchedulerEngine`] checks the table every second and forwards
//! each job whose `next_run` has arrived on an mpsc channel. It does not run
//! the work itself: the receiver decides what a [`JobAction`] means.
//!
//! # Schedule variants
//!
//! | Variant    | Behaviour                   |
//! |------------|-----------------------------|
//! | `Interval` | Repeat every N seconds      |
//! | `Daily`    | Fire at HH:MM UTC every day |

pub mod engine;
pub mod error;
pub mod schedule;
pub mod types;

pub use engine::{SchedulerEngine, SchedulerHandle};
pub use error::{Result, SchedulerError};
pub use schedule::compute_next_run;
pub use types::{Job, JobAction, JobStatus, Schedule};
