//! Job queue, status tracking, and the worker pool.
//!
//! Submissions land in a FIFO queue; a table lock map serializes writers to
//! the same table while letting distinct tables run concurrently; a bounded
//! pool of worker tasks pulls ready jobs and drives them to a terminal
//! state through the executor seam.

pub mod queue;
pub mod tracker;
pub mod worker;

pub use queue::{Scheduler, SubmitJob};
pub use tracker::StatusTracker;
pub use worker::WorkerPool;
