//! Domain model for the lakeflow job service.
//!
//! This crate has zero internal dependencies so it can be used by the
//! scheduler, the execution engine, and the API layer alike: job
//! descriptors and their validation rules, the job lifecycle state
//! machine, the error taxonomy, and the executor seam between the
//! scheduler's worker pool and the execution engine.

pub mod error;
pub mod execute;
pub mod job;
pub mod record;
pub mod status;
pub mod types;
