//! Public entry point: submit and cancel download jobs.

pub mod manager;
mod slot;

pub use manager::JobManager;
