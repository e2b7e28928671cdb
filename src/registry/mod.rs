//! Admission control: at most one live job per requester.

pub mod error;
pub mod registry;
pub mod state_machine;
pub mod types;

pub use error::{AdmissionError, StateError};
pub use registry::JobRegistry;
pub use state_machine::JobStateMachine;
pub use types::{JobEvent, JobHandle, JobState, RequesterKey};
