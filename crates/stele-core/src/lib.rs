#![deny(clippy::all, warnings)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]

pub mod diagnostics;
pub mod engine;
pub mod outcome;

pub use engine::{
    DoctorSummary, NoopObjectStates, ObjectStateHandler, Repository, Resolved, StorageError,
    ROOT_NODE_ID,
};
pub use outcome::{CommandStatus, ExecutionOutcome};
pub use stele_domain as domain;
