//! Clone progress reporting

pub mod phase;
pub mod reporter;

pub use phase::{NoopListener, Operation, PhaseCode, ProgressListener};
pub use reporter::{PhaseTask, ProgressReporter};
