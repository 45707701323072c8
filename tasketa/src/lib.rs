//! Remaining-time estimates for long-running search/indexing tasks, from a
//! pasted task-status response.

pub mod clock;
pub mod controller;
pub mod decode;
pub mod document;
pub mod error;
pub mod estimate;
pub mod extract;
pub mod normalize;
pub mod report;

pub use clock::{Clock, SystemClock};
pub use controller::{RefreshController, RunState, TickOutcome, prepare};
pub use decode::decode;
pub use document::{Document, ProgressInput, RawTask, RawTaskStatus};
pub use error::EtaError;
pub use estimate::{ProgressEstimate, estimate};
pub use extract::extract;
pub use normalize::normalize;
pub use report::{DisplayProgress, Report, ReportFormatter};
