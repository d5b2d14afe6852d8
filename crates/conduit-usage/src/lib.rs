//! Usage accounting
//!
//! Every completed or failed routing decision produces one [`UsageRecord`]
//! carrying the computed cost, token counts and latency. Records are
//! appended to a [`UsageStore`] either directly through [`UsageRecorder`]
//! or off the request path through [`BackgroundRecorder`].

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod error;
mod record;
mod recorder;
mod store;

pub use conduit_core::cost;
pub use error::UsageError;
pub use record::{Outcome, UsageRecord, UsageStatus};
pub use recorder::{BackgroundRecorder, UsageRecorder};
pub use store::{JsonlUsageStore, MemoryUsageStore, UsageStore};
