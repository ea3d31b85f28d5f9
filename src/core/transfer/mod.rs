//! Collect, normalize, batch and flush
//!
//! - [`batch`] - Fixed-size batch accumulation
//! - [`policy`] - Write policy: insert, set or append per batch
//! - [`pipeline`] - Run orchestration and state machine
//! - [`summary`] - Final counters and elapsed time
//! - [`events`] - Progress notifications

pub mod batch;
pub mod events;
pub mod pipeline;
pub mod policy;
pub mod summary;

pub use batch::{Batch, BatchAccumulator};
pub use events::{EventReceiver, EventSink, TransferEvent};
pub use pipeline::{PipelineState, RunState, TransferPipeline};
pub use policy::{MergeMode, WriteAction, WritePolicy};
pub use summary::{format_elapsed, ElapsedParts, RunSummary};
