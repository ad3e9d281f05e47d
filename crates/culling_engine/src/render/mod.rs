//! Draw-submission aggregation for the host renderer

mod batching;

pub use batching::{BatchAggregator, BatchKey, BatchStats, RenderBatch, RenderSubmission};
