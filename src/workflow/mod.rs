//! Batch orchestration

pub mod batch;

pub use batch::BatchEvaluator;
