// Data pipeline: ingestion, processing, and storage

pub mod ingestion;
pub mod orchestrator;
pub mod processing;
pub mod storage;

// Re-export key types and functions from each stage
pub use orchestrator::{merge, LoadedSources, Merged, Pipeline, RunSummary};
