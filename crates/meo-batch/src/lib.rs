//! Chunk execution and dispatch.
//!
//! A chunk run loads the input slices, solves every pixel in the chunk,
//! and writes one result file; the dispatcher fans chunks out over worker
//! processes (or cluster jobs) and tears the batch down on the first
//! failure.

pub mod dispatch;
pub mod manifest;
pub mod runner;

pub use dispatch::{dispatch_local, dispatch_slurm};
pub use manifest::ChunkRunRecord;
pub use runner::ChunkRunner;
