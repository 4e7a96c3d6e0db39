//! Core types for the meo pipeline: chunk grid arithmetic, run
//! configuration, model parameters, solver selection, and the shared
//! error taxonomy.
//!
//! Everything here is plain data passed explicitly into the chunk runner,
//! optimizer, and dispatcher. There is no ambient global configuration.

pub mod config;
pub mod error;
pub mod grid;
pub mod params;
pub mod pixel;
pub mod solver;

pub use config::RunConfig;
pub use error::{ExitCode, MeoError, MeoResult};
pub use grid::{ChunkAnchor, ChunkGrid};
pub use params::{ModelParameters, StorageParams};
pub use pixel::{PixelSolution, Technology, OUTPUT_VARS};
pub use solver::{ParamValue, SolverKind, SolverParams};
