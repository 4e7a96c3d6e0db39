//! The per-pixel optimization model.
//!
//! One pixel becomes one linear program: renewable generation feeds an
//! electricity pool, electrolysis and direct air capture turn electricity
//! into hydrogen and CO2, and methanol synthesis consumes both in a fixed
//! mass blend to meet a yearly production target. The LP is held in a
//! solver-neutral form and handed to one of several backends.

pub mod backend;
pub mod lp;
pub mod lp_file;
pub mod network;
pub mod optimize;

pub use backend::{backend_for, SolveOutcome, SolverBackend};
pub use lp::{LinearProgram, RowBound, VarId};
pub use network::{build_methanol_network, NetworkVariables};
pub use optimize::PixelOptimizer;
