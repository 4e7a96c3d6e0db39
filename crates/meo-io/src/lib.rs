//! NetCDF input and output plumbing for the meo pipeline.
//!
//! Reads per-technology renewable generation time series (slicing only the
//! requested spatial sub-range), the ERA5 land/sea mask, and chunk result
//! files; writes coordinate-indexed chunk results atomically and merges
//! them into the final dataset.

pub mod concat;
pub mod mask;
pub mod results;
pub mod timeseries;

pub use concat::{concat_chunks, ConcatSummary};
pub use mask::LandSeaMask;
pub use results::{chunk_file_name, ChunkSolution};
pub use timeseries::{load_input_flow, InputFlow};

use meo_core::MeoError;

/// Map a netcdf library error on `path` to the pipeline taxonomy.
pub(crate) fn data_error(path: &std::path::Path, err: impl std::fmt::Display) -> MeoError {
    MeoError::DataUnavailable(format!("{}: {err}", path.display()))
}
