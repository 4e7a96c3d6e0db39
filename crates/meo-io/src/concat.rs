//! Merge chunk result files into the final dataset.

use crate::data_error;
use crate::results::ChunkSolution;
use meo_core::{MeoError, MeoResult, OUTPUT_VARS};
use ndarray::Array2;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// What a concatenation pass produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcatSummary {
    pub chunks_merged: usize,
    pub n_x: usize,
    pub n_y: usize,
}

/// Merge every chunk file under `solution_dir` into one dataset at
/// `output`.
///
/// The merged coordinate axes are the sorted union of all chunk axes;
/// cells no chunk covers stay NaN. Stray `.tmp` files from interrupted
/// runs are ignored. Fails when the directory holds no completed chunk
/// at all.
pub fn concat_chunks(solution_dir: &Path, output: &Path) -> MeoResult<ConcatSummary> {
    let mut paths = chunk_paths(solution_dir)?;
    paths.sort();
    if paths.is_empty() {
        return Err(MeoError::DataUnavailable(format!(
            "no chunk result files under '{}'",
            solution_dir.display()
        )));
    }

    let chunks: Vec<ChunkSolution> = paths
        .iter()
        .map(|path| ChunkSolution::read(path))
        .collect::<MeoResult<_>>()?;

    let x = merged_axis(chunks.iter().map(|c| c.x.as_slice()));
    let y = merged_axis(chunks.iter().map(|c| c.y.as_slice()));

    let mut vars: BTreeMap<String, Array2<f64>> = OUTPUT_VARS
        .iter()
        .map(|&var| (var.to_string(), Array2::from_elem((y.len(), x.len()), f64::NAN)))
        .collect();

    for chunk in &chunks {
        let ix_map: Vec<usize> = chunk.x.iter().map(|&c| axis_index(&x, c)).collect();
        let iy_map: Vec<usize> = chunk.y.iter().map(|&c| axis_index(&y, c)).collect();
        for (name, field) in chunk.fields() {
            let Some(target) = vars.get_mut(name) else {
                continue;
            };
            for (local_iy, &iy) in iy_map.iter().enumerate() {
                for (local_ix, &ix) in ix_map.iter().enumerate() {
                    target[(iy, ix)] = field[(local_iy, local_ix)];
                }
            }
        }
    }

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    write_merged(output, &x, &y, &vars)?;

    let summary = ConcatSummary {
        chunks_merged: chunks.len(),
        n_x: x.len(),
        n_y: y.len(),
    };
    info!(
        chunks = summary.chunks_merged,
        n_x = summary.n_x,
        n_y = summary.n_y,
        output = %output.display(),
        "concatenated chunk results"
    );
    Ok(summary)
}

/// Completed chunk files in `dir`: `.nc` entries, skipping `.tmp`
/// leftovers.
fn chunk_paths(dir: &Path) -> MeoResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|err| {
        MeoError::DataUnavailable(format!("cannot list '{}': {err}", dir.display()))
    })?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("nc") {
            paths.push(path);
        }
    }
    Ok(paths)
}

fn merged_axis<'a>(axes: impl Iterator<Item = &'a [f64]>) -> Vec<f64> {
    let mut merged: Vec<f64> = axes.flatten().copied().collect();
    merged.sort_by(f64::total_cmp);
    merged.dedup();
    merged
}

fn axis_index(axis: &[f64], value: f64) -> usize {
    axis.partition_point(|&c| c < value)
}

fn write_merged(
    path: &Path,
    x: &[f64],
    y: &[f64],
    vars: &BTreeMap<String, Array2<f64>>,
) -> MeoResult<()> {
    let tmp = path.with_extension("nc.tmp");
    {
        let mut file = netcdf::create(&tmp).map_err(|err| data_error(&tmp, err))?;
        file.add_dimension("y", y.len())
            .map_err(|err| data_error(&tmp, err))?;
        file.add_dimension("x", x.len())
            .map_err(|err| data_error(&tmp, err))?;

        let mut xv = file
            .add_variable::<f64>("x", &["x"])
            .map_err(|err| data_error(&tmp, err))?;
        xv.put_values(x, ..).map_err(|err| data_error(&tmp, err))?;
        let mut yv = file
            .add_variable::<f64>("y", &["y"])
            .map_err(|err| data_error(&tmp, err))?;
        yv.put_values(y, ..).map_err(|err| data_error(&tmp, err))?;

        for (name, field) in vars {
            let mut var = file
                .add_variable::<f64>(name, &["y", "x"])
                .map_err(|err| data_error(&tmp, err))?;
            let flat: Vec<f64> = field.iter().copied().collect();
            var.put_values(&flat, ..).map_err(|err| data_error(&tmp, err))?;
        }
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::chunk_file_name;
    use meo_core::{ChunkAnchor, PixelSolution};

    fn chunk_of(coords: &[(f64, f64)], size_wind: f64) -> ChunkSolution {
        let pixels: Vec<PixelSolution> = coords
            .iter()
            .map(|&(x, y)| {
                let mut pixel = PixelSolution::empty(x, y);
                pixel.size_wind = size_wind;
                pixel.runtime = 0.1;
                pixel
            })
            .collect();
        ChunkSolution::from_pixels(&pixels).unwrap()
    }

    #[test]
    fn adjacent_chunks_merge_into_one_grid() {
        let dir = tempfile::tempdir().unwrap();
        chunk_of(&[(10.0, 45.0), (10.25, 45.0)], 1.0)
            .write(&dir.path().join(chunk_file_name(ChunkAnchor::new(0, 0))))
            .unwrap();
        chunk_of(&[(10.5, 45.0), (10.75, 45.0)], 2.0)
            .write(&dir.path().join(chunk_file_name(ChunkAnchor::new(2, 0))))
            .unwrap();

        let output = dir.path().join("out").join("network_solution.nc");
        let summary = concat_chunks(dir.path(), &output).unwrap();
        assert_eq!(summary.chunks_merged, 2);
        assert_eq!(summary.n_x, 4);
        assert_eq!(summary.n_y, 1);

        let merged = ChunkSolution::read(&output).unwrap();
        assert_eq!(merged.x, vec![10.0, 10.25, 10.5, 10.75]);
        let wind = merged.field("size_wind").unwrap();
        assert_eq!(wind[(0, 0)], 1.0);
        assert_eq!(wind[(0, 3)], 2.0);
    }

    #[test]
    fn uncovered_cells_stay_nan() {
        let dir = tempfile::tempdir().unwrap();
        // two diagonal chunks leave the off-diagonal corners empty
        chunk_of(&[(10.0, 45.0)], 1.0)
            .write(&dir.path().join(chunk_file_name(ChunkAnchor::new(0, 0))))
            .unwrap();
        chunk_of(&[(10.25, 45.25)], 2.0)
            .write(&dir.path().join(chunk_file_name(ChunkAnchor::new(1, 1))))
            .unwrap();

        let out_dir = dir.path().join("merged");
        fs::create_dir_all(&out_dir).unwrap();
        let output = out_dir.join("network_solution.nc");
        concat_chunks(dir.path(), &output).unwrap();

        let merged = ChunkSolution::read(&output).unwrap();
        let wind = merged.field("size_wind").unwrap();
        assert_eq!(wind[(0, 0)], 1.0);
        assert_eq!(wind[(1, 1)], 2.0);
        assert!(wind[(0, 1)].is_nan());
        assert!(wind[(1, 0)].is_nan());
    }

    #[test]
    fn temporary_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        chunk_of(&[(10.0, 45.0)], 1.0)
            .write(&dir.path().join(chunk_file_name(ChunkAnchor::new(0, 0))))
            .unwrap();
        fs::write(dir.path().join("network_solution_5_0.nc.tmp"), b"junk").unwrap();

        let out_dir = dir.path().join("merged");
        fs::create_dir_all(&out_dir).unwrap();
        let summary = concat_chunks(dir.path(), &out_dir.join("network_solution.nc")).unwrap();
        assert_eq!(summary.chunks_merged, 1);
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = concat_chunks(dir.path(), &dir.path().join("out.nc"));
        assert!(matches!(result, Err(MeoError::DataUnavailable(_))));
    }
}
