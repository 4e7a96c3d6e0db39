//! Chunk result files.
//!
//! Each computed chunk is persisted as one NetCDF file named
//! `network_solution_{x}_{y}.nc` after its anchor, holding one `(y, x)`
//! variable per tracked output field plus the coordinate axes. Files are
//! written atomically: the data lands in a `.tmp` sibling first and is
//! renamed into place only when complete, so a crashed run never leaves a
//! half-written result behind.

use crate::data_error;
use meo_core::{ChunkAnchor, MeoError, MeoResult, PixelSolution, OUTPUT_VARS};
use ndarray::Array2;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// File name of the result for the chunk at `anchor`.
pub fn chunk_file_name(anchor: ChunkAnchor) -> String {
    format!("network_solution_{}.nc", anchor.label())
}

/// Rectangular block of per-pixel results, indexed by coordinate values.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkSolution {
    /// Longitude axis, ascending.
    pub x: Vec<f64>,
    /// Latitude axis, ascending.
    pub y: Vec<f64>,
    /// One `(y, x)` field per entry of [`OUTPUT_VARS`].
    vars: BTreeMap<String, Array2<f64>>,
}

impl ChunkSolution {
    /// Assemble a chunk from its per-pixel records.
    ///
    /// The records must tile the chunk's coordinate rectangle exactly:
    /// every `(x, y)` combination present once, sea sentinels included.
    /// Duplicates and gaps are rejected rather than papered over, since
    /// either means the chunk runner skipped or repeated a pixel.
    pub fn from_pixels(pixels: &[PixelSolution]) -> MeoResult<Self> {
        if pixels.is_empty() {
            return Err(MeoError::InvalidInput(
                "chunk holds no pixel results".into(),
            ));
        }

        let x = sorted_unique(pixels.iter().map(|p| p.x));
        let y = sorted_unique(pixels.iter().map(|p| p.y));
        if pixels.len() != x.len() * y.len() {
            return Err(MeoError::InvalidInput(format!(
                "{} pixel results do not tile a {}x{} coordinate rectangle",
                pixels.len(),
                x.len(),
                y.len()
            )));
        }

        let mut fields =
            vec![Array2::from_elem((y.len(), x.len()), f64::NAN); OUTPUT_VARS.len()];
        let mut seen = Array2::from_elem((y.len(), x.len()), false);

        for pixel in pixels {
            let ix = index_of(&x, pixel.x);
            let iy = index_of(&y, pixel.y);
            if seen[(iy, ix)] {
                return Err(MeoError::InvalidInput(format!(
                    "pixel ({}, {}) appears twice in one chunk",
                    pixel.x, pixel.y
                )));
            }
            seen[(iy, ix)] = true;
            for (field, var) in fields.iter_mut().zip(OUTPUT_VARS) {
                field[(iy, ix)] = pixel.value(var);
            }
        }

        let vars = OUTPUT_VARS
            .iter()
            .map(|&var| var.to_string())
            .zip(fields)
            .collect();
        Ok(Self { x, y, vars })
    }

    pub fn field(&self, var: &str) -> Option<&Array2<f64>> {
        self.vars.get(var)
    }

    /// All fields with their variable names, in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Array2<f64>)> {
        self.vars.iter().map(|(name, field)| (name.as_str(), field))
    }

    /// Write the chunk to `path`, atomically.
    pub fn write(&self, path: &Path) -> MeoResult<()> {
        let tmp = path.with_extension("nc.tmp");
        self.write_netcdf(&tmp)?;
        fs::rename(&tmp, path)?;
        debug!(path = %path.display(), "wrote chunk result");
        Ok(())
    }

    fn write_netcdf(&self, path: &Path) -> MeoResult<()> {
        let mut file = netcdf::create(path).map_err(|err| data_error(path, err))?;
        file.add_dimension("y", self.y.len())
            .map_err(|err| data_error(path, err))?;
        file.add_dimension("x", self.x.len())
            .map_err(|err| data_error(path, err))?;

        let mut xv = file
            .add_variable::<f64>("x", &["x"])
            .map_err(|err| data_error(path, err))?;
        xv.put_values(&self.x, ..).map_err(|err| data_error(path, err))?;
        let mut yv = file
            .add_variable::<f64>("y", &["y"])
            .map_err(|err| data_error(path, err))?;
        yv.put_values(&self.y, ..).map_err(|err| data_error(path, err))?;

        for (name, field) in &self.vars {
            let mut var = file
                .add_variable::<f64>(name, &["y", "x"])
                .map_err(|err| data_error(path, err))?;
            let flat: Vec<f64> = field.iter().copied().collect();
            var.put_values(&flat, ..).map_err(|err| data_error(path, err))?;
        }
        Ok(())
    }

    /// Read a previously written chunk file.
    pub fn read(path: &Path) -> MeoResult<Self> {
        let file = netcdf::open(path).map_err(|err| data_error(path, err))?;
        let x = axis(&file, path, "x")?;
        let y = axis(&file, path, "y")?;

        let mut vars = BTreeMap::new();
        for var_name in OUTPUT_VARS {
            let var = file
                .variable(var_name)
                .ok_or_else(|| data_error(path, format!("variable '{var_name}' not found")))?;
            let values: Vec<f64> = var
                .get_values((0..y.len(), 0..x.len()))
                .map_err(|err| data_error(path, err))?;
            let field = Array2::from_shape_vec((y.len(), x.len()), values)
                .map_err(|err| data_error(path, err))?;
            vars.insert(var_name.to_string(), field);
        }
        Ok(Self { x, y, vars })
    }
}

fn axis(file: &netcdf::File, path: &Path, name: &str) -> MeoResult<Vec<f64>> {
    let var = file
        .variable(name)
        .ok_or_else(|| data_error(path, format!("coordinate variable '{name}' not found")))?;
    var.get_values(..).map_err(|err| data_error(path, err))
}

fn sorted_unique(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut values: Vec<f64> = values.collect();
    values.sort_by(f64::total_cmp);
    values.dedup();
    values
}

fn index_of(axis: &[f64], value: f64) -> usize {
    axis.partition_point(|&c| c < value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn land_pixel(x: f64, y: f64, size_wind: f64) -> PixelSolution {
        let mut pixel = PixelSolution::empty(x, y);
        pixel.runtime = 0.1;
        pixel.runtime_solver = 0.05;
        pixel.size_wind = size_wind;
        pixel.size_solar_pv = 1.0;
        pixel
    }

    fn sample_chunk() -> ChunkSolution {
        ChunkSolution::from_pixels(&[
            land_pixel(10.0, 45.0, 1.0),
            land_pixel(10.25, 45.0, 2.0),
            PixelSolution::empty(10.0, 45.25),
            land_pixel(10.25, 45.25, 4.0),
        ])
        .unwrap()
    }

    #[test]
    fn pixels_assemble_into_coordinate_rectangle() {
        let chunk = sample_chunk();
        assert_eq!(chunk.x, vec![10.0, 10.25]);
        assert_eq!(chunk.y, vec![45.0, 45.25]);
        let wind = chunk.field("size_wind").unwrap();
        assert_eq!(wind[(0, 0)], 1.0);
        assert_eq!(wind[(0, 1)], 2.0);
        assert!(wind[(1, 0)].is_nan()); // sea sentinel
        assert_eq!(wind[(1, 1)], 4.0);
    }

    #[test]
    fn duplicate_pixel_is_rejected() {
        let result = ChunkSolution::from_pixels(&[
            land_pixel(10.0, 45.0, 1.0),
            land_pixel(10.0, 45.0, 2.0),
        ]);
        assert!(matches!(result, Err(MeoError::InvalidInput(_))));
    }

    #[test]
    fn gap_in_rectangle_is_rejected() {
        // three pixels spanning a 2x2 rectangle
        let result = ChunkSolution::from_pixels(&[
            land_pixel(10.0, 45.0, 1.0),
            land_pixel(10.25, 45.0, 2.0),
            land_pixel(10.0, 45.25, 3.0),
        ]);
        assert!(matches!(result, Err(MeoError::InvalidInput(_))));
    }

    #[test]
    fn empty_pixel_list_is_rejected() {
        assert!(matches!(
            ChunkSolution::from_pixels(&[]),
            Err(MeoError::InvalidInput(_))
        ));
    }

    #[test]
    fn write_then_read_preserves_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(chunk_file_name(ChunkAnchor::new(0, 0)));
        let chunk = sample_chunk();
        chunk.write(&path).unwrap();

        let restored = ChunkSolution::read(&path).unwrap();
        assert_eq!(restored.x, chunk.x);
        assert_eq!(restored.y, chunk.y);
        for var in OUTPUT_VARS {
            let a = chunk.field(var).unwrap();
            let b = restored.field(var).unwrap();
            for (left, right) in a.iter().zip(b.iter()) {
                assert!(left == right || (left.is_nan() && right.is_nan()));
            }
        }
    }

    #[test]
    fn write_leaves_no_temporary_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("network_solution_0_0.nc");
        sample_chunk().write(&path).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("nc.tmp").exists());
    }

    #[test]
    fn file_name_follows_anchor_label() {
        assert_eq!(
            chunk_file_name(ChunkAnchor::new(15, 5)),
            "network_solution_15_5.nc"
        );
    }
}
