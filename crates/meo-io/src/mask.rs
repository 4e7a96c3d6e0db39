//! Land/sea classification from the ERA5 `lsm` mask.

use crate::data_error;
use meo_core::{MeoError, MeoResult};
use ndarray::Array2;
use std::path::Path;

/// Static land/sea mask, loaded once per chunk run and read-only
/// afterwards. A mask value of `0.0` is sea; any other defined value is
/// land.
#[derive(Debug, Clone)]
pub struct LandSeaMask {
    lon: Vec<f64>,
    lat: Vec<f64>,
    /// Shape `(latitude, longitude)`.
    values: Array2<f64>,
}

impl LandSeaMask {
    /// Load the `lsm` variable. ERA5 files carry either
    /// `(latitude, longitude)` or `(time, latitude, longitude)` with a
    /// singleton time dimension; both layouts are accepted.
    pub fn load(path: &Path) -> MeoResult<Self> {
        let file = netcdf::open(path).map_err(|err| data_error(path, err))?;
        let var = file
            .variable("lsm")
            .ok_or_else(|| data_error(path, "variable 'lsm' not found"))?;

        let dim_names: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
        let (n_lat, n_lon, values): (usize, usize, Vec<f64>) = match dim_names
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .as_slice()
        {
            ["latitude", "longitude"] => {
                let n_lat = var.dimensions()[0].len();
                let n_lon = var.dimensions()[1].len();
                let values = var.get_values(..).map_err(|err| data_error(path, err))?;
                (n_lat, n_lon, values)
            }
            ["time", "latitude", "longitude"] => {
                let n_lat = var.dimensions()[1].len();
                let n_lon = var.dimensions()[2].len();
                let values = var
                    .get_values((0..1, 0..n_lat, 0..n_lon))
                    .map_err(|err| data_error(path, err))?;
                (n_lat, n_lon, values)
            }
            other => {
                return Err(data_error(
                    path,
                    format!("variable 'lsm' has unsupported dimensions {other:?}"),
                ))
            }
        };

        let lon = coordinate(&file, path, "longitude", n_lon)?;
        let lat = coordinate(&file, path, "latitude", n_lat)?;
        let values = Array2::from_shape_vec((n_lat, n_lon), values)
            .map_err(|err| data_error(path, err))?;

        Ok(Self { lon, lat, values })
    }

    /// Whether the nearest mask cell to `(lon, lat)` is land.
    ///
    /// Fails with a lookup error when the coordinate lies outside the
    /// mask's covered extent (beyond half a grid spacing past the edge).
    pub fn is_land(&self, lon: f64, lat: f64) -> MeoResult<bool> {
        let ilon = nearest(&self.lon, lon).ok_or(MeoError::MaskLookup { lon, lat })?;
        let ilat = nearest(&self.lat, lat).ok_or(MeoError::MaskLookup { lon, lat })?;
        Ok(self.values[(ilat, ilon)] != 0.0)
    }

    #[cfg(test)]
    pub(crate) fn from_parts(lon: Vec<f64>, lat: Vec<f64>, values: Array2<f64>) -> Self {
        Self { lon, lat, values }
    }
}

fn coordinate(
    file: &netcdf::File,
    path: &Path,
    name: &str,
    len: usize,
) -> MeoResult<Vec<f64>> {
    let var = file
        .variable(name)
        .ok_or_else(|| data_error(path, format!("coordinate variable '{name}' not found")))?;
    let values: Vec<f64> = var.get_values(0..len).map_err(|err| data_error(path, err))?;
    Ok(values)
}

/// Index of the coordinate nearest to `target`, or `None` when `target`
/// falls outside the covered extent. Works for ascending or descending
/// coordinate axes (ERA5 latitudes descend).
fn nearest(coords: &[f64], target: f64) -> Option<usize> {
    if coords.is_empty() {
        return None;
    }
    let (best, distance) = coords
        .iter()
        .enumerate()
        .map(|(i, &c)| (i, (c - target).abs()))
        .min_by(|a, b| a.1.total_cmp(&b.1))?;

    // Allow half a grid spacing past the edge; anything farther is outside
    // the mask's coverage.
    let spacing = if coords.len() > 1 {
        (coords[1] - coords[0]).abs()
    } else {
        f64::INFINITY
    };
    if distance > spacing / 2.0 + 1e-9 {
        return None;
    }
    Some(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample_mask() -> LandSeaMask {
        // latitudes descending like ERA5
        LandSeaMask::from_parts(
            vec![10.0, 10.25, 10.5],
            vec![45.5, 45.25, 45.0],
            array![[0.0, 1.0, 0.5], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]],
        )
    }

    #[test]
    fn zero_is_sea_everything_else_is_land() {
        let mask = sample_mask();
        assert!(!mask.is_land(10.0, 45.5).unwrap());
        assert!(mask.is_land(10.25, 45.5).unwrap());
        assert!(mask.is_land(10.5, 45.5).unwrap()); // fractional cover counts as land
        assert!(mask.is_land(10.0, 45.0).unwrap());
    }

    #[test]
    fn lookup_snaps_to_nearest_cell() {
        let mask = sample_mask();
        // 10.3 is nearest to 10.25; 45.4 nearest to 45.5
        assert!(mask.is_land(10.3, 45.4).unwrap());
    }

    #[test]
    fn outside_extent_is_lookup_error() {
        let mask = sample_mask();
        assert!(matches!(
            mask.is_land(12.0, 45.25),
            Err(MeoError::MaskLookup { .. })
        ));
        assert!(matches!(
            mask.is_land(10.25, 40.0),
            Err(MeoError::MaskLookup { .. })
        ));
    }

    #[test]
    fn load_reads_era5_layout_with_time_dimension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("land_sea_mask.nc");
        {
            let mut file = netcdf::create(&path).unwrap();
            file.add_dimension("time", 1).unwrap();
            file.add_dimension("latitude", 2).unwrap();
            file.add_dimension("longitude", 2).unwrap();
            let mut lon = file.add_variable::<f64>("longitude", &["longitude"]).unwrap();
            lon.put_values(&[10.0, 10.25], ..).unwrap();
            let mut lat = file.add_variable::<f64>("latitude", &["latitude"]).unwrap();
            lat.put_values(&[45.25, 45.0], ..).unwrap();
            let mut lsm = file
                .add_variable::<f64>("lsm", &["time", "latitude", "longitude"])
                .unwrap();
            lsm.put_values(&[0.0, 1.0, 1.0, 0.0], ..).unwrap();
        }

        let mask = LandSeaMask::load(&path).unwrap();
        assert!(!mask.is_land(10.0, 45.25).unwrap());
        assert!(mask.is_land(10.25, 45.25).unwrap());
        assert!(mask.is_land(10.0, 45.0).unwrap());
        assert!(!mask.is_land(10.25, 45.0).unwrap());
    }

    #[test]
    fn missing_mask_file_is_data_error() {
        let result = LandSeaMask::load(Path::new("/nonexistent/lsm.nc"));
        assert!(matches!(result, Err(MeoError::DataUnavailable(_))));
    }
}
