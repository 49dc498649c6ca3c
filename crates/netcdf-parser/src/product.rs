//! Nearest-cell sampling of gridded CAMS products.
//!
//! A CAMS AOT product is a regular latitude/longitude grid (longitude in
//! `[0, 360)`) with one record along `time`. Sampling reduces every variable
//! that spans both spatial dimensions to its value at the cell nearest the
//! site; no interpolation is performed.

use std::collections::BTreeMap;
use std::path::Path;

use cams_common::SiteCoordinate;
use tracing::debug;

use crate::error::{NetCdfError, NetCdfResult};
use crate::native::{get_string_attr, read_all_f64, read_f64, silence_hdf5_errors, Packing};

pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";

/// One product reduced to a single grid cell.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledCell {
    /// Selected index along `latitude`.
    pub lat_index: usize,
    /// Selected index along `longitude`.
    pub lon_index: usize,
    /// Grid latitude at `lat_index`.
    pub latitude: f64,
    /// Grid longitude at `lon_index`, in the product's own convention.
    pub longitude: f64,
    /// Unpacked value of every sampled variable, by name.
    pub values: BTreeMap<String, f64>,
    /// `long_name` attributes of the sampled variables, when present.
    pub long_names: BTreeMap<String, String>,
}

impl SampledCell {
    pub fn value(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }
}

/// Index of the element closest to `target`.
///
/// Ties go to the lowest index. NaN elements are never selected. Returns
/// `None` when no element is comparable.
pub fn nearest_index(values: &[f64], target: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        let distance = (v - target).abs();
        if distance.is_nan() {
            continue;
        }
        match best {
            Some((_, d)) if distance >= d => {}
            _ => best = Some((i, distance)),
        }
    }
    best.map(|(i, _)| i)
}

/// Open a product and sample it at the cell nearest `site`.
///
/// The file is closed when this returns, on success and failure alike.
pub fn sample_site<P: AsRef<Path>>(path: P, site: &SiteCoordinate) -> NetCdfResult<SampledCell> {
    silence_hdf5_errors();

    let path = path.as_ref();
    let file = netcdf::open(path).map_err(|e| NetCdfError::OpenFailed(format!("{}: {}", path.display(), e)))?;

    sample_file(&file, site)
}

/// Sample an already opened product.
pub fn sample_file(file: &netcdf::File, site: &SiteCoordinate) -> NetCdfResult<SampledCell> {
    let latitudes = coordinate(file, LATITUDE)?;
    let longitudes = coordinate(file, LONGITUDE)?;

    let lat_index = nearest_index(&latitudes, site.latitude)
        .ok_or_else(|| NetCdfError::InvalidFormat("latitude has no usable values".to_string()))?;
    let lon_index = nearest_index(&longitudes, site.lookup_longitude())
        .ok_or_else(|| NetCdfError::InvalidFormat("longitude has no usable values".to_string()))?;

    let mut values = BTreeMap::new();
    let mut long_names = BTreeMap::new();

    for var in file.variables() {
        let name = var.name();
        if name == LATITUDE || name == LONGITUDE {
            continue;
        }

        let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
        if !(dims.iter().any(|d| d == LATITUDE) && dims.iter().any(|d| d == LONGITUDE)) {
            debug!(variable = %name, dims = ?dims, "Skipping non-spatial variable");
            continue;
        }

        let start: Vec<usize> = dims
            .iter()
            .map(|d| match d.as_str() {
                LATITUDE => lat_index,
                LONGITUDE => lon_index,
                _ => 0,
            })
            .collect();
        let count = vec![1; dims.len()];

        let raw = read_f64(&var, &start, &count)?;
        let raw = raw
            .first()
            .copied()
            .ok_or_else(|| NetCdfError::MissingData(format!("{} has no value at the selected cell", name)))?;

        values.insert(name.clone(), Packing::of(&var).unpack(raw));
        if let Some(long_name) = get_string_attr(&var, "long_name") {
            long_names.insert(name, long_name);
        }
    }

    Ok(SampledCell {
        lat_index,
        lon_index,
        latitude: latitudes[lat_index],
        longitude: longitudes[lon_index],
        values,
        long_names,
    })
}

/// Read a 1-D coordinate variable.
fn coordinate(file: &netcdf::File, name: &str) -> NetCdfResult<Vec<f64>> {
    let var = file
        .variable(name)
        .ok_or_else(|| NetCdfError::MissingData(format!("{} variable", name)))?;
    if var.dimensions().len() != 1 {
        return Err(NetCdfError::InvalidFormat(format!(
            "{} must be one-dimensional, found {} dimensions",
            name,
            var.dimensions().len()
        )));
    }
    let packing = Packing::of(&var);
    Ok(read_all_f64(&var)?
        .into_iter()
        .map(|v| packing.unpack(v))
        .collect())
}
