//! Generators for synthetic CAMS AOT products.
//!
//! Generated products follow the real layout: a single `time` record, a
//! `latitude`/`longitude` grid, and one AOD variable per species over
//! `(time, latitude, longitude)`, optionally packed as shorts.
//!
//! Cell values are predictable so tests can check which cell was sampled:
//! see [`cell_value`].

use std::path::Path;

use crate::fixtures::grid::GridSpec;
use crate::fixtures::species;

/// Scale factor used for packed (i16) species variables.
pub const PACKED_SCALE: f64 = 1.0e-5;

/// Fill value used for packed (i16) species variables.
pub const PACKED_FILL: i16 = i16::MIN;

/// Value stored at `(lat_index, lon_index)` for a species with `base` AOD.
///
/// `base + lat_index * 0.001 + lon_index * 0.00001`
pub fn cell_value(base: f64, lat_index: usize, lon_index: usize) -> f64 {
    base + lat_index as f64 * 0.001 + lon_index as f64 * 0.00001
}

/// Builder for a synthetic AOT product.
#[derive(Debug, Clone)]
pub struct AotProductBuilder {
    grid: GridSpec,
    species: Vec<(String, f64)>,
    packed: bool,
    fill_cell: Option<(usize, usize)>,
    extras: Vec<(String, f64)>,
}

impl AotProductBuilder {
    /// Product on `grid` with no species yet.
    pub fn new(grid: GridSpec) -> Self {
        Self {
            grid,
            species: Vec::new(),
            packed: false,
            fill_cell: None,
            extras: Vec::new(),
        }
    }

    /// Product carrying the 5 pre-July-2019 species.
    pub fn five_species(grid: GridSpec) -> Self {
        Self::new(grid).with_species(&species::FIVE)
    }

    /// Product carrying the 7 species used from July 2019 on.
    pub fn seven_species(grid: GridSpec) -> Self {
        Self::new(grid).with_species(&species::SEVEN)
    }

    /// Add species variables; each gets [`species::base_value`] of its position.
    pub fn with_species(mut self, names: &[&str]) -> Self {
        let offset = self.species.len();
        self.species.extend(
            names
                .iter()
                .enumerate()
                .map(|(i, n)| (n.to_string(), species::base_value(offset + i))),
        );
        self
    }

    /// Shift the base value of every species added so far by `offset`.
    pub fn with_offset(mut self, offset: f64) -> Self {
        for (_, base) in &mut self.species {
            *base += offset;
        }
        self
    }

    /// Store species as scaled shorts instead of floats.
    pub fn packed(mut self) -> Self {
        self.packed = true;
        self
    }

    /// Write the fill value at one cell of every species.
    pub fn with_fill_at(mut self, lat_index: usize, lon_index: usize) -> Self {
        self.fill_cell = Some((lat_index, lon_index));
        self
    }

    /// Add a `(latitude, longitude)` variable with a constant value, outside
    /// any species schema.
    pub fn with_extra(mut self, name: &str, value: f64) -> Self {
        self.extras.push((name.to_string(), value));
        self
    }

    /// Expected value of `species_name` at a cell, before packing.
    pub fn expected(&self, species_name: &str, lat_index: usize, lon_index: usize) -> Option<f64> {
        self.species
            .iter()
            .find(|(n, _)| n == species_name)
            .map(|(_, base)| cell_value(*base, lat_index, lon_index))
    }

    /// Write the product to `path`.
    pub fn write(&self, path: &Path) -> Result<(), netcdf::Error> {
        let lats = self.grid.latitudes();
        let lons = self.grid.longitudes();

        let mut file = netcdf::create(path)?;
        file.add_dimension("time", 1)?;
        file.add_dimension("latitude", lats.len())?;
        file.add_dimension("longitude", lons.len())?;

        {
            let mut var = file.add_variable::<i32>("time", &["time"])?;
            var.put_attribute("units", "hours since 1900-01-01 00:00:00.0")?;
            var.put_values(&[1_047_000i32], ..)?;
        }
        {
            let mut var = file.add_variable::<f32>("latitude", &["latitude"])?;
            var.put_attribute("units", "degrees_north")?;
            let values: Vec<f32> = lats.iter().map(|&v| v as f32).collect();
            var.put_values(&values, ..)?;
        }
        {
            let mut var = file.add_variable::<f32>("longitude", &["longitude"])?;
            var.put_attribute("units", "degrees_east")?;
            let values: Vec<f32> = lons.iter().map(|&v| v as f32).collect();
            var.put_values(&values, ..)?;
        }

        let dims = ["time", "latitude", "longitude"];
        for (name, base) in &self.species {
            let grid: Vec<f64> = (0..lats.len())
                .flat_map(|i| (0..lons.len()).map(move |j| (i, j)))
                .map(|(i, j)| {
                    if self.fill_cell == Some((i, j)) {
                        f64::NAN
                    } else {
                        cell_value(*base, i, j)
                    }
                })
                .collect();

            if self.packed {
                let mut var = file.add_variable::<i16>(name, &dims)?;
                var.set_fill_value(PACKED_FILL)?;
                var.put_attribute("scale_factor", PACKED_SCALE)?;
                var.put_attribute("add_offset", 0.0f64)?;
                var.put_attribute("long_name", format!("{} at 550nm", name).as_str())?;
                let raw: Vec<i16> = grid
                    .iter()
                    .map(|v| {
                        if v.is_nan() {
                            PACKED_FILL
                        } else {
                            (v / PACKED_SCALE).round() as i16
                        }
                    })
                    .collect();
                var.put_values(&raw, ..)?;
            } else {
                let mut var = file.add_variable::<f32>(name, &dims)?;
                var.put_attribute("long_name", format!("{} at 550nm", name).as_str())?;
                let values: Vec<f32> = grid.iter().map(|&v| v as f32).collect();
                var.put_values(&values, ..)?;
            }
        }

        for (name, value) in &self.extras {
            let mut var = file.add_variable::<f32>(name, &["latitude", "longitude"])?;
            var.put_values(&vec![*value as f32; lats.len() * lons.len()], ..)?;
        }

        Ok(())
    }
}

/// Write bytes that are not a NetCDF file, under a product-like name.
pub fn write_corrupt_product(path: &Path) -> std::io::Result<()> {
    std::fs::write(path, b"this is not a netcdf file\n")
}
