//! NetCDF access for CAMS AOT products.
//!
//! Two concerns live here:
//!
//! - [`product`]: open one gridded product and reduce it to the grid cell
//!   nearest a site (nearest-neighbour, no interpolation), unpacking CF
//!   `scale_factor`/`add_offset` and masking fill values.
//! - [`series`]: write and read the per-regime site time-series artifacts.
//!
//! # Implementation Notes
//!
//! Reading goes through the native `netcdf` crate (libnetcdf + HDF5). HDF5
//! prints diagnostics to stderr for errors that are handled here, so every
//! entry point silences them first.

pub mod error;
pub mod native;
pub mod product;
pub mod series;

pub use error::{NetCdfError, NetCdfResult};
pub use native::silence_hdf5_errors;
pub use product::{nearest_index, sample_file, sample_site, SampledCell};
pub use series::{read_site_series, write_site_series, SeriesVariable, SiteSeries};
