//! Site time-series artifacts.
//!
//! One artifact holds one regime's series at one site:
//!
//! ```text
//! dimensions:
//!     time = N ;
//! variables:
//!     int64 time(time) ;          // seconds since 1970-01-01 00:00:00
//!     double latitude ;           // grid cell actually sampled
//!     double longitude ;
//!     double duaod550(time) ;     // one per species of the regime
//!     ...
//! ```

use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{NetCdfError, NetCdfResult};
use crate::native::{get_string_attr, read_all_f64, silence_hdf5_errors};
use crate::product::{LATITUDE, LONGITUDE};

pub const TIME: &str = "time";
pub const TIME_UNITS: &str = "seconds since 1970-01-01 00:00:00";

/// A time-ordered series of per-species values at one grid cell.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteSeries {
    /// Latitude of the sampled grid cell.
    pub latitude: f64,
    /// Longitude of the sampled grid cell.
    pub longitude: f64,
    /// Requested site, recorded as global attributes.
    pub site: Option<(f64, f64)>,
    pub times: Vec<DateTime<Utc>>,
    /// Variables in artifact order; each has one value per time step.
    pub variables: Vec<SeriesVariable>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesVariable {
    pub name: String,
    pub long_name: Option<String>,
    pub values: Vec<f64>,
}

impl SiteSeries {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn variable(&self, name: &str) -> Option<&SeriesVariable> {
        self.variables.iter().find(|v| v.name == name)
    }

    fn validate(&self) -> NetCdfResult<()> {
        if self.times.is_empty() {
            return Err(NetCdfError::InvalidFormat("series has no time steps".to_string()));
        }
        if let Some(bad) = self.variables.iter().find(|v| v.values.len() != self.times.len()) {
            return Err(NetCdfError::InvalidFormat(format!(
                "{} has {} values for {} time steps",
                bad.name,
                bad.values.len(),
                self.times.len()
            )));
        }
        Ok(())
    }
}

/// Write a series to `path`, replacing any existing file.
pub fn write_site_series<P: AsRef<Path>>(path: P, series: &SiteSeries) -> NetCdfResult<()> {
    silence_hdf5_errors();
    series.validate()?;

    let path = path.as_ref();
    let write_err = |e: netcdf::Error| NetCdfError::WriteFailed(format!("{}: {}", path.display(), e));

    let mut file = netcdf::create(path).map_err(write_err)?;
    file.add_dimension(TIME, series.len()).map_err(write_err)?;

    file.add_attribute("species_count", series.variables.len() as i32)
        .map_err(write_err)?;
    if let Some((lat, lon)) = series.site {
        file.add_attribute("site_latitude", lat).map_err(write_err)?;
        file.add_attribute("site_longitude", lon).map_err(write_err)?;
    }

    {
        let times: Vec<i64> = series.times.iter().map(|t| t.timestamp()).collect();
        let mut var = file.add_variable::<i64>(TIME, &[TIME]).map_err(write_err)?;
        var.put_attribute("units", TIME_UNITS).map_err(write_err)?;
        var.put_attribute("calendar", "standard").map_err(write_err)?;
        var.put_values(&times, ..).map_err(write_err)?;
    }

    for (name, value, units) in [
        (LATITUDE, series.latitude, "degrees_north"),
        (LONGITUDE, series.longitude, "degrees_east"),
    ] {
        let mut var = file.add_variable::<f64>(name, &[]).map_err(write_err)?;
        var.put_attribute("units", units).map_err(write_err)?;
        var.put_values(&[value], ..).map_err(write_err)?;
    }

    for variable in &series.variables {
        let mut var = file
            .add_variable::<f64>(&variable.name, &[TIME])
            .map_err(write_err)?;
        if let Some(long_name) = &variable.long_name {
            var.put_attribute("long_name", long_name.as_str())
                .map_err(write_err)?;
        }
        var.put_values(&variable.values, ..).map_err(write_err)?;
    }

    debug!(
        path = %path.display(),
        time_steps = series.len(),
        variables = series.variables.len(),
        "Wrote site series"
    );

    Ok(())
}

/// Read back a series written by [`write_site_series`].
///
/// Every variable defined over `time` alone, other than `time` itself, is
/// returned in file order.
pub fn read_site_series<P: AsRef<Path>>(path: P) -> NetCdfResult<SiteSeries> {
    silence_hdf5_errors();

    let path = path.as_ref();
    let file = netcdf::open(path).map_err(|e| NetCdfError::OpenFailed(format!("{}: {}", path.display(), e)))?;

    let time_var = file
        .variable(TIME)
        .ok_or_else(|| NetCdfError::MissingData("time variable".to_string()))?;
    let times = read_all_f64(&time_var)?
        .into_iter()
        .map(|secs| {
            DateTime::from_timestamp(secs as i64, 0)
                .ok_or_else(|| NetCdfError::InvalidFormat(format!("time value {} out of range", secs)))
        })
        .collect::<NetCdfResult<Vec<_>>>()?;

    let scalar = |name: &str| -> NetCdfResult<f64> {
        let var = file
            .variable(name)
            .ok_or_else(|| NetCdfError::MissingData(format!("{} variable", name)))?;
        read_all_f64(&var)?
            .first()
            .copied()
            .ok_or_else(|| NetCdfError::MissingData(format!("{} value", name)))
    };
    let latitude = scalar(LATITUDE)?;
    let longitude = scalar(LONGITUDE)?;

    let site = match (
        global_f64(&file, "site_latitude"),
        global_f64(&file, "site_longitude"),
    ) {
        (Some(lat), Some(lon)) => Some((lat, lon)),
        _ => None,
    };

    let mut variables = Vec::new();
    for var in file.variables() {
        let name = var.name();
        let over_time = matches!(var.dimensions(), [d] if d.name() == TIME);
        if name == TIME || !over_time {
            continue;
        }
        variables.push(SeriesVariable {
            long_name: get_string_attr(&var, "long_name"),
            values: read_all_f64(&var)?,
            name,
        });
    }

    let series = SiteSeries {
        latitude,
        longitude,
        site,
        times,
        variables,
    };
    series.validate()?;
    Ok(series)
}

fn global_f64(file: &netcdf::File, name: &str) -> Option<f64> {
    let attr = file.attribute(name)?;
    f64::try_from(attr.value().ok()?).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn series(times: usize, values: usize) -> SiteSeries {
        SiteSeries {
            latitude: 43.6,
            longitude: 1.4,
            site: None,
            times: (0..times)
                .map(|h| Utc.with_ymd_and_hms(2019, 7, 1, h as u32, 0, 0).unwrap())
                .collect(),
            variables: vec![SeriesVariable {
                name: "duaod550".to_string(),
                long_name: None,
                values: vec![0.1; values],
            }],
        }
    }

    #[test]
    fn test_validate_rejects_length_mismatch() {
        assert!(series(2, 2).validate().is_ok());
        assert!(matches!(
            series(2, 3).validate(),
            Err(NetCdfError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_validate_rejects_empty() {
        assert!(series(0, 0).validate().is_err());
    }
}
