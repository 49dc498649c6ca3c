//! Per-product site sampling.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, instrument};

use cams_common::{display_timestamp, Regime, SiteCoordinate};
use netcdf_parser::SampledCell;

use crate::error::{ExtractionError, Result};
use crate::metadata::parse_product_timestamp;

/// One product reduced to the cell nearest the site.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledObservation {
    pub path: PathBuf,
    pub timestamp: DateTime<Utc>,
    pub cell: SampledCell,
}

impl SampledObservation {
    /// Schema variables of `regime` this observation does not carry.
    pub fn missing_variables(&self, regime: Regime) -> Vec<&'static str> {
        regime
            .variables()
            .iter()
            .copied()
            .filter(|name| !self.cell.values.contains_key(*name))
            .collect()
    }

    /// Grid cell this observation was taken from.
    pub fn provenance(&self) -> Provenance {
        Provenance {
            lat_index: self.cell.lat_index,
            lon_index: self.cell.lon_index,
            latitude: self.cell.latitude,
            longitude: self.cell.longitude,
        }
    }
}

/// Grid cell a product was sampled at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Provenance {
    pub lat_index: usize,
    pub lon_index: usize,
    pub latitude: f64,
    pub longitude: f64,
}

/// Parse the product's timestamp and sample it at `site`.
///
/// The timestamp is parsed first so badly named files are never opened.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn sample_product(path: &Path, site: &SiteCoordinate) -> Result<SampledObservation> {
    let timestamp = parse_product_timestamp(path)?;

    let cell = netcdf_parser::sample_site(path, site)
        .map_err(|e| ExtractionError::product_read(path, e))?;

    let observation = SampledObservation {
        path: path.to_path_buf(),
        timestamp,
        cell,
    };

    debug!(
        time = %display_timestamp(&observation.timestamp),
        provenance = ?observation.provenance(),
        requested_latitude = site.latitude,
        requested_longitude = site.lookup_longitude(),
        variables = observation.cell.values.len(),
        "Sampled product"
    );

    Ok(observation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn observation(names: &[&str]) -> SampledObservation {
        SampledObservation {
            path: PathBuf::from("X_AOT_20190701T000000.nc"),
            timestamp: Utc.with_ymd_and_hms(2019, 7, 1, 0, 0, 0).unwrap(),
            cell: SampledCell {
                lat_index: 1,
                lon_index: 2,
                latitude: 44.0,
                longitude: 0.8,
                values: names.iter().map(|n| (n.to_string(), 0.1)).collect(),
                long_names: BTreeMap::new(),
            },
        }
    }

    #[test]
    fn test_missing_variables() {
        let obs = observation(&["duaod550", "omaod550", "bcaod550", "suaod550", "ssaod550"]);
        assert!(obs.missing_variables(Regime::FiveSpecies).is_empty());
        assert_eq!(
            obs.missing_variables(Regime::SevenSpecies),
            vec!["niaod550", "amaod550"]
        );
    }

    #[test]
    fn test_bad_name_is_not_opened() {
        // The file does not exist; a timestamp error proves it was never opened.
        let err = sample_product(
            Path::new("/nonexistent/X_AOT_garbage.nc"),
            &SiteCoordinate::new(0.0, 0.0),
        )
        .unwrap_err();
        assert!(matches!(err, ExtractionError::TimestampParse { .. }));
    }

    #[test]
    fn test_unopenable_product_is_read_error() {
        let err = sample_product(
            Path::new("/nonexistent/X_AOT_20190701T000000.nc"),
            &SiteCoordinate::new(0.0, 0.0),
        )
        .unwrap_err();
        assert!(matches!(err, ExtractionError::ProductRead { .. }));
    }

    #[test]
    fn test_provenance() {
        let p = observation(&[]).provenance();
        assert_eq!((p.lat_index, p.lon_index), (1, 2));
    }
}
