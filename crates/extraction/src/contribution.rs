//! Species contribution ratios of stored artifacts.
//!
//! The total AOD at a time step is the sum of every species of the regime;
//! each species' ratio is its value divided by that total.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use cams_common::Regime;
use netcdf_parser::{read_site_series, SiteSeries};

use crate::error::{ExtractionError, Result};

/// Regime encoded in an artifact's file-stem suffix (`_5` / `_7`).
pub fn regime_from_artifact_name(path: &Path) -> Result<Regime> {
    let unknown = || ExtractionError::UnknownArtifact(path.to_path_buf());

    let stem = path.file_stem().and_then(|s| s.to_str()).ok_or_else(unknown)?;
    let (_, suffix) = stem.rsplit_once('_').ok_or_else(unknown)?;
    let count: usize = suffix.parse().map_err(|_| unknown())?;
    Regime::from_species_count(count).ok_or_else(unknown)
}

/// Read an artifact together with the regime its name declares.
pub fn load_artifact(path: &Path) -> Result<(Regime, SiteSeries)> {
    let regime = regime_from_artifact_name(path)?;
    let series = read_site_series(path).map_err(|e| ExtractionError::product_read(path, e))?;
    Ok((regime, series))
}

/// Total AOD and per-species ratios at one time step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributionRow {
    pub time: DateTime<Utc>,
    pub total: f64,
    /// Ratios in the regime's species order.
    pub ratios: Vec<(String, f64)>,
}

impl ContributionRow {
    pub fn ratio(&self, species: &str) -> Option<f64> {
        self.ratios
            .iter()
            .find(|(name, _)| name == species)
            .map(|(_, r)| *r)
    }
}

/// Per-time-step contributions of each species of `regime`.
///
/// A zero total yields NaN ratios. Every species column must have one value
/// per time step.
pub fn species_contributions(series: &SiteSeries, regime: Regime) -> Result<Vec<ContributionRow>> {
    let missing: Vec<String> = regime
        .variables()
        .iter()
        .filter(|name| series.variable(name).is_none())
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ExtractionError::MissingSpecies { regime, missing });
    }

    let columns: Vec<_> = regime
        .variables()
        .iter()
        .filter_map(|name| series.variable(name))
        .collect();

    if let Some(ragged) = columns.iter().find(|c| c.values.len() != series.times.len()) {
        return Err(ExtractionError::InvalidSeries(format!(
            "{} has {} values for {} time steps",
            ragged.name,
            ragged.values.len(),
            series.times.len()
        )));
    }

    let rows = series
        .times
        .iter()
        .enumerate()
        .map(|(step, &time)| {
            let total: f64 = columns.iter().map(|c| c.values[step]).sum();
            let ratios = columns
                .iter()
                .map(|c| {
                    let ratio = if total == 0.0 { f64::NAN } else { c.values[step] / total };
                    (c.name.clone(), ratio)
                })
                .collect();
            ContributionRow { time, total, ratios }
        })
        .collect();

    Ok(rows)
}
