//! Regime partitioning and per-regime time-series assembly.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::warn;

use cams_common::{Regime, SiteCoordinate};
use netcdf_parser::{write_site_series, SeriesVariable, SiteSeries};

use crate::error::{ExtractionError, Result};
use crate::sampler::SampledObservation;

/// Grid-cell coordinates further apart than this are reported as a mismatch.
const COORDINATE_TOLERANCE: f64 = 1e-6;

/// Observations of one regime, ascending by timestamp.
#[derive(Debug, Clone)]
pub struct CombinedSeries {
    pub regime: Regime,
    pub members: Vec<SampledObservation>,
}

impl CombinedSeries {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn first_time(&self) -> Option<DateTime<Utc>> {
        self.members.first().map(|m| m.timestamp)
    }

    pub fn last_time(&self) -> Option<DateTime<Utc>> {
        self.members.last().map(|m| m.timestamp)
    }

    /// Timestamps shared by more than one member, with their counts.
    pub fn duplicate_timestamps(&self) -> Vec<(DateTime<Utc>, usize)> {
        let mut duplicates: Vec<(DateTime<Utc>, usize)> = Vec::new();
        for pair in self.members.windows(2) {
            if pair[0].timestamp != pair[1].timestamp {
                continue;
            }
            match duplicates.last_mut() {
                Some((t, count)) if *t == pair[1].timestamp => *count += 1,
                _ => duplicates.push((pair[1].timestamp, 2)),
            }
        }
        duplicates
    }

    /// Build the artifact contents: the regime's schema variables only, in
    /// schema order.
    ///
    /// The recorded cell coordinates come from the first member.
    pub fn to_site_series(&self, site: &SiteCoordinate) -> Result<SiteSeries> {
        let first = self.members.first().ok_or_else(|| ExtractionError::ArtifactWrite {
            path: PathBuf::new(),
            reason: format!("{} series has no members", self.regime),
        })?;

        for member in &self.members[1..] {
            if (member.cell.latitude - first.cell.latitude).abs() > COORDINATE_TOLERANCE
                || (member.cell.longitude - first.cell.longitude).abs() > COORDINATE_TOLERANCE
            {
                warn!(
                    path = %member.path.display(),
                    latitude = member.cell.latitude,
                    longitude = member.cell.longitude,
                    expected_latitude = first.cell.latitude,
                    expected_longitude = first.cell.longitude,
                    "Product sampled at a different grid cell"
                );
            }
        }

        let variables = self
            .regime
            .variables()
            .iter()
            .map(|&name| SeriesVariable {
                name: name.to_string(),
                long_name: first.cell.long_names.get(name).cloned(),
                values: self
                    .members
                    .iter()
                    .map(|m| m.cell.value(name).unwrap_or(f64::NAN))
                    .collect(),
            })
            .collect();

        Ok(SiteSeries {
            latitude: first.cell.latitude,
            longitude: first.cell.longitude,
            site: Some((site.latitude, site.longitude)),
            times: self.members.iter().map(|m| m.timestamp).collect(),
            variables,
        })
    }
}

/// Group observations by regime and stable-sort each group by timestamp.
///
/// Input order is preserved among equal timestamps. Regimes without members
/// are absent from the result.
pub fn combine(observations: Vec<(SampledObservation, Regime)>) -> BTreeMap<Regime, CombinedSeries> {
    let mut groups: BTreeMap<Regime, Vec<SampledObservation>> = BTreeMap::new();
    for (observation, regime) in observations {
        groups.entry(regime).or_default().push(observation);
    }

    groups
        .into_iter()
        .map(|(regime, mut members)| {
            members.sort_by_key(|m| m.timestamp);
            (regime, CombinedSeries { regime, members })
        })
        .collect()
}

/// `<output-without-extension>_{5|7}.nc`.
pub fn artifact_path(output_base: &Path, regime: Regime) -> PathBuf {
    let stem = output_base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = format!("{}{}.nc", stem, regime.suffix());
    match output_base.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

/// Write one regime's series next to `output_base`, returning the path.
pub fn write_artifact(
    series: &CombinedSeries,
    output_base: &Path,
    site: &SiteCoordinate,
) -> Result<PathBuf> {
    let path = artifact_path(output_base, series.regime);
    let contents = series
        .to_site_series(site)
        .map_err(|e| ExtractionError::ArtifactWrite {
            path: path.clone(),
            reason: e.to_string(),
        })?;

    write_site_series(&path, &contents).map_err(|e| ExtractionError::ArtifactWrite {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use netcdf_parser::SampledCell;

    fn observation(name: &str, day: u32, regime: Regime) -> (SampledObservation, Regime) {
        let values = regime
            .variables()
            .iter()
            .enumerate()
            .map(|(i, v)| (v.to_string(), day as f64 * 10.0 + i as f64))
            .collect();
        let observation = SampledObservation {
            path: PathBuf::from(name),
            timestamp: Utc.with_ymd_and_hms(2019, 7, day, 0, 0, 0).unwrap(),
            cell: SampledCell {
                lat_index: 3,
                lon_index: 4,
                latitude: 43.6,
                longitude: 1.6,
                values,
                long_names: BTreeMap::new(),
            },
        };
        (observation, regime)
    }

    fn names(series: &CombinedSeries) -> Vec<String> {
        series
            .members
            .iter()
            .map(|m| m.path.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_combine_partitions_and_sorts() {
        let groups = combine(vec![
            observation("c", 11, Regime::SevenSpecies),
            observation("b", 9, Regime::FiveSpecies),
            observation("a", 1, Regime::FiveSpecies),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(names(&groups[&Regime::FiveSpecies]), vec!["a", "b"]);
        assert_eq!(names(&groups[&Regime::SevenSpecies]), vec!["c"]);
    }

    #[test]
    fn test_combine_omits_empty_regime() {
        let groups = combine(vec![observation("a", 1, Regime::FiveSpecies)]);
        assert!(!groups.contains_key(&Regime::SevenSpecies));
        assert!(combine(Vec::new()).is_empty());
    }

    #[test]
    fn test_duplicates_keep_input_order() {
        let groups = combine(vec![
            observation("second-listed", 3, Regime::FiveSpecies),
            observation("early", 1, Regime::FiveSpecies),
            observation("third-listed", 3, Regime::FiveSpecies),
            observation("fourth-listed", 3, Regime::FiveSpecies),
        ]);
        let series = &groups[&Regime::FiveSpecies];

        assert_eq!(
            names(series),
            vec!["early", "second-listed", "third-listed", "fourth-listed"]
        );
        let duplicates = series.duplicate_timestamps();
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].1, 3);
    }

    #[test]
    fn test_site_series_uses_schema_order() {
        let groups = combine(vec![
            observation("b", 12, Regime::SevenSpecies),
            observation("a", 11, Regime::SevenSpecies),
        ]);
        let site = SiteCoordinate::new(43.6, 1.44);
        let series = groups[&Regime::SevenSpecies].to_site_series(&site).unwrap();

        let variable_names: Vec<_> = series.variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(variable_names, Regime::SevenSpecies.variables());
        assert_eq!(series.len(), 2);
        assert_eq!(series.variable("duaod550").unwrap().values, vec![110.0, 120.0]);
        assert_eq!(series.site, Some((43.6, 1.44)));
    }

    #[test]
    fn test_artifact_path() {
        assert_eq!(
            artifact_path(Path::new("/out/toulouse.nc"), Regime::FiveSpecies),
            PathBuf::from("/out/toulouse_5.nc")
        );
        assert_eq!(
            artifact_path(Path::new("/out/toulouse"), Regime::SevenSpecies),
            PathBuf::from("/out/toulouse_7.nc")
        );
        assert_eq!(
            artifact_path(Path::new("site.nc"), Regime::SevenSpecies),
            PathBuf::from("site_7.nc")
        );
    }
}
