//! The extraction pipeline.

use std::path::{Path, PathBuf};
use std::time::Instant;

use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

use cams_common::{classify, display_timestamp, Regime, SiteCoordinate};

use crate::combiner::{artifact_path, combine, write_artifact};
use crate::config::ExtractOptions;
use crate::error::{ExtractionError, Result};
use crate::report::{ArtifactRecord, DuplicateTimestamp, FileFailure, RunReport, WriteFailure};
use crate::sampler::{sample_product, SampledObservation};
use crate::scanner::scan_products;

/// Outcome of the per-file work for one discovered product.
enum FileOutcome {
    Sampled(Result<SampledObservation>),
    Panicked(String),
    TimedOut(u64),
}

/// Turns a directory of CAMS products into per-regime site series.
///
/// Per-file problems never abort a run; they are recorded in the returned
/// [`RunReport`]. Only a missing scan root, invalid options, or a failed
/// worker pool surface as errors.
pub struct Extractor {
    options: ExtractOptions,
}

impl Extractor {
    pub fn new(options: ExtractOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Scan `root`, sample every product at `site`, and write one artifact
    /// per non-empty regime next to `output`.
    pub async fn run(&self, root: &Path, output: &Path, site: SiteCoordinate) -> Result<RunReport> {
        let started = Instant::now();
        let mut report = RunReport::new(root.to_path_buf(), output.to_path_buf(), site);

        if site.needs_folding() {
            info!(
                longitude = site.longitude,
                lookup_longitude = site.lookup_longitude(),
                "Folding site longitude into [0, 360)"
            );
        }

        let products = {
            let root = root.to_path_buf();
            let pattern = self.options.pattern.clone();
            tokio::task::spawn_blocking(move || scan_products(&root, &pattern)).await??
        };
        report.discovered = products.len();
        info!(
            root = %root.display(),
            discovered = products.len(),
            workers = self.options.workers,
            "Discovered products"
        );

        let outcomes = self.sample_all(products, site).await;
        let (accepted, failures) = partition_outcomes(outcomes);
        report.failures = failures;
        report.observations = accepted.len();

        if report.discovered > 0 && accepted.is_empty() {
            error!(
                failed = report.failures.len(),
                "Every discovered product failed, no artifacts written"
            );
            return Ok(report);
        }

        for (regime, series) in combine(accepted) {
            for (timestamp, count) in series.duplicate_timestamps() {
                warn!(
                    regime = %regime,
                    time = %display_timestamp(&timestamp),
                    count,
                    "Duplicate timestamp in series"
                );
                report.duplicates.push(DuplicateTimestamp {
                    regime,
                    timestamp,
                    count,
                });
            }

            let (Some(first), Some(last)) = (series.first_time(), series.last_time()) else {
                continue;
            };
            let time_steps = series.len();

            let output = output.to_path_buf();
            let written =
                tokio::task::spawn_blocking(move || write_artifact(&series, &output, &site))
                    .await
                    .map_err(ExtractionError::from)
                    .and_then(|r| r);

            match written {
                Ok(path) => {
                    info!(
                        regime = %regime,
                        path = %path.display(),
                        time_steps,
                        first = %display_timestamp(&first),
                        last = %display_timestamp(&last),
                        "Wrote artifact"
                    );
                    report.artifacts.push(ArtifactRecord {
                        regime,
                        path,
                        time_steps,
                        first,
                        last,
                    });
                }
                Err(err) => {
                    let path = match &err {
                        ExtractionError::ArtifactWrite { path, .. } => path.clone(),
                        _ => artifact_path(&report.output_base, regime),
                    };
                    error!(regime = %regime, path = %path.display(), error = %err, "Artifact write failed");
                    report.write_failures.push(WriteFailure {
                        regime,
                        path,
                        message: err.to_string(),
                    });
                }
            }
        }

        info!(
            discovered = report.discovered,
            observations = report.observations,
            failed = report.failures.len(),
            artifacts = report.artifacts.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Extraction finished"
        );

        Ok(report)
    }

    /// Sample every product on the blocking pool, at most `workers` at a time.
    ///
    /// Results come back in completion order tagged with their discovery
    /// index.
    async fn sample_all(
        &self,
        products: Vec<PathBuf>,
        site: SiteCoordinate,
    ) -> Vec<(usize, PathBuf, FileOutcome)> {
        let timeout = self.options.file_timeout();

        stream::iter(products.into_iter().enumerate())
            .map(move |(index, path)| async move {
                let task_path = path.clone();
                let task = tokio::task::spawn_blocking(move || sample_product(&task_path, &site));

                let joined = match timeout {
                    Some(limit) => match tokio::time::timeout(limit, task).await {
                        Ok(joined) => joined,
                        Err(_) => return (index, path, FileOutcome::TimedOut(limit.as_secs())),
                    },
                    None => task.await,
                };

                let outcome = match joined {
                    Ok(result) => FileOutcome::Sampled(result),
                    Err(e) => FileOutcome::Panicked(format!("sampling task failed: {e}")),
                };
                (index, path, outcome)
            })
            .buffer_unordered(self.options.workers)
            .collect()
            .await
    }
}

/// Restore discovery order, then split outcomes into observations tagged with
/// their regime and per-file failures.
///
/// Observations missing a variable of their regime's schema become failures.
fn partition_outcomes(
    mut outcomes: Vec<(usize, PathBuf, FileOutcome)>,
) -> (Vec<(SampledObservation, Regime)>, Vec<FileFailure>) {
    outcomes.sort_by_key(|(index, _, _)| *index);

    let mut accepted = Vec::new();
    let mut failures = Vec::new();
    for (_, path, outcome) in outcomes {
        let failure = match outcome {
            FileOutcome::Sampled(Ok(observation)) => {
                let regime = classify(observation.timestamp);
                let missing = observation.missing_variables(regime);
                if missing.is_empty() {
                    accepted.push((observation, regime));
                    continue;
                }
                let err = ExtractionError::product_read(
                    &path,
                    format!("missing {} variables: {}", regime, missing.join(", ")),
                );
                FileFailure::from_error(path, &err)
            }
            FileOutcome::Sampled(Err(err)) => FileFailure::from_error(path, &err),
            FileOutcome::Panicked(reason) => {
                FileFailure::from_error(path.clone(), &ExtractionError::product_read(path, reason))
            }
            FileOutcome::TimedOut(secs) => FileFailure::timeout(path, secs),
        };

        warn!(
            path = %failure.path.display(),
            kind = %failure.kind,
            error = %failure.message,
            "Skipping product"
        );
        failures.push(failure);
    }

    (accepted, failures)
}
