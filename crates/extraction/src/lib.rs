//! Site AOD extraction from CAMS AOT product collections.
//!
//! Turns a directory tree of gridded CAMS products into one time series per
//! species regime at a single site.
//!
//! # Architecture
//!
//! The [`Extractor`] pipeline runs these stages in order:
//!
//! - discovery of `*_AOT_*.nc` products ([`scanner`])
//! - timestamp parsing from file names ([`metadata`])
//! - nearest-cell sampling on the blocking pool ([`sampler`])
//! - regime classification and schema validation
//! - per-regime partitioning, time sorting and artifact writing ([`combiner`])
//!
//! Per-file failures are collected into a [`RunReport`] instead of aborting
//! the run. [`contribution`] reads the artifacts back for downstream ratio
//! computations.

pub mod combiner;
pub mod config;
pub mod contribution;
pub mod error;
mod extractor;
pub mod metadata;
pub mod report;
pub mod sampler;
pub mod scanner;

// Re-exports
pub use cams_common::{classify, Regime, SiteCoordinate};
pub use combiner::{artifact_path, combine, write_artifact, CombinedSeries};
pub use config::{ExtractOptions, ProductPattern};
pub use contribution::{load_artifact, regime_from_artifact_name, species_contributions, ContributionRow};
pub use error::{ExtractionError, Result};
pub use extractor::Extractor;
pub use metadata::parse_product_timestamp;
pub use report::{FailureKind, FileFailure, RunReport, RunStatus};
pub use sampler::{sample_product, SampledObservation};
pub use scanner::scan_products;
