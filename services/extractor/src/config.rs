//! Command-line arguments and option merging.

use std::path::PathBuf;

use clap::Parser;

use cams_common::SiteCoordinate;
use extraction::ExtractOptions;

#[derive(Parser, Debug)]
#[command(name = "cams-extract")]
#[command(about = "Extract per-regime AOD time series at a site from CAMS AOT products")]
pub struct Args {
    /// Root of the CAMS product collection
    pub directory: PathBuf,

    /// Output path; artifacts are written as <stem>_5.nc and <stem>_7.nc
    pub output: PathBuf,

    /// Site latitude in degrees north
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Site longitude in degrees east; negative values are folded into [0, 360)
    #[arg(long, allow_negative_numbers = true)]
    pub lon: f64,

    /// Maximum number of products sampled concurrently
    #[arg(long)]
    pub workers: Option<usize>,

    /// Give up on a single product after this many seconds
    #[arg(long)]
    pub file_timeout_secs: Option<u64>,

    /// Product type tag in file names (`*_{tag}_*`)
    #[arg(long)]
    pub product_tag: Option<String>,

    /// Write the run report as JSON to this path
    #[arg(long, env = "CAMS_EXTRACT_REPORT")]
    pub report: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long, env = "CAMS_JSON_LOGS")]
    pub json_logs: bool,
}

impl Args {
    pub fn site(&self) -> SiteCoordinate {
        SiteCoordinate::new(self.lat, self.lon)
    }

    /// Environment-derived options with command-line flags applied on top.
    pub fn extract_options(&self) -> ExtractOptions {
        self.apply(ExtractOptions::from_env())
    }

    fn apply(&self, mut options: ExtractOptions) -> ExtractOptions {
        if let Some(workers) = self.workers {
            options.workers = workers;
        }
        if let Some(secs) = self.file_timeout_secs {
            options.file_timeout_secs = Some(secs);
        }
        if let Some(tag) = &self.product_tag {
            options.pattern.tag = tag.clone();
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("cams-extract").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_negative_coordinates_parse() {
        let args = parse(&["/data", "/out/site.nc", "--lat", "-33.9", "--lon", "-70.6"]);
        assert_eq!(args.lat, -33.9);
        assert_eq!(args.lon, -70.6);
        assert_eq!(args.directory, PathBuf::from("/data"));
        assert_eq!(args.output, PathBuf::from("/out/site.nc"));
        assert!(args.site().needs_folding());
    }

    #[test]
    fn test_site_is_required() {
        let result = Args::try_parse_from(["cams-extract", "/data", "/out/site.nc", "--lat", "43.6"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_flags_override_options() {
        let args = parse(&[
            "/data",
            "site.nc",
            "--lat",
            "43.6",
            "--lon",
            "1.44",
            "--workers",
            "3",
            "--file-timeout-secs",
            "30",
            "--product-tag",
            "MR",
        ]);
        let options = args.apply(ExtractOptions::default());
        assert_eq!(options.workers, 3);
        assert_eq!(options.file_timeout_secs, Some(30));
        assert_eq!(options.pattern.tag, "MR");
        assert_eq!(options.pattern.extension, "nc");
    }

    #[test]
    fn test_absent_flags_keep_options() {
        let args = parse(&["/data", "site.nc", "--lat", "0", "--lon", "0"]);
        let base = ExtractOptions {
            workers: 7,
            ..Default::default()
        };
        let options = args.apply(base);
        assert_eq!(options.workers, 7);
        assert_eq!(options.file_timeout_secs, None);
    }
}
