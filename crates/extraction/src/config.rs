//! Extraction options.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ExtractionError, Result};

/// Which files under the scan root count as products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPattern {
    /// Product type tag; a file matches when its name contains `_{tag}_`.
    pub tag: String,
    /// Required file extension, without the dot.
    pub extension: String,
}

impl Default for ProductPattern {
    fn default() -> Self {
        Self {
            tag: "AOT".to_string(),
            extension: "nc".to_string(),
        }
    }
}

impl ProductPattern {
    /// Whether a file name matches `*_{tag}_*.{extension}`.
    pub fn matches(&self, file_name: &str) -> bool {
        let Some(stem) = file_name.strip_suffix(&format!(".{}", self.extension)) else {
            return false;
        };
        stem.contains(&format!("_{}_", self.tag))
    }
}

/// Options controlling one extraction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractOptions {
    /// Maximum number of products sampled concurrently.
    pub workers: usize,

    /// Give up on a single product after this many seconds.
    pub file_timeout_secs: Option<u64>,

    /// Product file matching.
    pub pattern: ProductPattern,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            file_timeout_secs: None,
            pattern: ProductPattern::default(),
        }
    }
}

impl ExtractOptions {
    /// Load options from environment variables, falling back to defaults.
    ///
    /// - `CAMS_EXTRACT_WORKERS`
    /// - `CAMS_EXTRACT_FILE_TIMEOUT_SECS`
    /// - `CAMS_PRODUCT_TAG`
    /// - `CAMS_PRODUCT_EXTENSION`
    pub fn from_env() -> Self {
        let mut options = Self::default();

        if let Ok(val) = std::env::var("CAMS_EXTRACT_WORKERS") {
            if let Ok(workers) = val.parse() {
                options.workers = workers;
            }
        }

        if let Ok(val) = std::env::var("CAMS_EXTRACT_FILE_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                options.file_timeout_secs = Some(secs);
            }
        }

        if let Ok(val) = std::env::var("CAMS_PRODUCT_TAG") {
            options.pattern.tag = val;
        }

        if let Ok(val) = std::env::var("CAMS_PRODUCT_EXTENSION") {
            options.pattern.extension = val.trim_start_matches('.').to_string();
        }

        options
    }

    pub fn file_timeout(&self) -> Option<Duration> {
        self.file_timeout_secs.map(Duration::from_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(ExtractionError::InvalidConfig(
                "workers must be at least 1".to_string(),
            ));
        }
        if self.file_timeout_secs == Some(0) {
            return Err(ExtractionError::InvalidConfig(
                "file timeout must be at least 1 second".to_string(),
            ));
        }
        if self.pattern.tag.is_empty() || self.pattern.extension.is_empty() {
            return Err(ExtractionError::InvalidConfig(
                "product tag and extension must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pattern_matches_aot_products() {
        let pattern = ProductPattern::default();
        assert!(pattern.matches("S2__OPER_EXO_CAMS_AOT_20190701T000000.nc"));
        assert!(!pattern.matches("S2__OPER_EXO_CAMS_MR_20190701T000000.nc"));
        assert!(!pattern.matches("S2__OPER_EXO_CAMS_RH_20190701T000000.nc"));
        assert!(!pattern.matches("S2__OPER_EXO_CAMS_AOT_20190701T000000.nc.bak"));
        assert!(!pattern.matches("AOT_20190701T000000.nc"));
    }

    #[test]
    fn test_custom_pattern() {
        let pattern = ProductPattern {
            tag: "MR".to_string(),
            extension: "nc4".to_string(),
        };
        assert!(pattern.matches("x_MR_20190701T000000.nc4"));
        assert!(!pattern.matches("x_MR_20190701T000000.nc"));
    }

    #[test]
    fn test_default_options_are_valid() {
        let options = ExtractOptions::default();
        assert!(options.workers >= 1);
        assert!(options.validate().is_ok());
        assert_eq!(options.file_timeout(), None);
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let options = ExtractOptions {
            workers: 0,
            ..Default::default()
        };
        assert!(matches!(
            options.validate(),
            Err(ExtractionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let options = ExtractOptions {
            file_timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }
}
