//! Metadata extraction from CAMS product filenames.
//!
//! CAMS products carry their observation time as the last `_`-separated
//! segment of the file name, e.g.
//! `S2__OPER_EXO_CAMS_AOT_20210301T120000.nc`.

use std::path::Path;

use chrono::{DateTime, Utc};

use cams_common::{parse_compact_timestamp, TimeParseError};

use crate::error::{ExtractionError, Result};

/// The timestamp segment of a product file name.
///
/// Everything after the first `.` is treated as extension, so
/// `X_AOT_20210301T120000.DBL.nc` yields `20210301T120000`.
pub fn timestamp_segment(path: &Path) -> Option<&str> {
    let file_name = path.file_name()?.to_str()?;
    let base = file_name.split('.').next()?;
    base.rsplit('_').next()
}

/// Parse the observation time embedded in a product path.
pub fn parse_product_timestamp(path: &Path) -> Result<DateTime<Utc>> {
    let segment = timestamp_segment(path).unwrap_or_default();
    parse_compact_timestamp(segment).map_err(|source| ExtractionError::TimestampParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Whether a failed parse was caused by the layout rather than the calendar.
pub fn is_layout_error(err: &ExtractionError) -> bool {
    matches!(
        err,
        ExtractionError::TimestampParse {
            source: TimeParseError::InvalidLayout(_),
            ..
        }
    )
}
