//! Target site coordinates.

use serde::{Deserialize, Serialize};

/// A fixed location in decimal degrees.
///
/// CAMS grids store longitude in `[0, 360)`, so lookups go through
/// [`SiteCoordinate::lookup_longitude`]. Latitude is used as given.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SiteCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl SiteCoordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Longitude folded into `[0, 360)`.
    pub fn lookup_longitude(&self) -> f64 {
        normalize_longitude(self.longitude)
    }

    /// Whether the given longitude had to be folded for lookup.
    pub fn needs_folding(&self) -> bool {
        !(0.0..360.0).contains(&self.longitude)
    }
}

/// Fold a longitude into `[0, 360)`.
pub fn normalize_longitude(lon: f64) -> f64 {
    let folded = lon.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if folded >= 360.0 {
        0.0
    } else {
        folded
    }
}

impl std::fmt::Display for SiteCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.3}N, {:.3}E)", self.latitude, self.longitude)
    }
}
