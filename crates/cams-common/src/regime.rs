//! Aerosol species regimes.
//!
//! CAMS switched from 5 to 7 tracked aerosol species on 2019-07-10 (nitrate
//! and ammonium were added). Products on either side of the switch carry a
//! different set of AOD variables, so every record is tagged with the regime
//! implied by its timestamp and each regime is written to its own artifact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 2019-07-10T00:00:00Z, as Unix seconds.
pub const SEVEN_SPECIES_CUTOFF: i64 = 1_562_716_800;

/// AOD variables of the 5-species products, in artifact order.
const FIVE_SPECIES_VARIABLES: &[&str] = &[
    "duaod550", // dust
    "omaod550", // organic matter
    "bcaod550", // black carbon
    "suaod550", // sulphate
    "ssaod550", // sea salt
];

/// AOD variables of the 7-species products, in artifact order.
const SEVEN_SPECIES_VARIABLES: &[&str] = &[
    "duaod550", "omaod550", "bcaod550", "suaod550", "ssaod550",
    "niaod550", // nitrate
    "amaod550", // ammonium
];

/// Species-set schema version of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Regime {
    FiveSpecies,
    SevenSpecies,
}

impl Regime {
    /// All regimes, oldest first.
    pub const ALL: [Regime; 2] = [Regime::FiveSpecies, Regime::SevenSpecies];

    /// Ordered variable names that make up this regime's schema.
    pub fn variables(&self) -> &'static [&'static str] {
        match self {
            Regime::FiveSpecies => FIVE_SPECIES_VARIABLES,
            Regime::SevenSpecies => SEVEN_SPECIES_VARIABLES,
        }
    }

    pub fn species_count(&self) -> usize {
        self.variables().len()
    }

    /// Artifact file-stem suffix (`_5` / `_7`).
    pub fn suffix(&self) -> String {
        format!("_{}", self.species_count())
    }

    /// Regime whose artifact suffix is `_{count}`.
    pub fn from_species_count(count: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.species_count() == count)
    }
}

impl std::fmt::Display for Regime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-species", self.species_count())
    }
}

/// A point in time from which products use a given regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaChange {
    /// Unix seconds (UTC) from which `regime` applies, inclusive.
    pub effective_from: i64,
    pub regime: Regime,
}

impl SchemaChange {
    pub fn effective_from_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.effective_from, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Regime of products older than every entry of [`schema_changes`].
const INITIAL_REGIME: Regime = Regime::FiveSpecies;

/// Known species-set changes, ascending by `effective_from`.
pub fn schema_changes() -> &'static [SchemaChange] {
    const CHANGES: &[SchemaChange] = &[SchemaChange {
        effective_from: SEVEN_SPECIES_CUTOFF,
        regime: Regime::SevenSpecies,
    }];
    CHANGES
}

/// Regime implied by a product timestamp.
///
/// A timestamp equal to a change's `effective_from` already belongs to the
/// new regime.
pub fn classify(timestamp: DateTime<Utc>) -> Regime {
    let secs = timestamp.timestamp();
    schema_changes()
        .iter()
        .take_while(|change| secs >= change.effective_from)
        .last()
        .map(|change| change.regime)
        .unwrap_or(INITIAL_REGIME)
}
