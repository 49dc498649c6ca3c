//! Common types shared by the CAMS site extraction crates.

pub mod regime;
pub mod site;
pub mod time;

pub use regime::{classify, schema_changes, Regime, SchemaChange, SEVEN_SPECIES_CUTOFF};
pub use site::{normalize_longitude, SiteCoordinate};
pub use time::{display_timestamp, parse_compact_timestamp, TimeParseError};
