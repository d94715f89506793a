//! Feature data model and catalog parsing.
//!
//! Features are the external input records of the engine: earthquakes,
//! volcanic eruptions, and plate-movement samples, delivered as ordered
//! collections whose order determines slot assignment during reconciliation.

mod catalog;
mod feature;

pub use catalog::parse_features;
pub use feature::{Feature, FeatureProperties, GeoPosition};
