//! Feature catalog parsing.
//!
//! The data-fetching collaborator delivers feature collections as JSON
//! arrays; this module turns them into [`Feature`] records ready for
//! [`crate::sprites::SpriteSet::set_data`].

use crate::data::Feature;

/// Parses a JSON array of feature records.
pub fn parse_features(json: &str) -> Result<Vec<Feature>, String> {
    serde_json::from_str(json).map_err(|e| format!("Failed to parse feature catalog: {}", e))
}
