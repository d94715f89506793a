//! Feature records supplied by the data-fetching collaborator.
//!
//! A feature is one input record to be visualized: an earthquake, a volcanic
//! eruption, or a plate-movement sample. Records are immutable for the
//! duration of an update cycle and carry a stable `id` so the sprite engine
//! can recognize them across updates.

use chrono::{DateTime, Utc};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Geographic position of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    /// Longitude in degrees
    pub lng: f64,
    /// Latitude in degrees
    pub lat: f64,
    /// Elevation in meters (negative for depth below sea level)
    #[serde(default)]
    pub elevation: Option<f64>,
}

impl GeoPosition {
    /// Creates a position from longitude and latitude.
    pub fn new(lng: f64, lat: f64) -> Self {
        Self {
            lng,
            lat,
            elevation: None,
        }
    }

    /// Returns true if all coordinate components are finite.
    pub fn is_finite(&self) -> bool {
        self.lng.is_finite()
            && self.lat.is_finite()
            && self.elevation.map(f64::is_finite).unwrap_or(true)
    }
}

/// Kind-specific payload of a feature.
///
/// Earthquakes and volcanoes render as isotropic point sprites; plate-movement
/// samples render as oriented arrows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureProperties {
    Earthquake {
        /// Moment magnitude
        magnitude: f32,
        /// Event time
        date: DateTime<Utc>,
        /// Display color as 0xRRGGBB
        color: u32,
    },
    Volcano {
        /// Eruption time
        date: DateTime<Utc>,
        /// Display color as 0xRRGGBB
        color: u32,
    },
    PlateMovement {
        /// Velocity vector in mm/yr (east, north, up)
        velocity: Vec3,
    },
}

/// One input data record (earthquake, volcano, or plate-movement sample).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Stable identifier, comparable by equality across updates
    pub id: String,
    /// Geographic position
    pub position: GeoPosition,
    /// Whether the feature should currently be shown
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Kind-specific payload
    #[serde(flatten)]
    pub properties: FeatureProperties,
}

fn default_visible() -> bool {
    true
}

impl Feature {
    /// Checks that the record can safely drive attribute writes.
    ///
    /// Malformed records (empty id, non-finite coordinates or payload
    /// numbers) are rejected at the reconciliation boundary rather than
    /// propagated into the GPU arrays.
    pub fn is_well_formed(&self) -> bool {
        if self.id.is_empty() || !self.position.is_finite() {
            return false;
        }
        match &self.properties {
            FeatureProperties::Earthquake { magnitude, .. } => magnitude.is_finite(),
            FeatureProperties::Volcano { .. } => true,
            FeatureProperties::PlateMovement { velocity } => velocity.is_finite(),
        }
    }

    /// Display color as 0xRRGGBB. Arrows use a fixed white base tinted by
    /// the shader-level opacity uniform.
    pub fn color(&self) -> u32 {
        match &self.properties {
            FeatureProperties::Earthquake { color, .. } => *color,
            FeatureProperties::Volcano { color, .. } => *color,
            FeatureProperties::PlateMovement { .. } => 0xFFFFFF,
        }
    }

    /// Event time as seconds since the Unix epoch, if the kind carries one.
    pub fn date_seconds(&self) -> Option<f32> {
        match &self.properties {
            FeatureProperties::Earthquake { date, .. }
            | FeatureProperties::Volcano { date, .. } => Some(date.timestamp() as f32),
            FeatureProperties::PlateMovement { .. } => None,
        }
    }

    /// Velocity vector for directional features.
    pub fn velocity(&self) -> Option<Vec3> {
        match &self.properties {
            FeatureProperties::PlateMovement { velocity } => Some(*velocity),
            _ => None,
        }
    }

    /// Fully-visible sprite size in pixels.
    ///
    /// Earthquake size grows with magnitude so large events dominate the
    /// view; arrows scale with velocity magnitude, clamped to stay legible.
    pub fn base_size(&self) -> f32 {
        match &self.properties {
            FeatureProperties::Earthquake { magnitude, .. } => {
                (0.9 * magnitude.max(0.0).powf(1.5)).max(4.0)
            }
            FeatureProperties::Volcano { .. } => 20.0,
            FeatureProperties::PlateMovement { velocity } => {
                (velocity.length() * 0.6).clamp(8.0, 48.0)
            }
        }
    }
}
