//! Map projection and coordinate transformation.
//!
//! Converts between geographic coordinates (lng/lat) and screen coordinates.
//! The sprite engine itself only consumes opaque projector closures; this
//! module provides a concrete spherical web-mercator projection so the crate
//! is usable stand-alone and testable with realistic viewports.

use crate::data::GeoPosition;
use geo_types::Coord;
use glam::{Vec2, Vec3};
use std::f64::consts::PI;

/// Pixel size of one map tile at integer zoom.
const TILE_SIZE: f64 = 256.0;

/// Spherical web-mercator projection over a screen viewport.
#[derive(Debug, Clone)]
pub struct MapProjection {
    /// Center longitude of the view
    pub center_lng: f64,
    /// Center latitude of the view
    pub center_lat: f64,
    /// Map zoom level (fractional zoom allowed)
    pub zoom: f64,
    /// Pan offset in screen pixels
    pub pan_offset: Vec2,
    /// Viewport size in pixels
    pub viewport: Vec2,
}

impl Default for MapProjection {
    fn default() -> Self {
        Self {
            center_lng: 0.0,
            center_lat: 0.0,
            zoom: 2.0,
            pan_offset: Vec2::ZERO,
            viewport: Vec2::new(800.0, 600.0),
        }
    }
}

impl MapProjection {
    /// Creates a projection centered on the given point.
    pub fn new(center_lng: f64, center_lat: f64, zoom: f64) -> Self {
        Self {
            center_lng,
            center_lat,
            zoom,
            ..Default::default()
        }
    }

    /// Updates the projection with current view state.
    pub fn update(&mut self, zoom: f64, pan_offset: Vec2, viewport: Vec2) {
        self.zoom = zoom;
        self.pan_offset = pan_offset;
        self.viewport = viewport;
    }

    /// World-space mercator position in tile units at the current zoom.
    fn tile_pos(&self, lng: f64, lat: f64) -> (f64, f64) {
        let scale = 2f64.powf(self.zoom);
        let x = (lng + 180.0) / 360.0 * scale;
        let lat_rad = lat.to_radians();
        let y = (1.0 - ((lat_rad.tan() + 1.0 / lat_rad.cos()).ln()) / PI) / 2.0 * scale;
        (x, y)
    }

    /// Converts a geographic position to a screen point.
    pub fn geo_to_screen(&self, position: GeoPosition) -> Vec3 {
        let (x, y) = self.tile_pos(position.lng, position.lat);
        let (cx, cy) = self.tile_pos(self.center_lng, self.center_lat);

        let screen_x = (x - cx) * TILE_SIZE + self.viewport.x as f64 / 2.0;
        let screen_y = (y - cy) * TILE_SIZE + self.viewport.y as f64 / 2.0;

        Vec3::new(
            screen_x as f32 + self.pan_offset.x,
            screen_y as f32 + self.pan_offset.y,
            0.0,
        )
    }

    /// Converts a screen point back to geographic coordinates (lng, lat).
    pub fn screen_to_geo(&self, pos: Vec2) -> Coord<f64> {
        let scale = 2f64.powf(self.zoom);
        let (cx, cy) = self.tile_pos(self.center_lng, self.center_lat);

        let x = cx + ((pos.x - self.pan_offset.x) as f64 - self.viewport.x as f64 / 2.0) / TILE_SIZE;
        let y = cy + ((pos.y - self.pan_offset.y) as f64 - self.viewport.y as f64 / 2.0) / TILE_SIZE;

        let lng = x / scale * 360.0 - 180.0;
        let n = PI - 2.0 * PI * y / scale;
        let lat = (0.5 * (n.exp() - (-n).exp())).atan().to_degrees();

        Coord { x: lng, y: lat }
    }

    /// Returns an owned projector closure for [`crate::sprites::SpriteSet`].
    ///
    /// The closure captures a snapshot of the current view state; build a
    /// fresh one after every viewport change and hand it to
    /// `invalidate_positions`.
    pub fn projector(&self) -> impl Fn(GeoPosition) -> Vec3 + 'static {
        let snapshot = self.clone();
        move |position| snapshot.geo_to_screen(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_projects_to_viewport_center() {
        let projection = MapProjection::new(139.7, 35.7, 5.0);
        let point = projection.geo_to_screen(GeoPosition::new(139.7, 35.7));
        assert!((point.x - 400.0).abs() < 1e-3);
        assert!((point.y - 300.0).abs() < 1e-3);
    }

    #[test]
    fn test_round_trip() {
        let projection = MapProjection::new(-30.0, 45.0, 4.0);
        let point = projection.geo_to_screen(GeoPosition::new(-28.5, 46.2));
        let coord = projection.screen_to_geo(Vec2::new(point.x, point.y));
        assert!((coord.x - -28.5).abs() < 1e-4);
        assert!((coord.y - 46.2).abs() < 1e-4);
    }

    #[test]
    fn test_east_is_right_north_is_up() {
        let projection = MapProjection::new(0.0, 0.0, 3.0);
        let east = projection.geo_to_screen(GeoPosition::new(10.0, 0.0));
        let north = projection.geo_to_screen(GeoPosition::new(0.0, 10.0));
        let center = projection.geo_to_screen(GeoPosition::new(0.0, 0.0));
        assert!(east.x > center.x);
        assert!(north.y < center.y, "screen y grows downward");
    }

    #[test]
    fn test_projector_closure_matches_method() {
        let projection = MapProjection::new(20.0, -10.0, 6.0);
        let project = projection.projector();
        let position = GeoPosition::new(21.3, -9.2);
        assert_eq!(project(position), projection.geo_to_screen(position));
    }
}
