//! Hit-testing across a sprite set.
//!
//! Pointer coordinates arrive already converted to the map's local pixel
//! space by the UI collaborator; no normalization happens here.

use crate::data::Feature;
use crate::sprites::attributes::SpriteAttributes;
use crate::sprites::sprite::Sprite;

/// Borrowing hit-test view over a sprite set's live sprites.
pub struct PickSurface<'a, S: Sprite> {
    sprites: &'a [S],
    attrs: &'a SpriteAttributes,
}

impl<'a, S: Sprite> PickSurface<'a, S> {
    pub(crate) fn new(sprites: &'a [S], attrs: &'a SpriteAttributes) -> Self {
        Self { sprites, attrs }
    }

    /// Finds the topmost feature whose sprite covers the screen point.
    ///
    /// Sprites are scanned in reverse index order so the last-drawn sprite
    /// wins ties, matching draw order. Linear, but only runs on discrete
    /// pointer events.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<&'a Feature> {
        self.sprites
            .iter()
            .rev()
            .find(|sprite| sprite.hit_test(self.attrs, x, y))
            .map(|sprite| sprite.feature())
    }
}

#[cfg(test)]
mod tests {
    use crate::data::{Feature, FeatureProperties, GeoPosition};
    use crate::sprites::SpriteSet;
    use chrono::{TimeZone, Utc};
    use glam::Vec3;

    fn create_test_quake(id: &str, lng: f64, lat: f64) -> Feature {
        Feature {
            id: id.to_string(),
            position: GeoPosition::new(lng, lat),
            visible: true,
            properties: FeatureProperties::Earthquake {
                magnitude: 6.5,
                date: Utc.with_ymd_and_hms(2015, 4, 25, 6, 11, 25).unwrap(),
                color: 0xCC2200,
            },
        }
    }

    fn identity_projector() -> impl Fn(GeoPosition) -> Vec3 + 'static {
        |p: GeoPosition| Vec3::new(p.lng as f32, p.lat as f32, 0.0)
    }

    #[test]
    fn test_topmost_sprite_wins() {
        let mut set = SpriteSet::points(10);
        // Two sprites close enough that both cover the query point.
        set.set_data(
            vec![
                create_test_quake("below", 100.0, 50.0),
                create_test_quake("above", 100.5, 50.0),
            ],
            identity_projector(),
        );
        while set.update(0.5) {}

        let hit = set.pick_surface().hit_test(100.2, 50.0);
        assert_eq!(hit.map(|f| f.id.as_str()), Some("above"));
    }

    #[test]
    fn test_miss_returns_none() {
        let mut set = SpriteSet::points(10);
        set.set_data(
            vec![create_test_quake("solo", 100.0, 50.0)],
            identity_projector(),
        );
        while set.update(0.5) {}

        assert!(set.pick_surface().hit_test(500.0, 500.0).is_none());
    }

    #[test]
    fn test_returns_original_feature_record() {
        let mut set = SpriteSet::points(10);
        let feature = create_test_quake("solo", 100.0, 50.0);
        set.set_data(vec![feature.clone()], identity_projector());
        while set.update(0.5) {}

        let hit = set.pick_surface().hit_test(100.0, 50.0).unwrap();
        assert_eq!(hit, &feature);
    }

    #[test]
    fn test_destroyed_slot_never_picked() {
        let mut set = SpriteSet::points(10);
        set.set_data(
            vec![
                create_test_quake("kept", 100.0, 50.0),
                create_test_quake("gone", 100.0, 50.0),
            ],
            identity_projector(),
        );
        while set.update(0.5) {}

        set.set_data(
            vec![create_test_quake("kept", 100.0, 50.0)],
            identity_projector(),
        );
        set.update(0.0);

        let hit = set.pick_surface().hit_test(100.0, 50.0);
        assert_eq!(hit.map(|f| f.id.as_str()), Some("kept"));
    }
}
