//! Sprite set: buffer ownership, reconciliation, and frame updates.
//!
//! A sprite set owns one fixed-capacity attribute buffer, the shared glyph
//! image, and an ordered collection of sprites index-aligned with the
//! buffer. Incoming feature lists are staged by `set_data` and reconciled
//! against the currently rendered sprites on the next `update` call, so
//! bursts of rapid calls coalesce into a single reconciliation per frame.

use crate::data::{Feature, GeoPosition};
use crate::sprites::attributes::SpriteAttributes;
use crate::sprites::pick::PickSurface;
use crate::sprites::sprite::{ArrowSprite, PointSprite, Sprite};
use crate::sprites::texture::GlyphImage;
use glam::Vec3;

/// Owns an attribute buffer and the sprites rendered into it.
pub struct SpriteSet<S: Sprite> {
    attrs: SpriteAttributes,
    sprites: Vec<S>,
    glyph: GlyphImage,
    projector: Option<Box<dyn Fn(GeoPosition) -> Vec3>>,
    pending: Option<Vec<Feature>>,
    last_dropped: usize,
}

impl SpriteSet<PointSprite> {
    /// Sprite set for isotropic point sprites (earthquakes, volcanoes).
    pub fn points(capacity: usize) -> Self {
        Self::with_parts(SpriteAttributes::isotropic(capacity), GlyphImage::circle())
    }
}

impl SpriteSet<ArrowSprite> {
    /// Sprite set for oriented arrow sprites (plate movement).
    pub fn arrows(capacity: usize) -> Self {
        Self::with_parts(SpriteAttributes::directional(capacity), GlyphImage::arrow())
    }
}

impl<S: Sprite> SpriteSet<S> {
    fn with_parts(attrs: SpriteAttributes, glyph: GlyphImage) -> Self {
        Self {
            attrs,
            sprites: Vec::new(),
            glyph,
            projector: None,
            pending: None,
            last_dropped: 0,
        }
    }

    /// Maximum number of renderable sprites.
    pub fn capacity(&self) -> usize {
        self.attrs.capacity()
    }

    /// Number of currently active sprites (the buffer's active length).
    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    /// Whether no sprites are active.
    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    /// The active sprites, index-aligned with the buffer.
    pub fn sprites(&self) -> &[S] {
        &self.sprites
    }

    /// The attribute buffer.
    pub fn attributes(&self) -> &SpriteAttributes {
        &self.attrs
    }

    /// Mutable attribute buffer access, used by the renderer to consume
    /// dirty flags at upload time.
    pub fn attributes_mut(&mut self) -> &mut SpriteAttributes {
        &mut self.attrs
    }

    /// The glyph image shared by all sprites of this set.
    pub fn glyph(&self) -> &GlyphImage {
        &self.glyph
    }

    /// Number of features dropped by the most recent reconciliation's
    /// capacity truncation, zero when everything fit.
    pub fn last_dropped(&self) -> usize {
        self.last_dropped
    }

    /// Stages a feature list and projector for the next `update` call.
    ///
    /// Never mutates rendering state synchronously; repeated calls before a
    /// frame replace the staged list, paying for one reconciliation only.
    pub fn set_data(
        &mut self,
        features: Vec<Feature>,
        projector: impl Fn(GeoPosition) -> Vec3 + 'static,
    ) {
        self.pending = Some(features);
        self.projector = Some(Box::new(projector));
    }

    /// Re-projects every active sprite through a new projector.
    ///
    /// Invoked when the map viewport changes without a change to the
    /// underlying features; O(active length), leaves counts, ids, and
    /// visibility targets untouched.
    pub fn invalidate_positions(&mut self, projector: impl Fn(GeoPosition) -> Vec3 + 'static) {
        let projector: Box<dyn Fn(GeoPosition) -> Vec3> = Box::new(projector);
        let Self { attrs, sprites, .. } = self;
        for sprite in sprites.iter_mut() {
            sprite.reproject(attrs, &*projector);
        }
        self.projector = Some(projector);
    }

    /// Performs any pending reconciliation, then advances every sprite's
    /// transition by `progress`.
    ///
    /// Returns whether any sprite is still mid-transition, which callers
    /// use to keep scheduling frames. Reconciliation always precedes
    /// transition advancement, so a newly created sprite's first visible
    /// state reflects its correct target.
    pub fn update(&mut self, progress: f32) -> bool {
        self.process_pending();
        let Self { attrs, sprites, .. } = self;
        let mut in_transition = false;
        for sprite in sprites.iter_mut() {
            in_transition |= sprite.update(attrs, progress);
        }
        in_transition
    }

    /// Hit-testing view over the current sprites.
    pub fn pick_surface(&self) -> PickSurface<'_, S> {
        PickSurface::new(&self.sprites, &self.attrs)
    }

    /// Reconciles the staged feature list against the rendered sprites.
    ///
    /// Positional diff: the sprite at index `i` is compared to the new
    /// feature at index `i`. A matching id is reused in place; anything
    /// else is replaced. Indices past the new list's length are destroyed
    /// and the active length shrinks.
    fn process_pending(&mut self) {
        let Some(mut features) = self.pending.take() else {
            return;
        };

        let before = features.len();
        features.retain(Feature::is_well_formed);
        if features.len() < before {
            log::warn!(
                "Skipping {} malformed feature record(s)",
                before - features.len()
            );
        }

        let capacity = self.attrs.capacity();
        if features.len() > capacity {
            log::warn!(
                "Too many features ({} > capacity {}); the excess will not be displayed",
                features.len(),
                capacity
            );
            self.last_dropped = features.len() - capacity;
            features.truncate(capacity);
        } else {
            self.last_dropped = 0;
        }

        let Self {
            attrs,
            sprites,
            projector,
            ..
        } = self;
        let Some(projector) = projector.as_deref() else {
            return;
        };

        let new_len = features.len();
        for (i, feature) in features.into_iter().enumerate() {
            match sprites.get_mut(i) {
                Some(existing) if existing.id() == feature.id => {
                    let visible = feature.visible;
                    existing.core_mut().replace_feature(feature);
                    existing.core_mut().set_target_visibility(visible);
                    existing.reproject(attrs, projector);
                }
                Some(slot) => {
                    *slot = S::create(feature, i, attrs, projector);
                }
                None => {
                    sprites.push(S::create(feature, i, attrs, projector));
                }
            }
        }

        for sprite in sprites.iter_mut().skip(new_len) {
            sprite.destroy(attrs);
        }
        sprites.truncate(new_len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FeatureProperties;
    use chrono::{TimeZone, Utc};

    fn create_test_quake(id: &str, lng: f64, lat: f64) -> Feature {
        Feature {
            id: id.to_string(),
            position: GeoPosition::new(lng, lat),
            visible: true,
            properties: FeatureProperties::Earthquake {
                magnitude: 5.5,
                date: Utc.with_ymd_and_hms(2014, 8, 24, 10, 20, 44).unwrap(),
                color: 0xFFAA00,
            },
        }
    }

    fn identity_projector() -> impl Fn(GeoPosition) -> Vec3 + 'static {
        |p: GeoPosition| Vec3::new(p.lng as f32, p.lat as f32, 0.0)
    }

    #[test]
    fn test_active_count_matches_input() {
        let mut set = SpriteSet::points(100);
        let features: Vec<_> = (0..10)
            .map(|i| create_test_quake(&format!("eq-{}", i), i as f64, 0.0))
            .collect();
        set.set_data(features, identity_projector());
        assert_eq!(set.len(), 0, "set_data stages only");

        set.update(0.1);
        assert_eq!(set.len(), 10);
        assert_eq!(set.last_dropped(), 0);
    }

    #[test]
    fn test_capacity_truncation_keeps_head() {
        let mut set = SpriteSet::points(5);
        let features: Vec<_> = (0..8)
            .map(|i| create_test_quake(&format!("eq-{}", i), i as f64, 0.0))
            .collect();
        set.set_data(features, identity_projector());
        set.update(0.1);

        assert_eq!(set.len(), 5);
        assert_eq!(set.last_dropped(), 3);
        // Tail-drop: the first five input features survive, in order.
        for (i, sprite) in set.sprites().iter().enumerate() {
            assert_eq!(sprite.id(), format!("eq-{}", i));
        }
    }

    #[test]
    fn test_positional_reconciliation_shrink() {
        let mut set = SpriteSet::points(10);
        let abc = vec![
            create_test_quake("A", 0.0, 0.0),
            create_test_quake("B", 1.0, 0.0),
            create_test_quake("C", 2.0, 0.0),
        ];
        set.set_data(abc.clone(), identity_projector());
        // Run transitions to completion so reuse is observable.
        while set.update(0.5) {}
        let transition_a = set.sprites()[0].core().transition();
        assert_eq!(transition_a, 1.0);
        assert!(set.attributes().size.scalar(2) > 0.0);

        set.set_data(abc[..2].to_vec(), identity_projector());
        set.update(0.0);

        assert_eq!(set.len(), 2);
        // Index 2 was destroyed: its slot reads invisible.
        assert_eq!(set.attributes().size.scalar(2), 0.0);
        // Indices 0 and 1 were reused in place, transitions intact.
        assert_eq!(set.sprites()[0].core().transition(), 1.0);
        assert_eq!(set.sprites()[1].core().transition(), 1.0);
    }

    #[test]
    fn test_rank_shift_recreates_sprite() {
        let mut set = SpriteSet::points(10);
        set.set_data(
            vec![
                create_test_quake("A", 0.0, 0.0),
                create_test_quake("B", 1.0, 0.0),
            ],
            identity_projector(),
        );
        while set.update(0.5) {}

        // B moves to rank 0: positional diff treats it as a new sprite.
        set.set_data(vec![create_test_quake("B", 1.0, 0.0)], identity_projector());
        set.update(0.0);
        assert_eq!(set.sprites()[0].id(), "B");
        assert_eq!(
            set.sprites()[0].core().transition(),
            0.0,
            "recreated sprite restarts its fade"
        );
    }

    #[test]
    fn test_set_data_calls_coalesce() {
        let mut set = SpriteSet::points(10);
        set.set_data(
            vec![create_test_quake("old", 0.0, 0.0)],
            identity_projector(),
        );
        set.set_data(
            vec![
                create_test_quake("new-0", 0.0, 0.0),
                create_test_quake("new-1", 1.0, 0.0),
            ],
            identity_projector(),
        );
        set.update(0.1);

        assert_eq!(set.len(), 2, "only the last staged list is reconciled");
        assert_eq!(set.sprites()[0].id(), "new-0");
    }

    #[test]
    fn test_viewport_only_invalidation() {
        let mut set = SpriteSet::points(10);
        set.set_data(
            vec![
                create_test_quake("A", 10.0, 20.0),
                create_test_quake("B", 30.0, 40.0),
            ],
            identity_projector(),
        );
        set.update(0.1);
        assert_eq!(set.attributes().position.get(0), &[10.0, 20.0, 0.0]);

        set.invalidate_positions(|p: GeoPosition| {
            Vec3::new(p.lng as f32 * 2.0, p.lat as f32 * 2.0, 0.0)
        });

        assert_eq!(set.len(), 2);
        assert_eq!(set.sprites()[0].id(), "A");
        assert_eq!(set.attributes().position.get(0), &[20.0, 40.0, 0.0]);
        assert_eq!(set.attributes().position.get(1), &[60.0, 80.0, 0.0]);
    }

    #[test]
    fn test_malformed_features_filtered_not_fatal() {
        let mut set = SpriteSet::points(10);
        let mut bad = create_test_quake("bad", 0.0, 0.0);
        bad.position.lng = f64::NAN;
        set.set_data(
            vec![
                create_test_quake("good-0", 0.0, 0.0),
                bad,
                create_test_quake("good-1", 1.0, 0.0),
            ],
            identity_projector(),
        );
        set.update(0.1);

        assert_eq!(set.len(), 2);
        assert_eq!(set.sprites()[1].id(), "good-1");
    }

    #[test]
    fn test_visibility_flag_drives_target() {
        let mut set = SpriteSet::points(10);
        let mut feature = create_test_quake("A", 0.0, 0.0);
        set.set_data(vec![feature.clone()], identity_projector());
        while set.update(0.5) {}
        assert!(set.attributes().size.scalar(0) > 0.0);

        feature.visible = false;
        set.set_data(vec![feature], identity_projector());
        let still = set.update(0.5);
        assert!(still, "fade-out in progress");
        while set.update(0.5) {}
        assert_eq!(set.attributes().size.scalar(0), 0.0);
        assert_eq!(set.len(), 1, "invisible features keep their slot");
    }

    #[test]
    fn test_arrow_set_reconciles_direction() {
        let mut set = SpriteSet::arrows(10);
        let arrow = Feature {
            id: "pm-0".to_string(),
            position: GeoPosition::new(5.0, 6.0),
            visible: true,
            properties: FeatureProperties::PlateMovement {
                velocity: Vec3::new(12.0, -3.0, 0.0),
            },
        };
        set.set_data(vec![arrow], identity_projector());
        set.update(0.1);

        assert_eq!(set.len(), 1);
        assert_eq!(
            set.attributes().direction.as_ref().unwrap().get(0),
            &[12.0, -3.0, 0.0]
        );
    }
}
