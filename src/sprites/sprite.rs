//! Sprite handles bound to attribute-buffer slots.
//!
//! A sprite writes into the parallel attribute arrays on behalf of one
//! feature, tracks its own visibility transition, and answers hit-test
//! queries against its slot. Two flavors share the slot contract: isotropic
//! point sprites for earthquakes and volcanoes, oriented arrow sprites for
//! plate movement.

use crate::data::{Feature, GeoPosition};
use crate::sprites::attributes::SpriteAttributes;
use glam::Vec3;

/// Hit radius as a fraction of the rendered point size.
pub const HIT_RADIUS_FACTOR: f32 = 0.25;

/// Projector contract supplied by the map-widget collaborator: a pure,
/// synchronously-callable function from geographic position to screen point.
pub type ProjectorFn = dyn Fn(GeoPosition) -> Vec3;

/// Visibility phase derived from transition progress and target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityPhase {
    FadingIn,
    Visible,
    FadingOut,
    /// Fully faded out with an invisible target. The only phase from which
    /// a slot may be reassigned without visual discontinuity.
    Inert,
}

/// Shared slot bookkeeping for both sprite flavors.
///
/// Holds the slot index, the feature last rendered into it, the transition
/// state, and per-attribute last-value caches that skip buffer writes when
/// a value is unchanged.
#[derive(Debug)]
pub struct SpriteCore {
    idx: usize,
    feature: Feature,
    target_visibility: f32,
    transition: f32,
    old_point: Option<Vec3>,
    old_direction: Option<Vec3>,
    old_color: Option<u32>,
    old_size: Option<f32>,
    old_date: Option<f32>,
}

impl SpriteCore {
    /// Binds a feature to a slot. Transition starts at zero so new sprites
    /// fade in toward their target.
    pub fn new(feature: Feature, idx: usize) -> Self {
        let target_visibility = if feature.visible { 1.0 } else { 0.0 };
        Self {
            idx,
            feature,
            target_visibility,
            transition: 0.0,
            old_point: None,
            old_direction: None,
            old_color: None,
            old_size: None,
            old_date: None,
        }
    }

    /// Slot index into the parallel attribute arrays.
    pub fn idx(&self) -> usize {
        self.idx
    }

    /// The feature this sprite currently renders.
    pub fn feature(&self) -> &Feature {
        &self.feature
    }

    /// Current transition progress in [0, 1].
    pub fn transition(&self) -> f32 {
        self.transition
    }

    /// Target visibility, 0.0 or 1.0.
    pub fn target_visibility(&self) -> f32 {
        self.target_visibility
    }

    /// Sets the visibility target for the next transition frames.
    pub fn set_target_visibility(&mut self, visible: bool) {
        self.target_visibility = if visible { 1.0 } else { 0.0 };
    }

    /// Swaps in a fresh feature record for a slot reused in place.
    ///
    /// Attribute caches are kept, so unchanged values still skip their
    /// buffer writes after the swap.
    pub fn replace_feature(&mut self, feature: Feature) {
        self.feature = feature;
    }

    /// Current visibility phase.
    pub fn phase(&self) -> VisibilityPhase {
        if self.transition == self.target_visibility {
            if self.target_visibility == 0.0 {
                VisibilityPhase::Inert
            } else {
                VisibilityPhase::Visible
            }
        } else if self.transition < self.target_visibility {
            VisibilityPhase::FadingIn
        } else {
            VisibilityPhase::FadingOut
        }
    }

    /// Moves `transition` toward the target, bounded by `progress`.
    ///
    /// Returns whether the sprite is still mid-transition afterwards. The
    /// move is monotonic and lands exactly on the target, never beyond it.
    pub fn advance(&mut self, progress: f32) -> bool {
        let step = progress.max(0.0);
        if self.transition < self.target_visibility {
            self.transition = (self.transition + step).min(self.target_visibility);
        } else if self.transition > self.target_visibility {
            self.transition = (self.transition - step).max(self.target_visibility);
        }
        self.transition != self.target_visibility
    }

    /// Forces the slot inert. Used when a sprite is destroyed so the slot
    /// can be reassigned immediately.
    pub fn force_inert(&mut self) {
        self.transition = 0.0;
        self.target_visibility = 0.0;
    }

    /// Writes the screen-space position, skipping the buffer if unchanged.
    pub fn set_position_attr(&mut self, attrs: &mut SpriteAttributes, point: Vec3) {
        if self.old_point == Some(point) {
            return;
        }
        attrs.position.write(self.idx, &point.to_array());
        self.old_point = Some(point);
    }

    /// Writes the direction vector, skipping the buffer if unchanged.
    pub fn set_direction_attr(&mut self, attrs: &mut SpriteAttributes, dir: Vec3) {
        if self.old_direction == Some(dir) {
            return;
        }
        if let Some(direction) = attrs.direction.as_mut() {
            direction.write(self.idx, &dir.to_array());
        }
        self.old_direction = Some(dir);
    }

    /// Writes the color as RGBA, skipping the buffer if unchanged.
    pub fn set_color_attr(&mut self, attrs: &mut SpriteAttributes, color: u32) {
        if self.old_color == Some(color) {
            return;
        }
        attrs.color.write(self.idx, &rgba_from_hex(color));
        self.old_color = Some(color);
    }

    /// Writes the point size, skipping the buffer if unchanged.
    pub fn set_size_attr(&mut self, attrs: &mut SpriteAttributes, size: f32) {
        if self.old_size == Some(size) {
            return;
        }
        attrs.size.write(self.idx, &[size]);
        self.old_size = Some(size);
    }

    /// Writes the event-date scalar, skipping the buffer if unchanged.
    pub fn set_date_attr(&mut self, attrs: &mut SpriteAttributes, date: f32) {
        if self.old_date == Some(date) {
            return;
        }
        if let Some(dates) = attrs.date.as_mut() {
            dates.write(self.idx, &[date]);
        }
        self.old_date = Some(date);
    }
}

/// Expands a 0xRRGGBB color into RGBA components with full alpha.
fn rgba_from_hex(color: u32) -> [f32; 4] {
    [
        ((color >> 16) & 0xFF) as f32 / 255.0,
        ((color >> 8) & 0xFF) as f32 / 255.0,
        (color & 0xFF) as f32 / 255.0,
        1.0,
    ]
}

/// The buffer-slot contract shared by both sprite flavors.
pub trait Sprite: Sized {
    /// Constructs a sprite bound to slot `idx` and writes its initial
    /// attributes through `projector`.
    fn create(
        feature: Feature,
        idx: usize,
        attrs: &mut SpriteAttributes,
        projector: &ProjectorFn,
    ) -> Self;

    fn core(&self) -> &SpriteCore;

    fn core_mut(&mut self) -> &mut SpriteCore;

    /// Rewrites position-derived attributes through a new projector,
    /// without touching visibility state.
    fn reproject(&mut self, attrs: &mut SpriteAttributes, projector: &ProjectorFn);

    /// The id of the feature bound to this slot.
    fn id(&self) -> &str {
        &self.core().feature().id
    }

    /// The feature bound to this slot.
    fn feature(&self) -> &Feature {
        self.core().feature()
    }

    /// Advances the visibility transition and writes the size attribute.
    ///
    /// Returns whether the sprite is still mid-transition.
    fn update(&mut self, attrs: &mut SpriteAttributes, progress: f32) -> bool {
        let in_transition = self.core_mut().advance(progress);
        let size = self.core().feature().base_size() * self.core().transition();
        self.core_mut().set_size_attr(attrs, size);
        in_transition
    }

    /// Checks whether the screen point (x, y) hits the rendered shape.
    ///
    /// Radius derives from the current size attribute; a size of zero never
    /// hits, which makes destroyed and invisible slots safe to query.
    fn hit_test(&self, attrs: &SpriteAttributes, x: f32, y: f32) -> bool {
        let idx = self.core().idx();
        let radius = attrs.size.scalar(idx) * HIT_RADIUS_FACTOR;
        if radius == 0.0 {
            return false;
        }
        let pos = attrs.position.get(idx);
        let dx = pos[0] - x;
        let dy = pos[1] - y;
        dx * dx + dy * dy <= radius * radius
    }

    /// Marks the slot visually inert by zeroing its size attribute.
    ///
    /// Index bookkeeping stays with the owning sprite set.
    fn destroy(&mut self, attrs: &mut SpriteAttributes) {
        let core = self.core_mut();
        core.force_inert();
        core.set_size_attr(attrs, 0.0);
    }
}

/// Isotropic point sprite for earthquakes and volcanoes.
#[derive(Debug)]
pub struct PointSprite {
    core: SpriteCore,
}

impl Sprite for PointSprite {
    fn create(
        feature: Feature,
        idx: usize,
        attrs: &mut SpriteAttributes,
        projector: &ProjectorFn,
    ) -> Self {
        let mut core = SpriteCore::new(feature, idx);
        let point = projector(core.feature().position);
        core.set_position_attr(attrs, point);
        core.set_color_attr(attrs, core.feature().color());
        if let Some(date) = core.feature().date_seconds() {
            core.set_date_attr(attrs, date);
        }
        core.set_size_attr(attrs, 0.0);
        Self { core }
    }

    fn core(&self) -> &SpriteCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SpriteCore {
        &mut self.core
    }

    fn reproject(&mut self, attrs: &mut SpriteAttributes, projector: &ProjectorFn) {
        let point = projector(self.core.feature().position);
        self.core.set_position_attr(attrs, point);
    }
}

/// Oriented arrow sprite for plate-movement samples.
#[derive(Debug)]
pub struct ArrowSprite {
    core: SpriteCore,
}

impl Sprite for ArrowSprite {
    fn create(
        feature: Feature,
        idx: usize,
        attrs: &mut SpriteAttributes,
        projector: &ProjectorFn,
    ) -> Self {
        let mut core = SpriteCore::new(feature, idx);
        let point = projector(core.feature().position);
        let velocity = core.feature().velocity().unwrap_or(Vec3::ZERO);
        core.set_position_attr(attrs, point);
        core.set_direction_attr(attrs, velocity);
        core.set_color_attr(attrs, core.feature().color());
        core.set_size_attr(attrs, 0.0);
        Self { core }
    }

    fn core(&self) -> &SpriteCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SpriteCore {
        &mut self.core
    }

    fn reproject(&mut self, attrs: &mut SpriteAttributes, projector: &ProjectorFn) {
        let point = projector(self.core.feature().position);
        let velocity = self.core.feature().velocity().unwrap_or(Vec3::ZERO);
        self.core.set_position_attr(attrs, point);
        self.core.set_direction_attr(attrs, velocity);
    }
}
