//! Point-sprite buffer management engine.
//!
//! This module is the core of the crate:
//! - `attributes`: fixed-capacity parallel GPU attribute arrays with dirty
//!   tracking
//! - `sprite`: per-slot handles, the visibility transition machine, and the
//!   isotropic/directional sprite flavors
//! - `sprite_set`: buffer ownership, staged data reconciliation, and
//!   frame-by-frame transition updates
//! - `pick`: reverse-draw-order hit-testing
//! - `texture`: procedurally drawn glyphs shared per sprite set
//! - `render`: the glow shader pipeline uploading and drawing the buffers

mod attributes;
mod pick;
mod render;
mod sprite;
mod sprite_set;
mod texture;

pub use attributes::{AttributeArray, SpriteAttributes};
pub use pick::PickSurface;
pub use render::SpriteRenderer;
pub use sprite::{
    ArrowSprite, PointSprite, Sprite, SpriteCore, VisibilityPhase, HIT_RADIUS_FACTOR,
};
pub use sprite_set::SpriteSet;
pub use texture::GlyphImage;
