//! GPU point-sprite engine for seismic visualization.
//!
//! Renders large, frequently-updated sets of geospatial point features
//! (earthquakes, volcanoes, plate-movement arrows) as GPU point sprites
//! over a pannable/zoomable map, with fade transitions and pixel-accurate
//! hit-testing.
//!
//! Typical flow:
//!
//! ```
//! use seismic_sprites::data::{parse_features, GeoPosition};
//! use seismic_sprites::geo::MapProjection;
//! use seismic_sprites::sprites::SpriteSet;
//!
//! let features = parse_features(
//!     r#"[{ "id": "us10005i1a",
//!           "position": { "lng": 142.8, "lat": 38.3 },
//!           "kind": "earthquake",
//!           "magnitude": 6.9,
//!           "date": "2016-04-16T23:58:36Z",
//!           "color": 16737792 }]"#,
//! )
//! .unwrap();
//!
//! let projection = MapProjection::new(140.0, 38.0, 5.0);
//! let mut earthquakes = SpriteSet::points(200_000);
//! earthquakes.set_data(features, projection.projector());
//!
//! // Render loop: reconcile + advance transitions, then upload and draw
//! // through a `SpriteRenderer` when a GL context is available.
//! while earthquakes.update(0.05) {}
//!
//! // Pointer events: pick the topmost feature under the cursor.
//! let point = projection.geo_to_screen(GeoPosition::new(142.8, 38.3));
//! assert!(earthquakes.pick_surface().hit_test(point.x, point.y).is_some());
//! ```

pub mod data;
pub mod geo;
pub mod sprites;

pub use data::{Feature, FeatureProperties, GeoPosition};
pub use sprites::{ArrowSprite, PickSurface, PointSprite, SpriteRenderer, SpriteSet};
