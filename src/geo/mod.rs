//! Geographic coordinate helpers.
//!
//! Provides the web-mercator [`MapProjection`] used to build projector
//! closures for sprite sets. The map widget collaborator may substitute any
//! projection of its own; the sprite engine only sees a pure function from
//! geographic position to screen point.

mod projection;

pub use projection::MapProjection;
