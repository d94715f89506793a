//! Procedurally drawn glyph textures.
//!
//! Each sprite set owns exactly one glyph, shared by all of its sprites:
//! a rimmed disc for earthquakes and volcanoes, a stroked arrow for plate
//! movement. Glyphs are rasterized on the CPU into an RGBA buffer that the
//! renderer uploads once at construction.

/// Pixel width/height of a glyph texture.
const GLYPH_SIZE: usize = 128;

/// A square RGBA glyph image.
#[derive(Debug, Clone)]
pub struct GlyphImage {
    size: usize,
    pixels: Vec<u8>,
}

impl GlyphImage {
    /// Width/height in pixels.
    pub fn size(&self) -> usize {
        self.size
    }

    /// RGBA pixel data, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Alpha of the pixel at (x, y).
    pub fn alpha_at(&self, x: usize, y: usize) -> u8 {
        self.pixels[(y * self.size + x) * 4 + 3]
    }

    /// Filled white disc with a dark rim, the base shape for isotropic
    /// point sprites. Color comes from the per-slot color attribute.
    pub fn circle() -> Self {
        let size = GLYPH_SIZE;
        let mut pixels = vec![0u8; size * size * 4];

        let center = size as f32 / 2.0;
        let stroke = size as f32 * 0.06;
        let radius = center - stroke / 2.0;

        for y in 0..size {
            for x in 0..size {
                let dx = x as f32 + 0.5 - center;
                let dy = y as f32 + 0.5 - center;
                let dist = (dx * dx + dy * dy).sqrt();

                // Signed distance from the disc edge, >0 outside.
                let edge = dist - radius;
                let coverage = (0.5 - edge).clamp(0.0, 1.0);
                if coverage == 0.0 {
                    continue;
                }

                // Dark rim within one stroke width of the edge.
                let rim = (1.0 + edge / stroke).clamp(0.0, 1.0);
                let fill = (255.0 * (1.0 - rim * 0.85)) as u8;

                let idx = (y * size + x) * 4;
                pixels[idx] = fill;
                pixels[idx + 1] = fill;
                pixels[idx + 2] = fill;
                pixels[idx + 3] = (coverage * 255.0) as u8;
            }
        }

        Self { size, pixels }
    }

    /// Stroked arrow (shaft plus open head) pointing along +x, the base
    /// shape for directional sprites. The shader rotates it to the slot's
    /// direction vector.
    pub fn arrow() -> Self {
        let size = GLYPH_SIZE;
        let mut pixels = vec![0u8; size * size * 4];

        let half_width = size as f32 * 0.05;
        let margin = size as f32 * 0.15;
        let mid = size as f32 / 2.0;

        let tail = [margin, mid];
        let tip = [size as f32 - margin, mid];
        let head_len = size as f32 * 0.2;
        // Open head: two strokes at 30 degrees off the shaft.
        let barb_up = [
            tip[0] - head_len * (30f32).to_radians().cos(),
            tip[1] - head_len * (30f32).to_radians().sin(),
        ];
        let barb_down = [
            tip[0] - head_len * (30f32).to_radians().cos(),
            tip[1] + head_len * (30f32).to_radians().sin(),
        ];

        let strokes = [[tail, tip], [tip, barb_up], [tip, barb_down]];

        for y in 0..size {
            for x in 0..size {
                let p = [x as f32 + 0.5, y as f32 + 0.5];
                let dist = strokes
                    .iter()
                    .map(|s| segment_distance(p, s[0], s[1]))
                    .fold(f32::INFINITY, f32::min);

                let coverage = (half_width + 0.5 - dist).clamp(0.0, 1.0);
                if coverage == 0.0 {
                    continue;
                }

                let idx = (y * size + x) * 4;
                pixels[idx] = 255;
                pixels[idx + 1] = 255;
                pixels[idx + 2] = 255;
                pixels[idx + 3] = (coverage * 255.0) as u8;
            }
        }

        Self { size, pixels }
    }
}

/// Distance from point `p` to the segment `a`-`b`.
fn segment_distance(p: [f32; 2], a: [f32; 2], b: [f32; 2]) -> f32 {
    let ab = [b[0] - a[0], b[1] - a[1]];
    let ap = [p[0] - a[0], p[1] - a[1]];
    let len_sq = ab[0] * ab[0] + ab[1] * ab[1];
    let t = if len_sq > 0.0 {
        ((ap[0] * ab[0] + ap[1] * ab[1]) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let closest = [a[0] + ab[0] * t, a[1] + ab[1] * t];
    let dx = p[0] - closest[0];
    let dy = p[1] - closest[1];
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_opaque_center_transparent_corner() {
        let glyph = GlyphImage::circle();
        let mid = glyph.size() / 2;
        assert_eq!(glyph.alpha_at(mid, mid), 255);
        assert_eq!(glyph.alpha_at(0, 0), 0);
        assert_eq!(glyph.pixels().len(), glyph.size() * glyph.size() * 4);
    }

    #[test]
    fn test_circle_has_dark_rim() {
        let glyph = GlyphImage::circle();
        let mid = glyph.size() / 2;
        // Just inside the right edge lies on the rim; the center does not.
        let rim_x = glyph.size() - 4;
        assert!(glyph.pixels()[(mid * glyph.size() + rim_x) * 4] < 128);
        assert_eq!(glyph.pixels()[(mid * glyph.size() + mid) * 4], 255);
    }

    #[test]
    fn test_arrow_covers_shaft_not_edges() {
        let glyph = GlyphImage::arrow();
        let mid = glyph.size() / 2;
        assert!(glyph.alpha_at(mid, mid) > 0, "shaft runs through center");
        assert_eq!(glyph.alpha_at(mid, 0), 0, "top edge empty");
        assert_eq!(glyph.alpha_at(0, 0), 0);
    }
}
