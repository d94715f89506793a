//! Fixed-capacity parallel attribute arrays backing the GPU sprite buffer.
//!
//! Every array is preallocated once at construction and never grows; the
//! logical "active length" lives with the owning sprite set. Contents at
//! indices past the active length stay zeroed, so stale slots read as
//! size 0 and never render.

/// One contiguous per-slot attribute array with a dirty flag for upload.
#[derive(Debug)]
pub struct AttributeArray {
    data: Vec<f32>,
    stride: usize,
    dirty: bool,
}

impl AttributeArray {
    /// Preallocates a zero-filled array for `capacity` slots.
    pub fn new(capacity: usize, stride: usize) -> Self {
        Self {
            data: vec![0.0; capacity * stride],
            stride,
            dirty: false,
        }
    }

    /// Number of f32 components per slot.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Writes one slot's components.
    ///
    /// A no-op when the slot already holds exactly `values`, so redundant
    /// writes never flag the array for re-upload.
    pub fn write(&mut self, idx: usize, values: &[f32]) {
        debug_assert_eq!(values.len(), self.stride);
        let start = idx * self.stride;
        let slot = &mut self.data[start..start + self.stride];
        if slot == values {
            return;
        }
        slot.copy_from_slice(values);
        self.dirty = true;
    }

    /// Reads one slot's components.
    pub fn get(&self, idx: usize) -> &[f32] {
        let start = idx * self.stride;
        &self.data[start..start + self.stride]
    }

    /// Reads a single-component slot.
    pub fn scalar(&self, idx: usize) -> f32 {
        debug_assert_eq!(self.stride, 1);
        self.data[idx]
    }

    /// Whether the array changed since the last upload.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns the dirty flag and clears it. Called by the uploader.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    /// Raw backing storage, for GPU upload.
    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

/// The parallel attribute arrays of one sprite set.
///
/// Two layouts exist, matching the two sprite flavors: isotropic sprites
/// carry a per-slot date scalar, directional sprites a per-slot direction
/// vector. Both share position, color, and size.
#[derive(Debug)]
pub struct SpriteAttributes {
    capacity: usize,
    /// Screen-space position, 3 components per slot
    pub position: AttributeArray,
    /// Direction vector, 3 per slot (directional layout only)
    pub direction: Option<AttributeArray>,
    /// RGBA color, 4 per slot
    pub color: AttributeArray,
    /// Point size in pixels, 1 per slot; size 0 means invisible
    pub size: AttributeArray,
    /// Event time in epoch seconds, 1 per slot (isotropic layout only)
    pub date: Option<AttributeArray>,
}

impl SpriteAttributes {
    /// Layout for isotropic point sprites (earthquakes, volcanoes).
    pub fn isotropic(capacity: usize) -> Self {
        Self {
            capacity,
            position: AttributeArray::new(capacity, 3),
            direction: None,
            color: AttributeArray::new(capacity, 4),
            size: AttributeArray::new(capacity, 1),
            date: Some(AttributeArray::new(capacity, 1)),
        }
    }

    /// Layout for oriented arrow sprites (plate movement).
    pub fn directional(capacity: usize) -> Self {
        Self {
            capacity,
            position: AttributeArray::new(capacity, 3),
            direction: Some(AttributeArray::new(capacity, 3)),
            color: AttributeArray::new(capacity, 4),
            size: AttributeArray::new(capacity, 1),
            date: None,
        }
    }

    /// Maximum number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether any array needs re-upload.
    pub fn any_dirty(&self) -> bool {
        self.position.is_dirty()
            || self.color.is_dirty()
            || self.size.is_dirty()
            || self.direction.as_ref().map(AttributeArray::is_dirty) == Some(true)
            || self.date.as_ref().map(AttributeArray::is_dirty) == Some(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_marks_dirty_once() {
        let mut array = AttributeArray::new(8, 3);
        assert!(!array.is_dirty());

        array.write(2, &[1.0, 2.0, 3.0]);
        assert!(array.is_dirty());
        assert_eq!(array.get(2), &[1.0, 2.0, 3.0]);

        assert!(array.take_dirty());
        array.write(2, &[1.0, 2.0, 3.0]);
        assert!(!array.is_dirty(), "identical write must not re-flag");

        array.write(2, &[1.0, 2.0, 4.0]);
        assert!(array.is_dirty());
    }

    #[test]
    fn test_unwritten_slots_read_as_invisible() {
        let attrs = SpriteAttributes::isotropic(16);
        for idx in 0..16 {
            assert_eq!(attrs.size.scalar(idx), 0.0);
        }
    }

    #[test]
    fn test_layouts() {
        let iso = SpriteAttributes::isotropic(4);
        assert!(iso.direction.is_none());
        assert!(iso.date.is_some());
        assert_eq!(iso.color.stride(), 4);

        let dir = SpriteAttributes::directional(4);
        assert!(dir.direction.is_some());
        assert!(dir.date.is_none());
        assert_eq!(dir.capacity(), 4);
    }

    #[test]
    fn test_any_dirty_covers_optional_arrays() {
        let mut attrs = SpriteAttributes::directional(4);
        assert!(!attrs.any_dirty());
        attrs
            .direction
            .as_mut()
            .unwrap()
            .write(0, &[1.0, 0.0, 0.0]);
        assert!(attrs.any_dirty());
    }
}
