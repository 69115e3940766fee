//! Flat storage for the ragged per-instance foreground point sets.
//!
//! All valid instances' pixels are concatenated into one buffer; `offsets`
//! records where each instance starts so results can be split back per
//! instance without nested containers. The [`ValidityMask`] remembers which
//! batch instances made it into the arena and re-expands per-slot results to
//! the full batch.
use crate::field::InstanceMask;
use nalgebra::Point2;

/// Integer pixel coordinate in mask indexing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pixel {
    pub row: usize,
    pub col: usize,
}

impl Pixel {
    /// Pixel position in the internal `(x = col, y = row)` frame.
    #[inline]
    pub fn to_point(self) -> Point2<f32> {
        Point2::new(self.col as f32, self.row as f32)
    }
}

/// Batch instances with at least two foreground pixels.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidityMask {
    batch: usize,
    valid: Vec<usize>,
}

impl ValidityMask {
    pub fn batch_size(&self) -> usize {
        self.batch
    }

    /// Batch indices of the valid instances, in slot order.
    pub fn indices(&self) -> &[usize] {
        &self.valid
    }

    pub fn num_valid(&self) -> usize {
        self.valid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.valid.is_empty()
    }

    /// Scatter one value per valid slot into a full-batch vector, filling the
    /// remaining rows with `fill`.
    pub fn expand<T: Clone>(&self, per_slot: &[T], fill: T) -> Vec<T> {
        debug_assert_eq!(per_slot.len(), self.valid.len());
        let mut out = vec![fill; self.batch];
        for (slot, &instance) in self.valid.iter().enumerate() {
            out[instance] = per_slot[slot].clone();
        }
        out
    }
}

/// Concatenated foreground pixels of every valid instance.
#[derive(Clone, Debug, Default)]
pub struct PointArena {
    pixels: Vec<Pixel>,
    offsets: Vec<usize>,
    validity: ValidityMask,
    mask_counts: Vec<usize>,
}

impl PointArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the arena from a batched mask, reusing allocations.
    pub fn rebuild(&mut self, mask: &InstanceMask) {
        self.pixels.clear();
        self.offsets.clear();
        self.offsets.push(0);
        self.validity.batch = mask.instances();
        self.validity.valid.clear();
        self.mask_counts.clear();

        for instance in 0..mask.instances() {
            let start = self.pixels.len();
            self.pixels
                .extend(mask.foreground(instance).map(|(row, col)| Pixel { row, col }));
            let count = self.pixels.len() - start;
            self.mask_counts.push(count);
            if count < 2 {
                self.pixels.truncate(start);
                continue;
            }
            self.validity.valid.push(instance);
            self.offsets.push(self.pixels.len());
        }
    }

    pub fn validity(&self) -> &ValidityMask {
        &self.validity
    }

    /// Number of valid slots.
    pub fn num_slots(&self) -> usize {
        self.validity.valid.len()
    }

    /// Point set of valid slot `slot`.
    pub fn slot(&self, slot: usize) -> &[Pixel] {
        &self.pixels[self.offsets[slot]..self.offsets[slot + 1]]
    }

    /// Batch instance index of slot `slot`.
    pub fn instance_of(&self, slot: usize) -> usize {
        self.validity.valid[slot]
    }

    /// Foreground pixel count of every batch instance, valid or not.
    pub fn mask_counts(&self) -> &[usize] {
        &self.mask_counts
    }

    /// Total number of stored pixels.
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebuild_skips_degenerate_instances() {
        let mut mask = InstanceMask::new(4, 3, 3);
        mask.fill_rect(0, 0, 2, 0, 2); // 4 px
        mask.set(1, 1, 1, true); // 1 px
        mask.set(3, 0, 0, true);
        mask.set(3, 2, 2, true); // 2 px

        let mut arena = PointArena::new();
        arena.rebuild(&mask);

        assert_eq!(arena.validity().indices(), &[0, 3]);
        assert_eq!(arena.mask_counts(), &[4, 1, 0, 2]);
        assert_eq!(arena.num_slots(), 2);
        assert_eq!(arena.slot(0).len(), 4);
        assert_eq!(
            arena.slot(1),
            &[Pixel { row: 0, col: 0 }, Pixel { row: 2, col: 2 }]
        );
        assert_eq!(arena.instance_of(1), 3);
        assert_eq!(arena.len(), 6);
    }

    #[test]
    fn rebuild_reuses_buffers_between_calls() {
        let mut arena = PointArena::new();
        let mut big = InstanceMask::new(1, 4, 4);
        big.fill_rect(0, 0, 4, 0, 4);
        arena.rebuild(&big);
        assert_eq!(arena.len(), 16);

        let empty = InstanceMask::new(2, 4, 4);
        arena.rebuild(&empty);
        assert!(arena.is_empty());
        assert!(arena.validity().is_empty());
        assert_eq!(arena.validity().batch_size(), 2);
    }

    #[test]
    fn expand_restores_batch_shape() {
        let mut mask = InstanceMask::new(3, 2, 2);
        mask.fill_rect(1, 0, 2, 0, 2);
        let mut arena = PointArena::new();
        arena.rebuild(&mask);
        let rows = arena.validity().expand(&[[5.0f32, 6.0]], [0.0, 0.0]);
        assert_eq!(rows, vec![[0.0, 0.0], [5.0, 6.0], [0.0, 0.0]]);
    }
}
