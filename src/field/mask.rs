//! Owned per-instance boolean masks in `(instances, H, W)` layout.
use crate::error::VotingError;

#[derive(Clone, Debug)]
pub struct InstanceMask {
    instances: usize,
    height: usize,
    width: usize,
    data: Vec<bool>,
}

impl InstanceMask {
    /// Construct an all-background mask of shape `(instances, height, width)`.
    pub fn new(instances: usize, height: usize, width: usize) -> Self {
        Self {
            instances,
            height,
            width,
            data: vec![false; instances * height * width],
        }
    }

    /// Wrap an existing boolean buffer laid out as `(instances, height, width)`.
    pub fn from_vec(
        instances: usize,
        height: usize,
        width: usize,
        data: Vec<bool>,
    ) -> Result<Self, VotingError> {
        let expected = instances * height * width;
        if data.len() != expected {
            return Err(VotingError::BufferLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            instances,
            height,
            width,
            data,
        })
    }

    /// Build a mask from integer labels; any non-zero value is foreground.
    pub fn from_u8(
        instances: usize,
        height: usize,
        width: usize,
        labels: &[u8],
    ) -> Result<Self, VotingError> {
        Self::from_vec(
            instances,
            height,
            width,
            labels.iter().map(|&v| v != 0).collect(),
        )
    }

    #[inline]
    pub fn instances(&self) -> usize {
        self.instances
    }
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    fn idx(&self, instance: usize, row: usize, col: usize) -> usize {
        (instance * self.height + row) * self.width + col
    }

    #[inline]
    pub fn get(&self, instance: usize, row: usize, col: usize) -> bool {
        self.data[self.idx(instance, row, col)]
    }

    #[inline]
    pub fn set(&mut self, instance: usize, row: usize, col: usize, value: bool) {
        let i = self.idx(instance, row, col);
        self.data[i] = value;
    }

    /// Bounds-checked lookup for signed pixel coordinates.
    #[inline]
    pub fn contains(&self, instance: usize, row: i64, col: i64) -> bool {
        if row < 0 || col < 0 || row as usize >= self.height || col as usize >= self.width {
            return false;
        }
        self.get(instance, row as usize, col as usize)
    }

    /// Boolean plane of one instance in row-major order.
    pub fn plane(&self, instance: usize) -> &[bool] {
        let start = self.idx(instance, 0, 0);
        &self.data[start..start + self.height * self.width]
    }

    /// Number of foreground pixels of an instance.
    pub fn count(&self, instance: usize) -> usize {
        self.plane(instance).iter().filter(|&&v| v).count()
    }

    /// Foreground pixels of an instance as `(row, col)` in raster order.
    pub fn foreground(&self, instance: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        let width = self.width;
        self.plane(instance)
            .iter()
            .enumerate()
            .filter(|(_, &v)| v)
            .map(move |(i, _)| (i / width, i % width))
    }

    /// Set every pixel inside `[row0, row1) × [col0, col1)` to foreground.
    pub fn fill_rect(&mut self, instance: usize, row0: usize, row1: usize, col0: usize, col1: usize) {
        for row in row0..row1.min(self.height) {
            for col in col0..col1.min(self.width) {
                self.set(instance, row, col, true);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn foreground_is_raster_ordered() {
        let labels = [
            0, 1, 0, //
            1, 0, 1, //
            0, 0, 0, //
            0, 0, 0, //
            0, 0, 0, //
            0, 0, 7, //
        ];
        let mask = InstanceMask::from_u8(2, 3, 3, &labels).expect("valid shape");
        let pts: Vec<_> = mask.foreground(0).collect();
        assert_eq!(pts, vec![(0, 1), (1, 0), (1, 2)]);
        assert_eq!(mask.count(0), 3);
        assert_eq!(mask.foreground(1).collect::<Vec<_>>(), vec![(2, 2)]);
    }

    #[test]
    fn contains_handles_out_of_bounds() {
        let mut mask = InstanceMask::new(1, 4, 4);
        mask.fill_rect(0, 1, 3, 1, 3);
        assert!(mask.contains(0, 1, 1));
        assert!(mask.contains(0, 2, 2));
        assert!(!mask.contains(0, 0, 0));
        assert!(!mask.contains(0, -1, 2));
        assert!(!mask.contains(0, 2, 4));
    }
}
