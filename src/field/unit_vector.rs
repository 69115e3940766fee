//! Owned per-instance unit-vector field in `(instances, 2, H, W)` layout.
//!
//! Channel 0 holds the row component and channel 1 the column component of
//! the predicted direction from each pixel toward its object's center. The
//! values are expected to be approximately unit-norm; the voting core never
//! re-normalizes them. NaN marks an undefined prediction.
use crate::error::VotingError;
use nalgebra::Vector2;

#[derive(Clone, Debug)]
pub struct UnitVectorField {
    instances: usize,
    height: usize,
    width: usize,
    data: Vec<f32>,
}

impl UnitVectorField {
    /// Construct a zero-initialized field of shape `(instances, 2, height, width)`.
    pub fn new(instances: usize, height: usize, width: usize) -> Self {
        Self {
            instances,
            height,
            width,
            data: vec![0.0; instances * 2 * height * width],
        }
    }

    /// Wrap an existing buffer laid out as `(instances, 2, height, width)`.
    pub fn from_vec(
        instances: usize,
        height: usize,
        width: usize,
        data: Vec<f32>,
    ) -> Result<Self, VotingError> {
        let expected = instances * 2 * height * width;
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

    /// Raw backing storage.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    fn idx(&self, instance: usize, channel: usize, row: usize, col: usize) -> usize {
        ((instance * 2 + channel) * self.height + row) * self.width + col
    }

    /// Direction stored at `(row, col)` as `[d_row, d_col]`.
    #[inline]
    pub fn get(&self, instance: usize, row: usize, col: usize) -> [f32; 2] {
        [
            self.data[self.idx(instance, 0, row, col)],
            self.data[self.idx(instance, 1, row, col)],
        ]
    }

    /// Store `[d_row, d_col]` at `(row, col)`.
    #[inline]
    pub fn set(&mut self, instance: usize, row: usize, col: usize, value: [f32; 2]) {
        let i0 = self.idx(instance, 0, row, col);
        let i1 = self.idx(instance, 1, row, col);
        self.data[i0] = value[0];
        self.data[i1] = value[1];
    }

    /// Direction at `(row, col)` in the internal `(x = col, y = row)` frame.
    #[inline]
    pub fn direction(&self, instance: usize, row: usize, col: usize) -> Vector2<f32> {
        let [d_row, d_col] = self.get(instance, row, col);
        Vector2::new(d_col, d_row)
    }

    /// One `H × W` channel plane of an instance.
    pub fn plane(&self, instance: usize, channel: usize) -> &[f32] {
        let start = self.idx(instance, channel, 0, 0);
        &self.data[start..start + self.height * self.width]
    }
}
