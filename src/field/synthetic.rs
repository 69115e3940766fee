//! Analytic unit-vector fields for tests, demos and sanity checks.
//!
//! Every pixel gets the normalized vector toward a known center. The pixel
//! that coincides with the center has no defined direction and receives NaN,
//! exactly like a network prediction masked out at the object's center.
use super::UnitVectorField;
use rand::Rng;

/// Fill one instance plane with directions pointing at `center = [row, col]`.
pub fn fill_toward_center(field: &mut UnitVectorField, instance: usize, center: [f32; 2]) {
    for row in 0..field.height() {
        for col in 0..field.width() {
            let value = unit_toward(center, row, col);
            field.set(instance, row, col, value);
        }
    }
}

/// Same as [`fill_toward_center`] but rotates each direction by a uniform
/// random angle in `[-max_angle_rad, max_angle_rad]`.
pub fn fill_toward_center_noisy<R: Rng + ?Sized>(
    field: &mut UnitVectorField,
    instance: usize,
    center: [f32; 2],
    max_angle_rad: f32,
    rng: &mut R,
) {
    for row in 0..field.height() {
        for col in 0..field.width() {
            let [dr, dc] = unit_toward(center, row, col);
            let value = if max_angle_rad > 0.0 {
                let theta = rng.gen_range(-max_angle_rad..=max_angle_rad);
                let (s, c) = theta.sin_cos();
                [c * dr - s * dc, s * dr + c * dc]
            } else {
                [dr, dc]
            };
            field.set(instance, row, col, value);
        }
    }
}

/// Overwrite one instance plane with NaN directions.
pub fn fill_undefined(field: &mut UnitVectorField, instance: usize) {
    for row in 0..field.height() {
        for col in 0..field.width() {
            field.set(instance, row, col, [f32::NAN, f32::NAN]);
        }
    }
}

fn unit_toward(center: [f32; 2], row: usize, col: usize) -> [f32; 2] {
    let dr = center[0] - row as f32;
    let dc = center[1] - col as f32;
    let norm = (dr * dr + dc * dc).sqrt();
    // 0/0 at the center itself yields NaN on purpose.
    [dr / norm, dc / norm]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn directions_point_at_center_and_center_is_nan() {
        let mut field = UnitVectorField::new(1, 5, 5);
        fill_toward_center(&mut field, 0, [2.0, 2.0]);
        let [dr, dc] = field.get(0, 0, 2);
        assert_abs_diff_eq!(dr, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(dc, 0.0, epsilon = 1e-6);
        let [dr, dc] = field.get(0, 4, 4);
        assert_abs_diff_eq!(dr, -std::f32::consts::FRAC_1_SQRT_2, epsilon = 1e-6);
        assert_abs_diff_eq!(dc, -std::f32::consts::FRAC_1_SQRT_2, epsilon = 1e-6);
        let [cr, cc] = field.get(0, 2, 2);
        assert!(cr.is_nan() && cc.is_nan());
    }

    #[test]
    fn noisy_field_stays_unit_norm() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut field = UnitVectorField::new(1, 6, 7);
        fill_toward_center_noisy(&mut field, 0, [2.5, 3.5], 0.2, &mut rng);
        for row in 0..6 {
            for col in 0..7 {
                let [dr, dc] = field.get(0, row, col);
                assert_abs_diff_eq!((dr * dr + dc * dc).sqrt(), 1.0, epsilon = 1e-5);
            }
        }
    }
}
