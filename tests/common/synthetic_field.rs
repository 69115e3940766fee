use hough_voting::field::synthetic::{fill_toward_center, fill_toward_center_noisy};
use hough_voting::field::{InstanceMask, UnitVectorField};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// One rectangular instance `[row0, row1, col0, col1]` voting toward `center`.
pub struct RectInstance {
    pub rect: [usize; 4],
    pub center: [f32; 2],
}

/// Batched field and mask built from rectangular instances.
pub struct Scene {
    pub field: UnitVectorField,
    pub mask: InstanceMask,
}

/// Exact analytic field toward every instance's center.
pub fn rect_scene(height: usize, width: usize, instances: &[RectInstance]) -> Scene {
    assert!(height > 0 && width > 0, "scene dimensions must be positive");
    let mut mask = InstanceMask::new(instances.len(), height, width);
    let mut field = UnitVectorField::new(instances.len(), height, width);
    for (i, inst) in instances.iter().enumerate() {
        let [r0, r1, c0, c1] = inst.rect;
        mask.fill_rect(i, r0, r1, c0, c1);
        fill_toward_center(&mut field, i, inst.center);
    }
    Scene { field, mask }
}

/// Same as [`rect_scene`] with each direction rotated by up to `max_angle_deg`.
pub fn noisy_rect_scene(
    height: usize,
    width: usize,
    instances: &[RectInstance],
    max_angle_deg: f32,
    seed: u64,
) -> Scene {
    let mut scene = rect_scene(height, width, instances);
    let mut rng = StdRng::seed_from_u64(seed);
    for (i, inst) in instances.iter().enumerate() {
        fill_toward_center_noisy(
            &mut scene.field,
            i,
            inst.center,
            max_angle_deg.to_radians(),
            &mut rng,
        );
    }
    scene
}
