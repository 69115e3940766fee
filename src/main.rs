use hough_voting::field::synthetic::fill_toward_center;
use hough_voting::field::{InstanceMask, UnitVectorField};
use hough_voting::{HoughVoter, VotingParams};

fn main() {
    // Demo stub: one square instance with an analytic field, one empty instance
    let (h, w) = (48usize, 64usize);
    let mut mask = InstanceMask::new(2, h, w);
    mask.fill_rect(0, 10, 30, 20, 44);
    let mut field = UnitVectorField::new(2, h, w);
    fill_toward_center(&mut field, 0, [19.4, 31.8]);

    let mut voter = HoughVoter::new(VotingParams::default());
    match voter.vote(&field, &mask) {
        Ok(centers) => {
            for (i, (c, s)) in centers.centers.iter().zip(&centers.status).enumerate() {
                println!("instance={} center=({:.3}, {:.3}) status={:?}", i, c[0], c[1], s);
            }
        }
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }
}
