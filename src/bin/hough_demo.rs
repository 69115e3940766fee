use hough_voting::config::demo::{self as cfg, DemoConfig};
use hough_voting::field::io::write_json_file;
use hough_voting::field::synthetic::{fill_toward_center_noisy, fill_undefined};
use hough_voting::field::{InstanceMask, UnitVectorField};
use hough_voting::HoughVoter;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::env;
use std::path::Path;

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    env_logger::init();
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = cfg::load_config(Path::new(&config_path))?;

    let mask = config.build_mask()?;
    let field = synthesize_field(&config, &mask);
    let params = config.voting.resolve().map_err(|e| e.to_string())?;

    let mut voter = HoughVoter::new(params);
    let report = voter
        .vote_with_diagnostics(&field, &mask)
        .map_err(|e| e.to_string())?;
    report.print_text_summary();

    println!("\nExpected vs voted");
    for (i, inst) in config.instances.iter().enumerate() {
        match report.centers.get(i) {
            Some([r, c]) => println!(
                "  #{i}: expected=({:.2}, {:.2}) voted=({r:.2}, {c:.2}) error={:.3}px",
                inst.center[0],
                inst.center[1],
                ((r - inst.center[0]).powi(2) + (c - inst.center[1]).powi(2)).sqrt()
            ),
            None => println!(
                "  #{i}: expected=({:.2}, {:.2}) voted=- ({:?})",
                inst.center[0], inst.center[1], report.centers.status[i]
            ),
        }
    }

    if let Some(path) = &config.output.json_out {
        write_json_file(path, &report)?;
        println!("\nJSON report written to {}", path.display());
    }

    Ok(())
}

fn synthesize_field(config: &DemoConfig, mask: &InstanceMask) -> UnitVectorField {
    let mut field = UnitVectorField::new(mask.instances(), mask.height(), mask.width());
    let mut rng = StdRng::seed_from_u64(config.noise.seed);
    let max_angle = config.noise.max_angle_deg.to_radians();
    for (i, inst) in config.instances.iter().enumerate() {
        if inst.undefined {
            fill_undefined(&mut field, i);
        } else {
            fill_toward_center_noisy(&mut field, i, inst.center, max_angle, &mut rng);
        }
    }
    field
}

fn usage() -> String {
    "Usage: hough_demo <config.json>".to_string()
}
