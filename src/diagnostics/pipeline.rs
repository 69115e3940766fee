use crate::diagnostics::{PruningStage, TimingBreakdown};
use crate::types::{EstimatedCenters, InstanceStatus};
use nalgebra::Point2;
use serde::Serialize;

/// Result produced by [`HoughVoter::vote_with_diagnostics`](crate::HoughVoter::vote_with_diagnostics).
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingReport {
    pub centers: EstimatedCenters,
    pub trace: VotingTrace,
}

fn format_optional(val: Option<[f32; 2]>) -> String {
    val.map(|[r, c]| format!("({:.2}, {:.2})", r, c))
        .unwrap_or_else(|| "-".to_string())
}

impl VotingReport {
    /// Human-readable summary on stdout.
    pub fn print_text_summary(&self) {
        let input = &self.trace.input;
        println!("Voting summary");
        println!(
            "  batch: {} instances ({} voted) on {}x{} px",
            input.instances,
            self.centers.determined(),
            input.width,
            input.height
        );
        println!(
            "  params: k={} in_mask_multiplier={:.2} seed={}",
            input.num_hypotheses, input.in_mask_multiplier, input.seed
        );

        let timings = &self.trace.timings;
        print!("\nTimings (ms):");
        for stage in &timings.stages {
            print!(" {}={:.3}", stage.label, stage.elapsed_ms);
        }
        println!(" total={:.3}", timings.total_ms);

        if let Some(pruning) = &self.trace.pruning {
            println!(
                "Pruning: method={} policy={} flagged={} elapsed_ms={:.3}",
                pruning.method.name(),
                pruning.policy,
                pruning.flagged,
                pruning.elapsed_ms
            );
        }

        println!("\nInstances");
        for inst in &self.trace.instances {
            println!(
                "  #{:<3} {:<18} px={:<6} pairs={}/{} flagged={} center={}",
                inst.instance,
                format!("{:?}", inst.status),
                inst.mask_pixels,
                inst.sampled_pairs - inst.dropped_nan_pairs,
                inst.sampled_pairs,
                inst.outliers.iter().filter(|&&f| f).count(),
                format_optional(inst.center)
            );
        }
    }
}

/// End-to-end trace of one voting call.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingTrace {
    pub input: InputDescriptor,
    pub timings: TimingBreakdown,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pruning: Option<PruningStage>,
    pub instances: Vec<InstanceTrace>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDescriptor {
    pub instances: usize,
    pub height: usize,
    pub width: usize,
    pub valid_instances: usize,
    pub num_hypotheses: usize,
    pub in_mask_multiplier: f32,
    pub seed: u64,
}

/// Everything the voter saw and decided for one batch instance.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceTrace {
    pub instance: usize,
    pub status: InstanceStatus,
    pub mask_pixels: usize,
    pub sampled_pairs: usize,
    pub dropped_nan_pairs: usize,
    /// Hypotheses straight from the ray intersections; NaN serializes as null.
    pub raw_hypotheses: Vec<[f32; 2]>,
    /// Hypotheses after dropping or replacing outliers.
    pub hypotheses: Vec<[f32; 2]>,
    pub outliers: Vec<bool>,
    pub weights: Vec<f32>,
    /// Consensus score before normalization.
    pub total_score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center: Option<[f32; 2]>,
}

impl InstanceTrace {
    /// Trace of an instance that never reached hypothesis generation.
    pub fn skipped(instance: usize, mask_pixels: usize) -> Self {
        Self {
            instance,
            status: InstanceStatus::TooFewPoints,
            mask_pixels,
            sampled_pairs: 0,
            dropped_nan_pairs: 0,
            raw_hypotheses: Vec::new(),
            hypotheses: Vec::new(),
            outliers: Vec::new(),
            weights: Vec::new(),
            total_score: 0.0,
            center: None,
        }
    }
}

/// Internal `(x = col, y = row)` points to reported `(row, col)` rows.
pub fn to_row_col(points: &[Point2<f32>]) -> Vec<[f32; 2]> {
    points.iter().map(|p| [p.y, p.x]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skipped_instance_serializes_without_center() {
        let trace = InstanceTrace::skipped(4, 1);
        let json = serde_json::to_value(&trace).expect("serialize");
        assert_eq!(json["instance"], 4);
        assert_eq!(json["status"], "tooFewPoints");
        assert_eq!(json["maskPixels"], 1);
        assert!(json.get("center").is_none());
    }

    #[test]
    fn nan_hypotheses_serialize_as_null() {
        let rows = to_row_col(&[Point2::new(f32::NAN, f32::NAN), Point2::new(1.0, 2.0)]);
        assert_eq!(rows[1], [2.0, 1.0]);
        let json = serde_json::to_string(&rows).expect("serialize");
        assert_eq!(json, "[[null,null],[2.0,1.0]]");
    }
}
