use super::voting::VotingConfig;
use crate::field::io::{load_mask_image, stack_masks, MaskPlane};
use crate::field::InstanceMask;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration of the `hough_demo` binary.
#[derive(Debug, Deserialize)]
pub struct DemoConfig {
    /// `[height, width]` of rectangle-only instances; taken from the first
    /// mask image when omitted.
    #[serde(default)]
    pub canvas: Option<[usize; 2]>,
    pub instances: Vec<DemoInstance>,
    #[serde(default)]
    pub voting: VotingConfig,
    #[serde(default)]
    pub noise: NoiseConfig,
    #[serde(default)]
    pub output: DemoOutputConfig,
}

/// One synthetic instance: a mask plus the center its field points at.
#[derive(Debug, Deserialize)]
pub struct DemoInstance {
    /// Binary mask image (non-zero = foreground).
    #[serde(default)]
    pub mask: Option<PathBuf>,
    /// `[row0, row1, col0, col1]` rectangle used when no image is given.
    #[serde(default)]
    pub rect: Option<[usize; 4]>,
    /// `[row, col]` the synthesized field points toward.
    pub center: [f32; 2],
    /// Replace the field with undefined (NaN) directions.
    #[serde(default)]
    pub undefined: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Maximum angular perturbation of each direction, in degrees.
    pub max_angle_deg: f32,
    pub seed: u64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            max_angle_deg: 0.0,
            seed: 7,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DemoOutputConfig {
    pub json_out: Option<PathBuf>,
}

impl DemoConfig {
    /// Load every mask image and rasterize every rectangle into one batch.
    pub fn build_mask(&self) -> Result<InstanceMask, String> {
        let mut loaded: Vec<Option<MaskPlane>> = Vec::with_capacity(self.instances.len());
        for inst in &self.instances {
            loaded.push(match &inst.mask {
                Some(path) => Some(load_mask_image(path)?),
                None => None,
            });
        }
        let [height, width] = match self.canvas {
            Some(canvas) => canvas,
            None => loaded
                .iter()
                .flatten()
                .next()
                .map(|p| [p.height(), p.width()])
                .ok_or_else(|| "Config needs `canvas` when no mask image is given".to_string())?,
        };

        let mut planes = Vec::with_capacity(self.instances.len());
        for (i, (inst, plane)) in self.instances.iter().zip(loaded).enumerate() {
            let plane = match (plane, inst.rect) {
                (Some(plane), _) => plane,
                (None, Some([r0, r1, c0, c1])) => MaskPlane::rect(width, height, [r0, r1], [c0, c1]),
                (None, None) => {
                    return Err(format!("Instance {i} needs either `mask` or `rect`"));
                }
            };
            planes.push(plane);
        }
        stack_masks(&planes)
    }
}

pub fn load_config(path: &Path) -> Result<DemoConfig, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let config: DemoConfig = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
    Ok(config)
}
