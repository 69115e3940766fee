//! I/O helpers for instance masks and JSON reports.
//!
//! - `load_mask_image`: read a PNG/etc. into a binary plane (non-zero = foreground).
//! - `stack_masks`: combine same-sized planes into an [`InstanceMask`].
//! - `write_json_file`: write a voting report as pretty JSON.
use super::InstanceMask;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Single binary mask plane loaded from disk.
#[derive(Clone, Debug)]
pub struct MaskPlane {
    width: usize,
    height: usize,
    data: Vec<bool>,
}

impl MaskPlane {
    /// Plane whose foreground is the rectangle `[row0, row1) × [col0, col1)`.
    pub fn rect(width: usize, height: usize, rows: [usize; 2], cols: [usize; 2]) -> Self {
        let mut data = vec![false; width * height];
        for row in rows[0]..rows[1].min(height) {
            for col in cols[0]..cols[1].min(width) {
                data[row * width + col] = true;
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Image width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of foreground pixels.
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }
}

/// Load an image from disk, convert to 8-bit grayscale and binarize it.
pub fn load_mask_image(path: &Path) -> Result<MaskPlane, String> {
    let img = image::open(path)
        .map_err(|e| format!("Failed to open {}: {e}", path.display()))?
        .into_luma8();
    let width = img.width() as usize;
    let height = img.height() as usize;
    let data = img.into_raw().into_iter().map(|v| v != 0).collect();
    Ok(MaskPlane {
        width,
        height,
        data,
    })
}

/// Stack equally sized planes into a batched instance mask.
pub fn stack_masks(planes: &[MaskPlane]) -> Result<InstanceMask, String> {
    let Some(first) = planes.first() else {
        return Ok(InstanceMask::new(0, 0, 0));
    };
    let (width, height) = (first.width, first.height);
    let mut data = Vec::with_capacity(planes.len() * width * height);
    for (i, plane) in planes.iter().enumerate() {
        if plane.width != width || plane.height != height {
            return Err(format!(
                "Mask {i} is {}x{}, expected {width}x{height}",
                plane.width, plane.height
            ));
        }
        data.extend_from_slice(&plane.data);
    }
    InstanceMask::from_vec(planes.len(), height, width, data).map_err(|e| e.to_string())
}

/// Write a report as pretty JSON to `path`, creating missing directories.
pub fn write_json_file<T: Serialize>(path: &Path, report: &T) -> Result<(), String> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir)
            .map_err(|e| format!("Failed to create report directory {}: {e}", dir.display()))?,
        _ => {}
    }
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| format!("Failed to encode report {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write report {}: {e}", path.display()))
}
