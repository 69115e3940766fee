use serde::Serialize;

/// Per-instance outcome of a voting call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InstanceStatus {
    /// A weighted center was computed.
    Voted,
    /// Fewer than two mask pixels; no hypothesis was attempted.
    TooFewPoints,
    /// Every sampled pair had an undefined (NaN) direction.
    NoFiniteHypotheses,
    /// Hypotheses existed but their total consensus weight was zero.
    ZeroWeight,
}

impl InstanceStatus {
    pub fn is_determined(self) -> bool {
        matches!(self, InstanceStatus::Voted)
    }
}

/// Voted centers for a batch of instances.
///
/// `centers` always has one `(row, col)` row per input instance. Instances
/// without a determinable center keep a zero row for compatibility with
/// downstream consumers; a zero row means "no determination", not "center at
/// the origin". `status` carries the explicit flag.
// TODO: move consumers onto `get`/`status` so the zero-row convention can be dropped.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimatedCenters {
    pub centers: Vec<[f32; 2]>,
    pub status: Vec<InstanceStatus>,
}

impl EstimatedCenters {
    /// All-zero output for `instances` rows with a uniform status.
    pub fn zeros(instances: usize, status: InstanceStatus) -> Self {
        Self {
            centers: vec![[0.0; 2]; instances],
            status: vec![status; instances],
        }
    }

    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    /// Center of `instance` when one was determined.
    pub fn get(&self, instance: usize) -> Option<[f32; 2]> {
        match self.status.get(instance) {
            Some(status) if status.is_determined() => self.centers.get(instance).copied(),
            _ => None,
        }
    }

    /// Number of instances with a determined center.
    pub fn determined(&self) -> usize {
        self.status.iter().filter(|s| s.is_determined()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_hides_zero_rows_of_undetermined_instances() {
        let centers = EstimatedCenters {
            centers: vec![[0.0, 0.0], [3.0, 4.0]],
            status: vec![InstanceStatus::TooFewPoints, InstanceStatus::Voted],
        };
        assert_eq!(centers.get(0), None);
        assert_eq!(centers.get(1), Some([3.0, 4.0]));
        assert_eq!(centers.get(2), None);
        assert_eq!(centers.determined(), 1);
    }
}
