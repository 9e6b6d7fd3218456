//! Linear joint-space interpolation between two configurations.

use thiserror::Error;

use super::types::JointConfig;

/// The two interpolation endpoints have different dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("joint configurations differ in dimension ({left} vs {right})")]
pub struct DimensionMismatchError {
    pub left: usize,
    pub right: usize,
}

/// Linearly interpolate from `start` to `end` in `steps` configurations.
///
/// Element `i` is the component-wise affine combination
/// `(1 - t)·start + t·end` with `t = i / (steps - 1)`, so the first element
/// equals `start` exactly and the last equals `end` exactly. With
/// `steps == 1` the result is `[start]` (`end` is not reached).
///
/// Pure and deterministic; fails only when the endpoints disagree in
/// dimension.
pub fn interpolate(
    start: &[f64],
    end: &[f64],
    steps: usize,
) -> Result<Vec<JointConfig>, DimensionMismatchError> {
    if start.len() != end.len() {
        return Err(DimensionMismatchError {
            left: start.len(),
            right: end.len(),
        });
    }

    let mut path = Vec::with_capacity(steps);
    for i in 0..steps {
        let t = if steps > 1 {
            i as f64 / (steps - 1) as f64
        } else {
            0.0
        };
        let q: JointConfig = start
            .iter()
            .zip(end)
            .map(|(&a, &b)| (1.0 - t) * a + t * b)
            .collect();
        path.push(q);
    }
    Ok(path)
}
