use crate::engine::{MutableScalarTensor, ScalarTensor};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochLoss {
    pub epoch: usize,
    pub loss: f32,
}

impl From<&EpochLoss> for (usize, f32) {
    fn from(e: &EpochLoss) -> Self {
        let EpochLoss { epoch, loss } = e;
        (*epoch, *loss)
    }
}

/// Mean binary cross entropy between predicted probabilities and 0/1 targets.
///
/// `ln` clamps at `LOG_FLOOR`, so a saturated prediction costs at most 100
/// per sample instead of infinity. Terms whose target weight is exactly zero
/// are never built, which keeps `0 * ln(0)` out of the graph. All terms hang
/// off a single sum node, so the graph depth doesn't grow with the batch.
pub fn binary_cross_entropy_loss(
    input: &[MutableScalarTensor],
    target: &[f32],
) -> MutableScalarTensor {
    if input.len() != target.len() {
        panic!("Input and target dimensions must match");
    }

    let mut terms = Vec::with_capacity(2 * input.len());
    for (p_i, y_i) in input.iter().zip(target) {
        if *y_i != 0.0 {
            terms.push(&p_i.ln() * *y_i);
        }
        if *y_i != 1.0 {
            terms.push(&(1.0 - p_i).ln() * (1.0 - *y_i));
        }
    }

    -ScalarTensor::sum(&terms) / input.len() as f32
}
