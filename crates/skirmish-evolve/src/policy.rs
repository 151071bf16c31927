/// A trained decision function.
///
/// Implementations map a fixed-order observation to an ordered activation
/// vector; the harness thresholds the activations into candidate actions
/// through the side's frozen output table. Policies are immutable once
/// built, which is what makes them safe to hand to worker threads by value.
pub trait Policy: Send + Sync {
    /// Computes one activation per output slot for the given observation.
    fn activate(&self, inputs: &[f32]) -> Vec<f32>;
}

/// Single-layer feed-forward policy with sigmoid outputs.
///
/// Weights are stored row-major, one row of `input_len + 1` values per
/// output (the trailing value is the bias). Output `j` is
/// `sigmoid(bias_j + sum_i w[j][i] * x_i)`, squashed into `(0, 1)` so the
/// harness can threshold at 0.5.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedForwardPolicy {
    input_len: usize,
    output_len: usize,
    weights: Vec<f32>,
}

impl FeedForwardPolicy {
    /// Number of weights a genome must carry for the given topology.
    #[must_use]
    pub const fn weight_len(input_len: usize, output_len: usize) -> usize {
        output_len * (input_len + 1)
    }

    /// Builds a policy from a genome's weight vector.
    ///
    /// # Panics
    ///
    /// Panics if `weights.len()` does not match
    /// [`weight_len`](Self::weight_len); populations guarantee the shape, so
    /// a mismatch here is a construction bug, not a runtime condition.
    #[must_use]
    pub fn new(input_len: usize, output_len: usize, weights: Vec<f32>) -> Self {
        assert_eq!(
            weights.len(),
            Self::weight_len(input_len, output_len),
            "weight vector does not match policy topology"
        );
        Self {
            input_len,
            output_len,
            weights,
        }
    }
}

impl Policy for FeedForwardPolicy {
    fn activate(&self, inputs: &[f32]) -> Vec<f32> {
        assert_eq!(inputs.len(), self.input_len);
        let row = self.input_len + 1;
        (0..self.output_len)
            .map(|j| {
                let weights = &self.weights[j * row..(j + 1) * row];
                let z = weights[self.input_len]
                    + inputs
                        .iter()
                        .zip(&weights[..self.input_len])
                        .map(|(x, w)| x * w)
                        .sum::<f32>();
                sigmoid(z)
            })
            .collect()
    }
}

fn sigmoid(z: f32) -> f32 {
    1.0 / (1.0 + (-z).exp())
}
