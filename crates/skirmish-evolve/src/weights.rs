//! Weight vector operators used by the genetic algorithm.
//!
//! Weights are signed and clamped to `[-max_weight, max_weight]`; unlike
//! magnitude-ranked scoring weights they are not normalized, because the
//! policy's thresholded outputs are not scale-invariant.

use rand::Rng;
use rand_distr::Normal;

/// Builds a weight vector by applying a function to each index.
pub fn from_fn<F>(mut f: F, len: usize) -> Vec<f32>
where
    F: FnMut(usize) -> f32,
{
    let mut values = Vec::with_capacity(len);
    for i in 0..len {
        values.push(f(i));
    }
    values
}

/// Generates a uniformly random weight vector in `[-max_weight, max_weight]`.
pub fn random<R>(rng: &mut R, max_weight: f32, len: usize) -> Vec<f32>
where
    R: Rng + ?Sized,
{
    from_fn(|_| rng.random_range(-max_weight..=max_weight), len)
}

/// BLX-α blend crossover.
///
/// Each offspring gene is sampled uniformly from the parents' range expanded
/// by `alpha` times its width, then clamped. `alpha = 0` keeps offspring
/// strictly between the parents; larger values explore beyond them.
///
/// # Panics
///
/// Panics if the parent vectors have different lengths.
pub fn blx_alpha<R>(p1: &[f32], p2: &[f32], alpha: f32, max_weight: f32, rng: &mut R) -> Vec<f32>
where
    R: Rng + ?Sized,
{
    assert_eq!(p1.len(), p2.len());
    from_fn(
        |i| {
            let lo = f32::min(p1[i], p2[i]);
            let hi = f32::max(p1[i], p2[i]);
            let spread = (hi - lo) * alpha;
            rng.random_range(lo - spread..=hi + spread)
                .clamp(-max_weight, max_weight)
        },
        p1.len(),
    )
}

/// Applies Gaussian mutation in place: each gene is perturbed by
/// `N(0, sigma)` with probability `rate`, then clamped.
pub fn mutate<R>(weights: &mut [f32], sigma: f32, max_weight: f32, rate: f32, rng: &mut R)
where
    R: Rng + ?Sized,
{
    let normal = Normal::new(0.0, sigma).expect("sigma must be finite and non-negative");
    for w in weights {
        if rng.random_bool(rate.into()) {
            *w = (*w + rng.sample(normal)).clamp(-max_weight, max_weight);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    #[test]
    fn test_random_stays_in_bounds() {
        let mut rng = Pcg32::seed_from_u64(7);
        let weights = random(&mut rng, 2.5, 64);
        assert_eq!(weights.len(), 64);
        assert!(weights.iter().all(|w| (-2.5..=2.5).contains(w)));
    }

    #[test]
    fn test_blx_alpha_zero_stays_between_parents() {
        let mut rng = Pcg32::seed_from_u64(11);
        let p1 = vec![-1.0, 0.0, 2.0];
        let p2 = vec![1.0, 0.0, 3.0];
        let child = blx_alpha(&p1, &p2, 0.0, 4.0, &mut rng);
        assert!((-1.0..=1.0).contains(&child[0]));
        assert!(child[1].abs() < f32::EPSILON);
        assert!((2.0..=3.0).contains(&child[2]));
    }

    #[test]
    fn test_blx_alpha_clamps_exploration() {
        let mut rng = Pcg32::seed_from_u64(13);
        let p1 = vec![3.9; 16];
        let p2 = vec![-3.9; 16];
        let child = blx_alpha(&p1, &p2, 1.0, 4.0, &mut rng);
        assert!(child.iter().all(|w| (-4.0..=4.0).contains(w)));
    }

    #[test]
    fn test_mutate_rate_zero_is_identity() {
        let mut rng = Pcg32::seed_from_u64(17);
        let mut weights = vec![0.5, -0.25, 1.75];
        let original = weights.clone();
        mutate(&mut weights, 1.0, 4.0, 0.0, &mut rng);
        assert_eq!(weights, original);
    }

    #[test]
    fn test_mutate_rate_one_respects_bounds() {
        let mut rng = Pcg32::seed_from_u64(19);
        let mut weights = vec![3.9; 128];
        mutate(&mut weights, 5.0, 4.0, 1.0, &mut rng);
        assert!(weights.iter().all(|w| (-4.0..=4.0).contains(w)));
        assert!(weights.iter().any(|w| (*w - 3.9).abs() > f32::EPSILON));
    }
}
