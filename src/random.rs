//! Seeded sampling of run lengths.
//!
//! Draws run lengths from a [`LongestRun`] by tabulating its cumulative
//! mass once and inverting it with binary search on every draw.
//!
//! # Reproducibility
//!
//! For reproducible experiments, use [`create_rng`] with a fixed seed.
//! The underlying algorithm (SmallRng) is deterministic for a given seed
//! on the same platform.

use rand::Rng;

use crate::error::{Result, RunLengthError};
use crate::run_length::LongestRun;
use crate::summation::NeumaierSum;

/// Creates a fast, seeded random number generator.
///
/// # Examples
/// ```
/// use u_runlength::random::create_rng;
/// use rand::Rng;
/// let mut rng = create_rng(42);
/// let x: f64 = rng.random();
/// assert!(x >= 0.0 && x < 1.0);
/// ```
pub fn create_rng(seed: u64) -> rand::rngs::SmallRng {
    use rand::SeedableRng;
    rand::rngs::SmallRng::seed_from_u64(seed)
}

/// Pre-computed inverse-CDF sampler over run lengths `1, 2, …`.
///
/// The table stops once cumulative mass reaches `1 − convergence_epsilon`
/// or at `max_run_length`, whichever comes first. Mass beyond the table is
/// dropped and the remainder renormalized.
///
/// # Complexity
/// - Construction: O(m²) for a table of `m` run lengths
/// - Sampling: O(log m)
///
/// # Examples
/// ```
/// use u_runlength::random::{create_rng, RunLengthSampler};
/// use u_runlength::LongestRun;
/// let dist = LongestRun::new(1000, 0.5).unwrap();
/// let sampler = RunLengthSampler::new(&dist).unwrap();
/// let mut rng = create_rng(7);
/// let x = sampler.sample(&mut rng);
/// assert!(x >= 1 && x <= sampler.max_run_length());
/// ```
#[derive(Debug, Clone)]
pub struct RunLengthSampler {
    cumulative: Vec<f64>,
    total: f64,
}

impl RunLengthSampler {
    /// Tabulates cumulative mass for `dist`.
    ///
    /// # Errors
    /// Returns [`RunLengthError::InvalidArgument`] if no positive mass
    /// falls inside the table.
    pub fn new(dist: &LongestRun) -> Result<Self> {
        let limits = dist.limits();
        let threshold = 1.0 - limits.convergence_epsilon;

        let mut cumulative = Vec::new();
        let mut acc = NeumaierSum::new();
        for x in 1..=limits.max_run_length {
            acc.add(dist.pmf(x)?.max(0.0));
            cumulative.push(acc.total());
            if acc.total() >= threshold {
                break;
            }
        }

        let total = acc.total();
        if total <= 0.0 {
            return Err(RunLengthError::InvalidArgument(format!(
                "no probability mass within {} run lengths",
                limits.max_run_length
            )));
        }
        if total < threshold {
            tracing::warn!(
                total,
                max_run_length = limits.max_run_length,
                "sampler table truncated before mass saturated"
            );
        }
        Ok(Self { cumulative, total })
    }

    /// Draws one run length.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> u64 {
        let threshold = rng.random_range(0.0..self.total);
        let i = self
            .cumulative
            .partition_point(|&c| c <= threshold)
            .min(self.cumulative.len() - 1);
        i as u64 + 1
    }

    /// Largest run length the table can return.
    pub fn max_run_length(&self) -> u64 {
        self.cumulative.len() as u64
    }

    /// Cumulative mass covered by the table.
    pub fn total_mass(&self) -> f64 {
        self.total
    }
}

/// Draws `n` run lengths from `dist` with a generator seeded by `seed`.
///
/// # Errors
/// Propagates [`RunLengthSampler::new`].
pub fn sample_run_lengths(dist: &LongestRun, n: usize, seed: u64) -> Result<Vec<u64>> {
    let sampler = RunLengthSampler::new(dist)?;
    let mut rng = create_rng(seed);
    Ok((0..n).map(|_| sampler.sample(&mut rng)).collect())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchLimits;

    #[test]
    fn test_create_rng_deterministic() {
        let mut rng1 = create_rng(42);
        let mut rng2 = create_rng(42);
        let vals1: Vec<f64> = (0..10).map(|_| rng1.random()).collect();
        let vals2: Vec<f64> = (0..10).map(|_| rng2.random()).collect();
        assert_eq!(vals1, vals2);
    }

    #[test]
    fn test_sampler_table_saturates() {
        let dist = LongestRun::new(1000, 0.5).unwrap();
        let sampler = RunLengthSampler::new(&dist).unwrap();
        assert!(sampler.total_mass() >= 1.0 - f32::EPSILON as f64);
        assert!(sampler.max_run_length() < 30);
    }

    #[test]
    fn test_sample_run_lengths_deterministic() {
        let dist = LongestRun::new(100, 0.3).unwrap();
        let a = sample_run_lengths(&dist, 50, 9).unwrap();
        let b = sample_run_lengths(&dist, 50, 9).unwrap();
        assert_eq!(a, b);
        assert!(a.iter().all(|&x| x >= 1));
    }

    #[test]
    fn test_sample_mean_matches_distribution_mean() {
        let dist = LongestRun::new(1000, 0.5).unwrap();
        let n = 20_000;
        let draws = sample_run_lengths(&dist, n, 42).unwrap();
        let empirical = draws.iter().sum::<u64>() as f64 / n as f64;
        let expected = dist.mean().unwrap();
        assert!(
            (empirical - expected).abs() < 0.05,
            "empirical mean {empirical}, expected {expected}"
        );
    }

    #[test]
    fn test_sample_frequencies_match_pmf() {
        let dist = LongestRun::new(10, 0.5).unwrap();
        let sampler = RunLengthSampler::new(&dist).unwrap();
        let mut rng = create_rng(123);
        let n = 20_000;
        let mut counts = vec![0_u32; sampler.max_run_length() as usize + 1];
        for _ in 0..n {
            counts[sampler.sample(&mut rng) as usize] += 1;
        }
        // P(X = 3) ≈ 0.4548 is the mode.
        let freq = counts[3] as f64 / n as f64;
        assert!((freq - dist.pmf(3).unwrap()).abs() < 0.02, "freq = {freq}");
        assert_eq!(counts[0], 0);
    }

    #[test]
    fn test_truncated_table_stays_in_range() {
        let dist = LongestRun::new(1000, 0.5)
            .unwrap()
            .with_limits(SearchLimits::default().with_max_run_length(6))
            .unwrap();
        let sampler = RunLengthSampler::new(&dist).unwrap();
        assert_eq!(sampler.max_run_length(), 6);
        assert!(sampler.total_mass() < 1.0);
        let mut rng = create_rng(5);
        for _ in 0..1000 {
            let x = sampler.sample(&mut rng);
            assert!((1..=6).contains(&x));
        }
    }

    #[test]
    fn test_no_mass_in_table_is_error() {
        // S(2) ≈ 0 for l = 10⁹, so a two-entry table holds no mass.
        let dist = LongestRun::new(1_000_000_000, 0.5)
            .unwrap()
            .with_limits(SearchLimits::default().with_max_run_length(2))
            .unwrap();
        assert!(matches!(
            RunLengthSampler::new(&dist),
            Err(RunLengthError::InvalidArgument(_))
        ));
    }
}
