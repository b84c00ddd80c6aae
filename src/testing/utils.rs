use crate::error::{EnrichError, Result};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// Indices that would sort `values` ascending. Ties keep their input order.
pub fn argsort_ascending(values: &[f64]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    indices
}

/// Value at position `floor(len * q)` of an ascending-sorted slice.
pub fn quantile_at(sorted: &[f64], q: f64) -> Option<f64> {
    let idx = (sorted.len() as f64 * q).floor() as usize;
    sorted.get(idx).copied()
}

/// Sample mean and standard deviation (n - 1 denominator).
pub fn mean_and_std(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    if n == 0 {
        return (f64::NAN, f64::NAN);
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    if n < 2 {
        return (mean, f64::NAN);
    }
    let ss: f64 = values.iter().map(|&v| (v - mean) * (v - mean)).sum();
    (mean, (ss / (n - 1) as f64).sqrt())
}

/// One seed per resampling draw, taken up front so that draws can run on any
/// worker and still reproduce a sequential run.
pub fn resample_seeds(rng: &mut dyn RngCore, n_draws: usize) -> Vec<u64> {
    (0..n_draws).map(|_| rng.next_u64()).collect()
}

/// `amount` distinct indices drawn uniformly from `0..population`.
pub fn sample_without_replacement(seed: u64, population: usize, amount: usize) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    rand::seq::index::sample(&mut rng, population, amount).into_vec()
}

pub fn validate_p_values(p_values: &[f64]) -> Result<()> {
    if p_values.is_empty() {
        return Err(EnrichError::invalid_input("Empty p-value array"));
    }

    for (i, &p) in p_values.iter().enumerate() {
        if !(0.0..=1.0).contains(&p) {
            return Err(EnrichError::invalid_input(format!(
                "Invalid p-value at index {}: {}",
                i, p
            )));
        }
    }
    Ok(())
}

pub fn validate_fdr(fdr: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&fdr) {
        return Err(EnrichError::invalid_input(format!(
            "FDR must be within [0, 1], got {}",
            fdr
        )));
    }
    Ok(())
}
