use crate::error::{EnrichError, Result};
use crate::testing::utils::{argsort_ascending, validate_fdr, validate_p_values};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod bootstrap;

/// Multiple testing correction methods to control for false positives
/// when performing many statistical tests simultaneously.
///
/// A correction maps p-values to a pass/fail flag per test, in input order.
/// Implementations are interchangeable: the enrichment engine only ever sees
/// this trait.
pub trait MultipleTestCorrection: Send + Sync {
    fn correct(&self, p_values: &[f64], fdr: f64) -> Result<Vec<bool>>;

    fn name(&self) -> &str;
}

/// Runs `correction` and checks that it answered once per p-value.
pub fn apply_correction(
    correction: &dyn MultipleTestCorrection,
    p_values: &[f64],
    fdr: f64,
) -> Result<Vec<bool>> {
    let passes = correction.correct(p_values, fdr)?;
    if passes.len() != p_values.len() {
        return Err(EnrichError::invalid_input(format!(
            "correction '{}' returned {} flags for {} p-values",
            correction.name(),
            passes.len(),
            p_values.len()
        )));
    }
    Ok(passes)
}

/// Benjamini-Hochberg step-up procedure.
///
/// P-values are ranked ascending and compared to the critical values
/// `(k / N) * fdr`. With `k*` the largest rank whose p-value is strictly below
/// its critical value, every p-value less than or equal to the p-value at `k*`
/// passes. If no rank qualifies, nothing passes.
///
/// # Example
/// ```
/// use tf_enrichment::testing::correction::benjamini_hochberg_correction;
///
/// let passes = benjamini_hochberg_correction(&[0.01, 0.04, 0.03, 0.2], 0.05).unwrap();
/// assert_eq!(passes, vec![true, false, false, false]);
/// ```
pub fn benjamini_hochberg_correction(p_values: &[f64], fdr: f64) -> Result<Vec<bool>> {
    validate_p_values(p_values)?;
    validate_fdr(fdr)?;

    let n = p_values.len() as f64;
    let threshold = argsort_ascending(p_values)
        .into_iter()
        .enumerate()
        .map(|(rank, i)| (rank, p_values[i]))
        .filter(|&(rank, p)| p < (rank + 1) as f64 / n * fdr)
        .map(|(_, p)| p)
        .last();

    Ok(match threshold {
        Some(t) => p_values.iter().map(|&p| p <= t).collect(),
        None => vec![false; p_values.len()],
    })
}

/// Bonferroni correction: a test passes iff `p < fdr / N`.
pub fn bonferroni_correction(p_values: &[f64], fdr: f64) -> Result<Vec<bool>> {
    validate_p_values(p_values)?;
    validate_fdr(fdr)?;

    let alpha = fdr / p_values.len() as f64;
    Ok(p_values.iter().map(|&p| p < alpha).collect())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BenjaminiHochberg;

impl MultipleTestCorrection for BenjaminiHochberg {
    fn correct(&self, p_values: &[f64], fdr: f64) -> Result<Vec<bool>> {
        benjamini_hochberg_correction(p_values, fdr)
    }

    fn name(&self) -> &str {
        "BenjaminiHochberg"
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bonferroni;

impl MultipleTestCorrection for Bonferroni {
    fn correct(&self, p_values: &[f64], fdr: f64) -> Result<Vec<bool>> {
        bonferroni_correction(p_values, fdr)
    }

    fn name(&self) -> &str {
        "Bonferroni"
    }
}

/// A caller-supplied correction function.
///
/// Errors raised by the function are passed through as
/// [`EnrichError::Provider`].
pub struct CustomCorrection<F> {
    name: String,
    function: F,
}

impl<F> CustomCorrection<F>
where
    F: Fn(&[f64], f64) -> anyhow::Result<Vec<bool>> + Send + Sync,
{
    pub fn new(name: impl Into<String>, function: F) -> Self {
        CustomCorrection {
            name: name.into(),
            function,
        }
    }
}

impl<F> MultipleTestCorrection for CustomCorrection<F>
where
    F: Fn(&[f64], f64) -> anyhow::Result<Vec<bool>> + Send + Sync,
{
    fn correct(&self, p_values: &[f64], fdr: f64) -> Result<Vec<bool>> {
        Ok((self.function)(p_values, fdr)?)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Named selector for the built-in corrections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrectionMethod {
    #[default]
    BenjaminiHochberg,
    Bonferroni,
}

impl MultipleTestCorrection for CorrectionMethod {
    fn correct(&self, p_values: &[f64], fdr: f64) -> Result<Vec<bool>> {
        match self {
            CorrectionMethod::BenjaminiHochberg => benjamini_hochberg_correction(p_values, fdr),
            CorrectionMethod::Bonferroni => bonferroni_correction(p_values, fdr),
        }
    }

    fn name(&self) -> &str {
        match self {
            CorrectionMethod::BenjaminiHochberg => "BenjaminiHochberg",
            CorrectionMethod::Bonferroni => "Bonferroni",
        }
    }
}

impl FromStr for CorrectionMethod {
    type Err = EnrichError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "benjaminihochberg" | "bh" | "fdr_bh" => Ok(CorrectionMethod::BenjaminiHochberg),
            "bonferroni" => Ok(CorrectionMethod::Bonferroni),
            _ => Err(EnrichError::invalid_input(format!(
                "unknown correction '{}', expected BenjaminiHochberg or Bonferroni",
                s
            ))),
        }
    }
}

impl fmt::Display for CorrectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
