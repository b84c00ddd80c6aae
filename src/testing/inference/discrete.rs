use crate::error::{EnrichError, Result};
use crate::testing::{Alternative, TestResult};
use statrs::distribution::{DiscreteCDF, Hypergeometric};
use statrs::function::factorial::{ln_binomial, ln_factorial};
use std::f64::consts::LN_10;

/// Relative tolerance used when collecting "as or more extreme" tables for the
/// two-sided test, so that tables with equal probability are not lost to
/// rounding.
const TWO_SIDED_RTOL: f64 = 1e-7;

/// A 2x2 contingency table laid out as
///
/// ```text
///                  | in target set | not in target set
/// in annotation    |       a       |         b
/// not annotation   |       c       |         d
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContingencyTable {
    pub a: u64,
    pub b: u64,
    pub c: u64,
    pub d: u64,
}

impl ContingencyTable {
    pub fn new(a: u64, b: u64, c: u64, d: u64) -> Self {
        ContingencyTable { a, b, c, d }
    }

    /// Builds the table for one annotation set against a target set.
    ///
    /// `a` is the overlap, `b` the annotation members outside the target set,
    /// `c` the targets outside the annotation set and `d` whatever is left of the
    /// universe. A universe too small to hold `a + b + c` is a data integrity
    /// error and is never clamped.
    pub fn from_overlap(
        overlap: usize,
        annotation_size: usize,
        target_size: usize,
        universe_size: usize,
    ) -> Result<Self> {
        if overlap > annotation_size || overlap > target_size {
            return Err(EnrichError::data_integrity(format!(
                "overlap {} exceeds annotation size {} or target size {}",
                overlap, annotation_size, target_size
            )));
        }

        let b = annotation_size - overlap;
        let c = target_size - overlap;
        let occupied = overlap + b + c;
        if occupied > universe_size {
            return Err(EnrichError::data_integrity(format!(
                "universe of {} entities cannot hold {} observed entities (cell D = {})",
                universe_size,
                occupied,
                universe_size as i64 - occupied as i64
            )));
        }

        Ok(ContingencyTable::new(
            overlap as u64,
            b as u64,
            c as u64,
            (universe_size - occupied) as u64,
        ))
    }

    pub fn total(&self) -> u64 {
        self.a + self.b + self.c + self.d
    }

    /// Sample odds ratio `(a*d) / (b*c)`.
    ///
    /// Infinite when only the denominator is zero, NaN when both are.
    pub fn odds_ratio(&self) -> f64 {
        let numerator = self.a as f64 * self.d as f64;
        let denominator = self.b as f64 * self.c as f64;
        if denominator == 0.0 {
            if numerator > 0.0 { f64::INFINITY } else { f64::NAN }
        } else {
            numerator / denominator
        }
    }

    /// Log of the hypergeometric probability of observing `x` in cell `a`
    /// with all margins held fixed.
    fn ln_pmf(&self, x: u64) -> f64 {
        let population = self.total();
        let successes = self.a + self.b;
        let draws = self.a + self.c;
        ln_binomial(successes, x) + ln_binomial(population - successes, draws - x)
            - ln_binomial(population, draws)
    }

    /// Distribution of cell `a` with all margins held fixed.
    fn hypergeometric(&self) -> Result<Hypergeometric> {
        Hypergeometric::new(self.total(), self.a + self.b, self.a + self.c)
            .map_err(|e| EnrichError::data_integrity(format!("table {:?}: {}", self, e)))
    }

    /// Range of values cell `a` can take with the margins held fixed.
    fn support(&self) -> (u64, u64) {
        let population = self.total();
        let successes = self.a + self.b;
        let draws = self.a + self.c;
        let low = draws.saturating_sub(population - successes);
        let high = successes.min(draws);
        (low, high)
    }
}

/// Fisher's exact test on a 2x2 table.
///
/// The statistic is the sample odds ratio. One-sided tails come from the
/// hypergeometric survival and distribution functions; the two-sided test sums
/// log-space point probabilities, so the margins may be as large as a
/// genome-wide universe without overflowing.
pub fn fisher_exact(table: &ContingencyTable, alternative: Alternative) -> Result<TestResult> {
    let odds_ratio = table.odds_ratio();
    if table.total() == 0 {
        return Ok(TestResult::new(odds_ratio, 1.0));
    }

    let (low, high) = table.support();
    let observed = table.a;

    let p_value = match alternative {
        Alternative::Greater => {
            if observed <= low {
                1.0
            } else {
                // P(X >= a) = P(X > a - 1)
                table.hypergeometric()?.sf(observed - 1)
            }
        }
        Alternative::Less => {
            if observed >= high {
                1.0
            } else {
                table.hypergeometric()?.cdf(observed)
            }
        }
        Alternative::TwoSided => {
            let observed_ln = table.ln_pmf(observed);
            let cutoff = observed_ln + TWO_SIDED_RTOL.ln_1p();
            (low..=high)
                .map(|x| table.ln_pmf(x))
                .filter(|&ln_p| ln_p <= cutoff)
                .map(f64::exp)
                .sum()
        }
    };

    Ok(TestResult::new(odds_ratio, p_value.clamp(0.0, 1.0)))
}

/// One-sided ("greater") Fisher test of an annotation set against a target set
/// within a universe of `universe_size` distinct entities.
///
/// Returns `(odds_ratio, p_value)`.
pub fn fisher_enrichment(
    overlap: usize,
    annotation_size: usize,
    target_size: usize,
    universe_size: usize,
) -> Result<(f64, f64)> {
    let table = ContingencyTable::from_overlap(overlap, annotation_size, target_size, universe_size)?;
    let result = fisher_exact(&table, Alternative::Greater)?;
    Ok((result.statistic, result.p_value))
}

/// A probability expressed as `-log10(p)`.
///
/// Kept as its own type so it cannot be mixed up with a linear p-value.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct NegLog10P(pub f64);

impl NegLog10P {
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Converts back to a linear probability. Underflows to 0 for very
    /// significant tables, which is why the log form exists.
    pub fn to_linear(&self) -> f64 {
        10f64.powf(-self.0)
    }
}

/// Log-factorial approximation for tables whose p-values are too small to
/// represent or too slow to sum exactly.
///
/// Returns the probability of the observed table itself (the leading term of
/// the one-sided tail) as `-log10(p)`.
pub fn fisher_exact_approx(table: &ContingencyTable) -> NegLog10P {
    let ContingencyTable { a, b, c, d } = *table;
    let upper = ln_factorial(a + b) + ln_factorial(c + d) + ln_factorial(a + c) + ln_factorial(b + d);
    let lower = ln_factorial(a)
        + ln_factorial(b)
        + ln_factorial(c)
        + ln_factorial(d)
        + ln_factorial(a + b + c + d);
    NegLog10P((lower - upper) / LN_10)
}
