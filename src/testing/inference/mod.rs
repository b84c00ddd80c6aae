//! Exact tests on count data.

pub mod discrete;

pub use discrete::{ContingencyTable, NegLog10P, fisher_enrichment, fisher_exact, fisher_exact_approx};
