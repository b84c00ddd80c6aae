//! # tf-enrichment
//!
//! Downstream functional enrichment for sets of transcription factors.
//!
//! Given a list of driver identifiers, the crate infers the set of genes those
//! drivers are likely to regulate and then tests that target set for
//! over-representation in curated annotation collections (GO, KEGG, Reactome,
//! GWAS catalogues) with a one-sided Fisher exact test and multiple-testing
//! correction.
//!
//! ## Core Features
//!
//! - **Target inference**: curated network lookup, correlation thresholding
//!   against a resampled null, or summed protein-interaction scores
//! - **Enrichment**: Fisher exact tests over every annotation set with at
//!   least ten members, ranked by p-value
//! - **Multiple Testing Correction**: Benjamini-Hochberg, Bonferroni, custom
//!   corrections and a bootstrap Z-test for interaction scores
//! - **Sparse Networks**: reference networks held as `CsrMatrix` from
//!   nalgebra-sparse
//!
//! ## Quick Start
//!
//! Build a [`TfEnricher`] from a driver list and an [`AnalysisConfig`], then call
//! [`TfEnricher::enrich_with_config`] to get an [`EnrichmentTable`].
//!
//! ## Module Organization
//!
//! - **[`targets`]**: Driver and target sets, inference strategies and reference tables
//! - **[`enrichment`]**: Annotation collections and the enrichment engine
//! - **[`testing`]**: Fisher exact test, multiple testing correction and resampling helpers
//! - **[`config`]**: Run configuration
//! - **[`enricher`]**: Session tying inference and enrichment together

pub mod config;
pub mod enricher;
pub mod enrichment;
pub mod error;
pub mod targets;
pub mod testing;

pub use config::AnalysisConfig;
pub use enricher::TfEnricher;
pub use enrichment::{AnnotationCollection, AnnotationSource, EnrichmentRecord, EnrichmentTable};
pub use error::{EnrichError, Result};
pub use targets::{DriverSet, TargetSet};
