//! Reference tables consumed by target inference.
//!
//! Loading and caching the tables is left to the caller; the inference
//! strategies only see the types below through a [`ReferenceProvider`].

use crate::error::{EnrichError, Result};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use ndarray::{Array1, Array2};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Reference name of the curated TF -> target edge list.
pub const CURATED_NETWORK: &str = "trrust";
/// Reference name of the TF x gene correlation matrix.
pub const CORRELATIONS: &str = "correlations";
/// Reference name of the protein-interaction score table.
pub const INTERACTIONS: &str = "string";

fn index_labels(labels: &[String], axis: &str) -> Result<HashMap<String, usize>> {
    let mut index = HashMap::with_capacity(labels.len());
    for (i, label) in labels.iter().enumerate() {
        if index.insert(label.clone(), i).is_some() {
            return Err(EnrichError::invalid_input(format!(
                "duplicate {} label '{}'",
                axis, label
            )));
        }
    }
    Ok(index)
}

/// Dense driver x gene association matrix with labelled axes.
#[derive(Debug, Clone)]
pub struct CorrelationTable {
    rows: Vec<String>,
    columns: Vec<String>,
    row_index: HashMap<String, usize>,
    values: Array2<f64>,
}

impl CorrelationTable {
    pub fn new(rows: Vec<String>, columns: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if values.nrows() != rows.len() || values.ncols() != columns.len() {
            return Err(EnrichError::invalid_input(format!(
                "correlation values are {}x{} but {} row and {} column labels were given",
                values.nrows(),
                values.ncols(),
                rows.len(),
                columns.len()
            )));
        }
        let row_index = index_labels(&rows, "row")?;
        index_labels(&columns, "column")?;

        Ok(CorrelationTable {
            rows,
            columns,
            row_index,
            values,
        })
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn row_position(&self, name: &str) -> Option<usize> {
        self.row_index.get(name).copied()
    }

    /// Sum of absolute values over `rows`, one entry per column. Missing
    /// (non-finite) cells contribute nothing.
    pub fn summed_abs(&self, rows: &[usize]) -> Array1<f64> {
        let mut sums = Array1::zeros(self.columns.len());
        for &r in rows {
            sums.zip_mut_with(&self.values.row(r), |s, &v| {
                if v.is_finite() {
                    *s += v.abs();
                }
            });
        }
        sums
    }
}

/// Directed, weighted source -> target table backed by a CSR matrix.
///
/// Duplicate edges are summed, so an edge list with unit scores turns into
/// occurrence counts.
#[derive(Debug, Clone)]
pub struct SparseNetwork {
    sources: Vec<String>,
    targets: Vec<String>,
    source_index: HashMap<String, usize>,
    target_index: HashMap<String, usize>,
    scores: CsrMatrix<f64>,
}

impl SparseNetwork {
    pub fn from_edges<I, S, T>(edges: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, T, f64)>,
        S: Into<String>,
        T: Into<String>,
    {
        let mut sources = Vec::new();
        let mut targets = Vec::new();
        let mut source_index: HashMap<String, usize> = HashMap::new();
        let mut target_index: HashMap<String, usize> = HashMap::new();
        let mut triplets = Vec::new();

        for (source, target, score) in edges {
            let (source, target) = (source.into(), target.into());
            if !score.is_finite() {
                return Err(EnrichError::invalid_input(format!(
                    "edge {} -> {} has non-finite score {}",
                    source, target, score
                )));
            }
            let row = *source_index.entry(source.clone()).or_insert_with(|| {
                sources.push(source);
                sources.len() - 1
            });
            let col = *target_index.entry(target.clone()).or_insert_with(|| {
                targets.push(target);
                targets.len() - 1
            });
            triplets.push((row, col, score));
        }

        let mut coo = CooMatrix::new(sources.len(), targets.len());
        for (row, col, score) in triplets {
            coo.push(row, col, score);
        }

        Ok(SparseNetwork {
            sources,
            targets,
            source_index,
            target_index,
            scores: CsrMatrix::from(&coo),
        })
    }

    /// Every entity with at least one outgoing edge.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    pub fn n_edges(&self) -> usize {
        self.scores.nnz()
    }

    pub fn source_position(&self, name: &str) -> Option<usize> {
        self.source_index.get(name).copied()
    }

    pub fn target_position(&self, name: &str) -> Option<usize> {
        self.target_index.get(name).copied()
    }

    pub fn target_name(&self, position: usize) -> &str {
        &self.targets[position]
    }

    /// Sums edge scores over the given source rows, grouped by target.
    pub fn aggregate(&self, rows: &[usize]) -> BTreeMap<usize, f64> {
        let mut totals = BTreeMap::new();
        for &r in rows {
            let row = self.scores.row(r);
            for (&col, &score) in row.col_indices().iter().zip(row.values()) {
                *totals.entry(col).or_insert(0.0) += score;
            }
        }
        totals
    }
}

/// Source of reference tables, keyed by name.
pub trait ReferenceProvider: Send + Sync {
    fn correlation_table(&self, name: &str) -> anyhow::Result<Arc<CorrelationTable>>;

    fn network(&self, name: &str) -> anyhow::Result<Arc<SparseNetwork>>;
}

/// Reference tables already held in memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryReferences {
    correlations: HashMap<String, Arc<CorrelationTable>>,
    networks: HashMap<String, Arc<SparseNetwork>>,
}

impl InMemoryReferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_correlation(mut self, name: impl Into<String>, table: CorrelationTable) -> Self {
        self.correlations.insert(name.into(), Arc::new(table));
        self
    }

    pub fn with_network(mut self, name: impl Into<String>, network: SparseNetwork) -> Self {
        self.networks.insert(name.into(), Arc::new(network));
        self
    }
}

impl ReferenceProvider for InMemoryReferences {
    fn correlation_table(&self, name: &str) -> anyhow::Result<Arc<CorrelationTable>> {
        self.correlations
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no correlation table registered as '{}'", name))
    }

    fn network(&self, name: &str) -> anyhow::Result<Arc<SparseNetwork>> {
        self.networks
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no network registered as '{}'", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_correlation_shape_checked() {
        let err = CorrelationTable::new(
            labels(&["TF1"]),
            labels(&["G1", "G2"]),
            array![[0.1, 0.2, 0.3]],
        )
        .unwrap_err();
        assert!(matches!(err, EnrichError::InvalidInput { .. }));

        let err = CorrelationTable::new(
            labels(&["TF1", "TF1"]),
            labels(&["G1"]),
            array![[0.1], [0.2]],
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate row label 'TF1'"));
    }

    #[test]
    fn test_summed_abs() {
        let table = CorrelationTable::new(
            labels(&["TF1", "TF2", "TF3"]),
            labels(&["G1", "G2"]),
            array![[0.5, -0.25], [-0.5, 0.25], [1.0, 1.0]],
        )
        .unwrap();
        let sums = table.summed_abs(&[0, 1]);
        assert_relative_eq!(sums[0], 1.0);
        assert_relative_eq!(sums[1], 0.5);
        assert_eq!(table.row_position("TF3"), Some(2));
        assert_eq!(table.row_position("tf3"), None);
    }

    #[test]
    fn test_summed_abs_skips_missing_cells() {
        let table = CorrelationTable::new(
            labels(&["TF1", "TF2"]),
            labels(&["G1", "G2"]),
            array![[0.95, f64::NAN], [f64::NAN, f64::NAN]],
        )
        .unwrap();
        assert!(table.values()[[0, 1]].is_nan());
        let sums = table.summed_abs(&[0, 1]);
        assert_relative_eq!(sums[0], 0.95);
        assert_eq!(sums[1], 0.0);
    }

    #[test]
    fn test_network_sums_duplicate_edges() {
        let network = SparseNetwork::from_edges(vec![
            ("TF1", "G1", 1.0),
            ("TF1", "G1", 1.0),
            ("TF1", "G2", 1.0),
            ("TF2", "G1", 1.0),
        ])
        .unwrap();
        assert_eq!(network.sources(), &labels(&["TF1", "TF2"])[..]);
        assert_eq!(network.n_edges(), 3);

        let g1 = network.target_position("G1").unwrap();
        let g2 = network.target_position("G2").unwrap();
        let totals = network.aggregate(&[0, 1]);
        assert_relative_eq!(totals[&g1], 3.0);
        assert_relative_eq!(totals[&g2], 1.0);

        let only_tf2 = network.aggregate(&[1]);
        assert!(!only_tf2.contains_key(&g2));
    }

    #[test]
    fn test_network_rejects_non_finite_scores() {
        let err = SparseNetwork::from_edges(vec![("TF1", "G1", f64::NAN)]).unwrap_err();
        assert!(matches!(err, EnrichError::InvalidInput { .. }));
    }

    #[test]
    fn test_in_memory_provider() {
        let references = InMemoryReferences::new().with_network(
            CURATED_NETWORK,
            SparseNetwork::from_edges(vec![("TF1", "G1", 1.0)]).unwrap(),
        );
        assert!(references.network(CURATED_NETWORK).is_ok());
        assert!(references.network(INTERACTIONS).is_err());
        assert!(references.correlation_table(CORRELATIONS).is_err());
    }
}
