//! Overlap scoring strategies and overlap graph construction.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strsim::generic_hamming;

use crate::graph::{GraphError, OverlapGraph};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Scores how well a suffix of one read matches a prefix of another.
///
/// Implementations return the length `k` of the longest suffix of `first`
/// whose same-length prefix window of `second` satisfies the scorer's rule,
/// or `0` when no `k >= 1` qualifies. Candidate windows longer than `second`
/// are skipped, so scoring never reads past either sequence.
pub trait OverlapScorer {
    fn score(&self, first: &str, second: &str) -> usize;
}

impl<T: OverlapScorer + ?Sized> OverlapScorer for &T {
    fn score(&self, first: &str, second: &str) -> usize {
        (**self).score(first, second)
    }
}

/// Longest suffix/prefix overlap under exact symbol equality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExactPrefixScorer;

impl OverlapScorer for ExactPrefixScorer {
    fn score(&self, first: &str, second: &str) -> usize {
        let first = first.as_bytes();
        let second = second.as_bytes();
        let max_span = first.len().min(second.len());

        for span in (1..=max_span).rev() {
            if first[first.len() - span..] == second[..span] {
                return span;
            }
        }
        0
    }
}

/// Longest suffix/prefix overlap tolerating up to `ceil(k / 10)` substitutions.
///
/// Only positional mismatches are counted (Hamming distance over a fixed
/// window); insertions and deletions are not modelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubstitutionTolerantScorer;

impl SubstitutionTolerantScorer {
    /// Maximum number of mismatches accepted for a window of `span` symbols.
    pub fn error_quota(span: usize) -> usize {
        span.div_ceil(10)
    }
}

impl OverlapScorer for SubstitutionTolerantScorer {
    fn score(&self, first: &str, second: &str) -> usize {
        let first = first.as_bytes();
        let second = second.as_bytes();
        let max_span = first.len().min(second.len());

        for span in (1..=max_span).rev() {
            let suffix_window = &first[first.len() - span..];
            let prefix_window = &second[..span];
            // Windows are equal length, so the distance is always defined.
            let Ok(mismatches) = generic_hamming(suffix_window, prefix_window) else {
                continue;
            };
            if mismatches <= Self::error_quota(span) {
                return span;
            }
        }
        0
    }
}

/// Scorer selection as it appears in configuration files and on the command line.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum ScorerKind {
    /// Exact suffix/prefix equality.
    #[default]
    Exact,
    /// Hamming-style comparison with one tolerated substitution per ten symbols.
    #[value(alias = "substitution-tolerant")]
    #[serde(alias = "substitution-tolerant")]
    Substitution,
}

impl ScorerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Substitution => "substitution",
        }
    }
}

impl OverlapScorer for ScorerKind {
    fn score(&self, first: &str, second: &str) -> usize {
        match self {
            Self::Exact => ExactPrefixScorer.score(first, second),
            Self::Substitution => SubstitutionTolerantScorer.score(first, second),
        }
    }
}

/// Score every ordered pair `(read_idx, j)` for a single source row.
fn score_row<S>(
    reads: &[String],
    read_idx: usize,
    scorer: &S,
    min_weight: usize,
) -> Vec<(usize, usize)>
where
    S: OverlapScorer + ?Sized,
{
    let source = &reads[read_idx];
    reads
        .iter()
        .enumerate()
        .filter(|&(dst, _)| dst != read_idx)
        .filter_map(|(dst, target)| {
            let weight = scorer.score(source, target);
            (weight >= min_weight).then_some((dst, weight))
        })
        .collect()
}

/// Build the weighted overlap graph for the supplied reads.
///
/// Vertex `i` carries read `i` (label `i`). Every ordered pair `(i, j)` with
/// `i != j` is scored and an edge `i -> j` is added when the weight reaches
/// `min_weight`. Edges are inserted in row-major order regardless of whether
/// rows were scored in parallel. An edge the arena refuses is returned as an
/// error instead of being dropped.
pub fn create_overlap_graph<S>(
    reads: &[String],
    scorer: &S,
    min_weight: usize,
) -> Result<OverlapGraph, GraphError>
where
    S: OverlapScorer + Sync + ?Sized,
{
    let n = reads.len();
    log::info!(
        "Scoring {} ordered read pairs (min_weight = {})",
        n.saturating_mul(n.saturating_sub(1)),
        min_weight
    );

    #[cfg(feature = "parallel")]
    let rows: Vec<Vec<(usize, usize)>> = (0..n)
        .into_par_iter()
        .map(|read_idx| score_row(reads, read_idx, scorer, min_weight))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let rows: Vec<Vec<(usize, usize)>> = (0..n)
        .map(|read_idx| score_row(reads, read_idx, scorer, min_weight))
        .collect();

    let mut graph = OverlapGraph::with_capacity(n, rows.iter().map(Vec::len).sum());
    for read in reads {
        graph.add_vertex(read.clone());
    }
    for (src, row) in rows.into_iter().enumerate() {
        for (dst, weight) in row {
            graph.add_edge(src, dst, weight)?;
        }
    }

    log::info!(
        "Overlap graph built: {} vertices, {} edges",
        graph.vertex_count(),
        graph.edge_count()
    );
    Ok(graph)
}
