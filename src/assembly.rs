//! End-to-end assembly pipeline and batch runs.
//!
//! A [`Pipeline`] composes an injected overlap scorer with an optional strand
//! resolver; every variant of the assembler is a configuration of this one
//! type rather than a separate implementation.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::config::{AssemblyConfig, ConfigError};
use crate::contraction::{
    AssemblyState, ContractionError, MergeEvent, NoSnapshots, SnapshotSink, TieBreak,
};
use crate::graph::{GraphError, OverlapGraph};
use crate::overlap::{create_overlap_graph, OverlapScorer, ScorerKind};
use crate::strand::StrandOrientationResolver;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(thiserror::Error, Debug)]
pub enum AssemblyError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("assembly run {run} failed: {source}")]
    Contraction {
        run: usize,
        #[source]
        source: ContractionError,
    },
    #[cfg(feature = "parallel")]
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Final state of one assembly run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssemblyResult {
    /// Surviving sequences in label order.
    pub contigs: Vec<String>,
    /// Chronological merge log.
    pub merge_log: Vec<MergeEvent>,
    /// Number of reads the run started from.
    pub read_count: usize,
}

impl AssemblyResult {
    /// Number of unify-steps executed.
    pub fn steps(&self) -> usize {
        self.merge_log.len()
    }

    pub fn contig_count(&self) -> usize {
        self.contigs.len()
    }

    /// Merge log rendered one event per line.
    pub fn log_lines(&self) -> Vec<String> {
        self.merge_log.iter().map(ToString::to_string).collect()
    }
}

/// Composition of a scorer, an optional strand resolver and contraction policy.
#[derive(Debug, Clone)]
pub struct Pipeline<S = ScorerKind> {
    scorer: S,
    resolver: Option<StrandOrientationResolver>,
    min_weight: usize,
    tie_break: TieBreak,
}

impl Pipeline<ScorerKind> {
    pub fn from_config(config: &AssemblyConfig) -> Self {
        let resolver = config
            .strand_resolution
            .then_some(StrandOrientationResolver);
        Self::new(config.scorer, resolver, config.min_weight, config.tie_break)
    }
}

impl<S: OverlapScorer + Sync> Pipeline<S> {
    pub fn new(
        scorer: S,
        resolver: Option<StrandOrientationResolver>,
        min_weight: usize,
        tie_break: TieBreak,
    ) -> Self {
        Self {
            scorer,
            resolver,
            min_weight,
            tie_break,
        }
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    /// Apply strand resolution when configured.
    pub fn prepare_reads(&self, reads: &[String]) -> Vec<String> {
        match &self.resolver {
            Some(resolver) => resolver.resolve(reads, &self.scorer).reads,
            None => reads.to_vec(),
        }
    }

    pub fn build_graph(&self, reads: &[String]) -> Result<OverlapGraph, GraphError> {
        create_overlap_graph(reads, &self.scorer, self.min_weight)
    }

    /// Run the full pipeline once, from raw reads to contigs.
    pub fn run<R, K>(
        &self,
        reads: &[String],
        rng: &mut R,
        sink: &mut K,
    ) -> Result<AssemblyResult, ContractionError>
    where
        R: Rng + ?Sized,
        K: SnapshotSink + ?Sized,
    {
        let prepared = self.prepare_reads(reads);
        self.run_prepared(&prepared, rng, sink)
    }

    /// Run contraction on reads that have already been strand-resolved.
    pub fn run_prepared<R, K>(
        &self,
        reads: &[String],
        rng: &mut R,
        sink: &mut K,
    ) -> Result<AssemblyResult, ContractionError>
    where
        R: Rng + ?Sized,
        K: SnapshotSink + ?Sized,
    {
        let mut state = AssemblyState::new(self.build_graph(reads)?);
        state.contract(self.tie_break, rng, sink)?;
        let contigs = state.contigs();
        let (_, merge_log) = state.into_parts();
        Ok(AssemblyResult {
            contigs,
            merge_log,
            read_count: reads.len(),
        })
    }
}

/// Results of `iterations` independent runs.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    /// Seed of run 0; run `i` was seeded with `base_seed + i`.
    pub base_seed: u64,
    pub runs: Vec<AssemblyResult>,
}

impl BatchOutcome {
    /// Index of the run with the fewest contigs (earliest on ties).
    pub fn best_index(&self) -> Option<usize> {
        self.runs
            .iter()
            .enumerate()
            .min_by_key(|(_, run)| run.contig_count())
            .map(|(idx, _)| idx)
    }

    pub fn best(&self) -> Option<&AssemblyResult> {
        self.best_index().map(|idx| &self.runs[idx])
    }
}

/// Seed for run `run` of a batch starting at `base_seed`.
pub fn run_seed(base_seed: u64, run: usize) -> u64 {
    base_seed.wrapping_add(run as u64)
}

/// Assemble once with a seeded RNG and no snapshots.
pub fn assemble(
    reads: &[String],
    config: &AssemblyConfig,
) -> Result<AssemblyResult, AssemblyError> {
    config.validate()?;
    let seed = config.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    Pipeline::from_config(config)
        .run(reads, &mut rng, &mut NoSnapshots)
        .map_err(|source| AssemblyError::Contraction { run: 0, source })
}

/// Run `config.iterations` independent assemblies over private graph copies.
///
/// `make_sink(i)` supplies the snapshot sink for run `i`. Strand resolution
/// is deterministic, so it is computed once and shared by all runs.
pub fn run_batch<K, F>(
    reads: &[String],
    config: &AssemblyConfig,
    make_sink: F,
) -> Result<BatchOutcome, AssemblyError>
where
    K: SnapshotSink,
    F: Fn(usize) -> K + Sync,
{
    config.validate()?;
    let base_seed = config.seed.unwrap_or_else(rand::random);
    let pipeline = Pipeline::from_config(config);
    let prepared = pipeline.prepare_reads(reads);
    log::info!(
        "Running {} {} assembly iteration(s) over {} reads (base seed {})",
        config.iterations,
        config.variant_name(),
        reads.len(),
        base_seed
    );

    let single_run = |run: usize| -> Result<AssemblyResult, AssemblyError> {
        let mut rng = StdRng::seed_from_u64(run_seed(base_seed, run));
        let mut sink = make_sink(run);
        let result = pipeline
            .run_prepared(&prepared, &mut rng, &mut sink)
            .map_err(|source| AssemblyError::Contraction { run, source })?;
        log::info!("Run {run}: {} contigs after {} merges", result.contig_count(), result.steps());
        Ok(result)
    };

    #[cfg(feature = "parallel")]
    let runs = if config.threads > 1 && config.iterations > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build()?;
        pool.install(|| {
            (0..config.iterations)
                .into_par_iter()
                .map(single_run)
                .collect::<Result<Vec<_>, _>>()
        })?
    } else {
        (0..config.iterations)
            .map(single_run)
            .collect::<Result<Vec<_>, _>>()?
    };

    #[cfg(not(feature = "parallel"))]
    let runs = (0..config.iterations)
        .map(single_run)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(BatchOutcome { base_seed, runs })
}
