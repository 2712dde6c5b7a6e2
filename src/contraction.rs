//! Greedy contraction of the overlap graph.
//!
//! The engine repeatedly selects the heaviest remaining edge, merges its
//! target into its source and rewires the neighbourhood, until no edges are
//! left. Every merge is appended to an audit log of [`MergeEvent`]s.

use std::error::Error as StdError;
use std::fmt;

use clap::ValueEnum;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::graph::{EdgeId, GraphError, GraphSnapshot, OverlapGraph};

/// Error type returned by snapshot sinks.
pub type SnapshotError = Box<dyn StdError + Send + Sync>;

#[derive(thiserror::Error, Debug)]
pub enum ContractionError {
    /// Edge selection or rewiring touched a removed vertex or edge.
    #[error("overlap graph bookkeeping violated: {0}")]
    Graph(#[from] GraphError),
    #[error("snapshot sink failed after step {step}: {source}")]
    Snapshot {
        step: usize,
        #[source]
        source: SnapshotError,
    },
}

/// Policy for choosing among edges that tie for the maximum weight.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak {
    /// First tied edge in insertion order; reproducible.
    #[default]
    StableFirst,
    /// Uniformly random tied edge, drawn from the caller's RNG.
    Random,
}

/// Whether any unify-step can still fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractionState {
    Active,
    Done,
}

/// Record of a single unification of two vertices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeEvent {
    pub weight: usize,
    pub merged_name: String,
    pub source_label: usize,
    pub target_label: usize,
    /// Target sequence as it was immediately before the merge.
    pub target_name: String,
}

impl fmt::Display for MergeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{} | {}:{}<-{}:{}",
            self.weight,
            self.merged_name,
            self.merged_name,
            self.source_label,
            self.target_name,
            self.target_label
        )
    }
}

/// Receiver for graph snapshots taken during contraction.
///
/// Called with step `0` before the first unify-step and with step `n` after
/// the `n`-th merge.
pub trait SnapshotSink {
    fn on_snapshot(&mut self, step: usize, snapshot: &GraphSnapshot) -> Result<(), SnapshotError>;

    /// Sinks that discard snapshots return `false` so none are built.
    fn wants_snapshots(&self) -> bool {
        true
    }
}

/// Sink that ignores every snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSnapshots;

impl SnapshotSink for NoSnapshots {
    fn on_snapshot(
        &mut self,
        _step: usize,
        _snapshot: &GraphSnapshot,
    ) -> Result<(), SnapshotError> {
        Ok(())
    }

    fn wants_snapshots(&self) -> bool {
        false
    }
}

impl<F> SnapshotSink for F
where
    F: FnMut(usize, &GraphSnapshot) -> Result<(), SnapshotError>,
{
    fn on_snapshot(&mut self, step: usize, snapshot: &GraphSnapshot) -> Result<(), SnapshotError> {
        self(step, snapshot)
    }
}

/// `source + target[overlap..]`, byte-wise so arbitrary input never panics.
pub fn merge_names(source: &str, target: &str, overlap: usize) -> String {
    let tail = target.as_bytes().get(overlap..).unwrap_or(&[]);
    let mut merged = Vec::with_capacity(source.len() + tail.len());
    merged.extend_from_slice(source.as_bytes());
    merged.extend_from_slice(tail);
    String::from_utf8(merged)
        .unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
}

/// Exclusive owner of one overlap graph and its merge log.
#[derive(Debug, Clone)]
pub struct AssemblyState {
    graph: OverlapGraph,
    merge_log: Vec<MergeEvent>,
}

impl AssemblyState {
    pub fn new(graph: OverlapGraph) -> Self {
        Self {
            graph,
            merge_log: Vec::new(),
        }
    }

    pub fn state(&self) -> ContractionState {
        if self.graph.edge_count() == 0 {
            ContractionState::Done
        } else {
            ContractionState::Active
        }
    }

    pub fn graph(&self) -> &OverlapGraph {
        &self.graph
    }

    pub fn merge_log(&self) -> &[MergeEvent] {
        &self.merge_log
    }

    /// Current contigs: one sequence per live vertex, in label order.
    pub fn contigs(&self) -> Vec<String> {
        self.graph.names()
    }

    pub fn into_parts(self) -> (OverlapGraph, Vec<MergeEvent>) {
        (self.graph, self.merge_log)
    }

    /// Pick the edge the next unify-step would contract.
    pub fn select_edge<R>(&self, tie_break: TieBreak, rng: &mut R) -> Option<EdgeId>
    where
        R: Rng + ?Sized,
    {
        let ties = self.graph.heaviest_edges();
        match tie_break {
            TieBreak::StableFirst => ties.first().copied(),
            TieBreak::Random => ties.choose(rng).copied(),
        }
    }

    /// Fire one unify-step. Returns `None` without touching the graph when
    /// the state is already [`ContractionState::Done`].
    pub fn unify_step<R>(
        &mut self,
        tie_break: TieBreak,
        rng: &mut R,
    ) -> Result<Option<&MergeEvent>, GraphError>
    where
        R: Rng + ?Sized,
    {
        let Some(edge_id) = self.select_edge(tie_break, rng) else {
            return Ok(None);
        };
        self.contract_edge(edge_id)?;
        Ok(self.merge_log.last())
    }

    fn contract_edge(&mut self, edge_id: EdgeId) -> Result<(), GraphError> {
        let edge = *self.graph.edge(edge_id)?;
        let (source, target, weight) = (edge.source(), edge.target(), edge.weight());

        let target_vertex = self.graph.vertex(target)?;
        let target_label = target_vertex.label();
        let target_name = target_vertex.name().to_owned();
        let source_vertex = self.graph.vertex(source)?;
        let source_label = source_vertex.label();
        let merged_name = merge_names(source_vertex.name(), &target_name, weight);

        self.graph.rename_vertex(source, merged_name.clone())?;
        let event = MergeEvent {
            weight,
            merged_name,
            source_label,
            target_label,
            target_name,
        };
        log::debug!("merge #{}: {}", self.merge_log.len() + 1, event);
        self.merge_log.push(event);

        // Outgoing overlaps of the source described its old suffix.
        for stale in self.graph.outgoing_edges(source)? {
            self.graph.remove_edge(stale)?;
        }

        // The source now ends with the target's suffix; inherit its overlaps.
        let inherited: Vec<(usize, usize)> = self
            .graph
            .outgoing_edges(target)?
            .into_iter()
            .map(|id| self.graph.edge(id).map(|e| (e.target(), e.weight())))
            .collect::<Result<_, _>>()?;
        for (next, weight) in inherited {
            if next != source {
                self.graph.add_edge(source, next, weight)?;
            }
        }

        self.graph.remove_vertex(target)?;
        Ok(())
    }

    /// Contract until no edges remain, reporting snapshots to `sink`.
    ///
    /// Returns the number of unify-steps executed.
    pub fn contract<R, K>(
        &mut self,
        tie_break: TieBreak,
        rng: &mut R,
        sink: &mut K,
    ) -> Result<usize, ContractionError>
    where
        R: Rng + ?Sized,
        K: SnapshotSink + ?Sized,
    {
        let mut steps = 0;
        self.emit_snapshot(steps, sink)?;

        while self.state() == ContractionState::Active {
            if self.unify_step(tie_break, rng)?.is_none() {
                break;
            }
            steps += 1;
            self.emit_snapshot(steps, sink)?;
        }

        log::info!(
            "Contraction finished after {} merges: {} contigs",
            steps,
            self.graph.vertex_count()
        );
        Ok(steps)
    }

    fn emit_snapshot<K>(&self, step: usize, sink: &mut K) -> Result<(), ContractionError>
    where
        K: SnapshotSink + ?Sized,
    {
        if !sink.wants_snapshots() {
            return Ok(());
        }
        log::trace!("snapshot at step {step}");
        sink.on_snapshot(step, &self.graph.snapshot())
            .map_err(|source| ContractionError::Snapshot { step, source })
    }
}
