//! greedy_olc library
//!
//! Greedy overlap-layout-consensus assembly of short reads: pairwise
//! suffix/prefix overlap scoring, an overlap graph with tombstoned storage,
//! optional strand canonicalisation, and heaviest-edge contraction into
//! contigs.

pub mod assembly;
pub mod config;
pub mod contraction;
pub mod export;
pub mod graph;
pub mod overlap;
pub mod read_source;
pub mod strand;

pub use assembly::{
    assemble, run_batch, run_seed, AssemblyError, AssemblyResult, BatchOutcome, Pipeline,
};
pub use config::{AssemblyConfig, ConfigError};
pub use contraction::{
    merge_names, AssemblyState, ContractionError, ContractionState, MergeEvent, NoSnapshots,
    SnapshotError, SnapshotSink, TieBreak,
};
pub use export::{ExportError, SnapshotFormat, SnapshotWriter};
pub use graph::{EdgeId, GraphError, GraphSnapshot, OverlapGraph, VertexId};
pub use overlap::{
    create_overlap_graph, ExactPrefixScorer, OverlapScorer, ScorerKind,
    SubstitutionTolerantScorer,
};
pub use read_source::{read_sequences, ReadSourceError};
pub use strand::{reverse_complement, StrandOrientationResolver, StrandResolution};
