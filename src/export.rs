//! Writers for graph snapshots, merge logs, contigs and run directories.
//!
//! None of this is used by the core algorithm; the binary wires these up as
//! snapshot sinks and post-run reporters.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::contraction::{MergeEvent, SnapshotError, SnapshotSink};
use crate::graph::GraphSnapshot;

#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid snapshot JSON {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ExportError + '_ {
    move |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn create(path: &Path) -> Result<BufWriter<File>, ExportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }
    }
    File::create(path).map(BufWriter::new).map_err(io_error(path))
}

/// Snapshot file format written per contraction step.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum SnapshotFormat {
    #[default]
    None,
    Json,
    Gfa,
}

impl SnapshotFormat {
    fn extension(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Json => Some("json"),
            Self::Gfa => Some("gfa"),
        }
    }
}

pub fn write_snapshot_json(snapshot: &GraphSnapshot, path: &Path) -> Result<(), ExportError> {
    let mut writer = create(path)?;
    serde_json::to_writer_pretty(&mut writer, snapshot).map_err(|source| ExportError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    writeln!(writer).map_err(io_error(path))?;
    writer.flush().map_err(io_error(path))
}

pub fn read_snapshot_json(path: &Path) -> Result<GraphSnapshot, ExportError> {
    let file = File::open(path).map_err(io_error(path))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| ExportError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Render a snapshot as GFA 1.0: one segment per vertex, one link per edge.
pub fn render_gfa(snapshot: &GraphSnapshot) -> String {
    let mut out = String::from("H\tVN:Z:1.0\n");
    for vertex in &snapshot.vertices {
        out.push_str(&format!(
            "S\t{}\t{}\tLN:i:{}\n",
            vertex.label,
            if vertex.name.is_empty() { "*" } else { vertex.name.as_str() },
            vertex.name.len()
        ));
    }
    for edge in &snapshot.edges {
        out.push_str(&format!(
            "L\t{}\t+\t{}\t+\t{}M\n",
            edge.source, edge.target, edge.weight
        ));
    }
    out
}

pub fn write_snapshot_gfa(snapshot: &GraphSnapshot, path: &Path) -> Result<(), ExportError> {
    let mut writer = create(path)?;
    writer
        .write_all(render_gfa(snapshot).as_bytes())
        .map_err(io_error(path))?;
    writer.flush().map_err(io_error(path))
}

/// One rendered merge event per line.
pub fn write_merge_log(events: &[MergeEvent], path: &Path) -> Result<(), ExportError> {
    let mut writer = create(path)?;
    for event in events {
        writeln!(writer, "{event}").map_err(io_error(path))?;
    }
    writer.flush().map_err(io_error(path))
}

/// Write contigs as FASTA, wrapping sequence lines at `line_width` (0 = no wrap).
pub fn write_contigs_fasta<W: Write>(
    writer: &mut W,
    contigs: &[String],
    header_prefix: &str,
    line_width: usize,
) -> std::io::Result<()> {
    for (idx, contig) in contigs.iter().enumerate() {
        writeln!(writer, ">{header_prefix}_{idx} len={}", contig.len())?;
        if line_width == 0 || contig.is_empty() {
            writeln!(writer, "{contig}")?;
            continue;
        }
        for chunk in contig.as_bytes().chunks(line_width) {
            writer.write_all(chunk)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

pub fn write_contigs_fasta_file(
    contigs: &[String],
    header_prefix: &str,
    line_width: usize,
    path: &Path,
) -> Result<(), ExportError> {
    let mut writer = create(path)?;
    write_contigs_fasta(&mut writer, contigs, header_prefix, line_width).map_err(io_error(path))?;
    writer.flush().map_err(io_error(path))
}

/// File name of `input` up to its first dot, `reads` when that is empty.
pub fn input_stem(input: &Path) -> String {
    input
        .file_name()
        .map(|name| name.to_string_lossy())
        .and_then(|name| name.split('.').next().map(str::to_string))
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "reads".to_string())
}

/// Create `<log_root>/<input stem>/<variant>/run_<n>_<dd-mm-YYYY>/`.
///
/// `n` is the number of entries already present in the variant folder, so
/// repeated invocations never reuse a directory.
pub fn prepare_run_dir(
    log_root: &Path,
    input: &Path,
    variant: &str,
) -> Result<PathBuf, ExportError> {
    let variant_dir = log_root.join(input_stem(input)).join(variant);
    fs::create_dir_all(&variant_dir).map_err(io_error(&variant_dir))?;

    let existing = fs::read_dir(&variant_dir)
        .map_err(io_error(&variant_dir))?
        .count();
    let date = chrono::Local::now().format("%d-%m-%Y");
    let mut run_dir = variant_dir.join(format!("run_{existing}_{date}"));
    let mut bump = existing;
    while run_dir.exists() {
        bump += 1;
        run_dir = variant_dir.join(format!("run_{bump}_{date}"));
    }
    fs::create_dir_all(&run_dir).map_err(io_error(&run_dir))?;
    log::debug!("Prepared run directory {}", run_dir.display());
    Ok(run_dir)
}

/// Snapshot sink writing `step_<n>.<ext>` files into a run directory.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    dir: PathBuf,
    format: SnapshotFormat,
}

impl SnapshotWriter {
    pub fn new<P: Into<PathBuf>>(dir: P, format: SnapshotFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }

    pub fn disabled() -> Self {
        Self::new(PathBuf::new(), SnapshotFormat::None)
    }

    pub fn path_for(&self, step: usize) -> Option<PathBuf> {
        self.format
            .extension()
            .map(|ext| self.dir.join(format!("step_{step}.{ext}")))
    }
}

impl SnapshotSink for SnapshotWriter {
    fn on_snapshot(&mut self, step: usize, snapshot: &GraphSnapshot) -> Result<(), SnapshotError> {
        let Some(path) = self.path_for(step) else {
            return Ok(());
        };
        match self.format {
            SnapshotFormat::None => {}
            SnapshotFormat::Json => write_snapshot_json(snapshot, &path)?,
            SnapshotFormat::Gfa => write_snapshot_gfa(snapshot, &path)?,
        }
        Ok(())
    }

    fn wants_snapshots(&self) -> bool {
        self.format != SnapshotFormat::None
    }
}
