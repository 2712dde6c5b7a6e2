//! Read ingestion from plain-line, FASTA and FASTQ files (optionally gzipped).

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use bio::io::{fasta, fastq};
use flate2::read::MultiGzDecoder;

/// Errors returned while loading reads.
#[derive(thiserror::Error, Debug)]
pub enum ReadSourceError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed FASTQ record: {0}")]
    Fastq(#[from] fastq::Error),
    #[error("read {index} contains non-ASCII symbols")]
    NonAscii { index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceFormat {
    Fastq,
    Fasta,
    Lines,
}

fn is_gzip(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz") || ext.eq_ignore_ascii_case("bgz"))
        .unwrap_or(false)
}

/// Infer the record format from the file extension, looking through `.gz`.
pub fn infer_format(path: &Path) -> SequenceFormat {
    let mut ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();

    if ext == "gz" || ext == "bgz" {
        ext = path
            .file_stem()
            .and_then(|stem| Path::new(stem).extension())
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase())
            .unwrap_or_default();
    }

    match ext.as_str() {
        "fastq" | "fq" => SequenceFormat::Fastq,
        "fasta" | "fa" | "fna" => SequenceFormat::Fasta,
        _ => SequenceFormat::Lines,
    }
}

fn open_reader(path: &Path) -> Result<Box<dyn BufRead>, ReadSourceError> {
    let file = File::open(path).map_err(|source| ReadSourceError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    if is_gzip(path) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

fn normalise(index: usize, bytes: &[u8]) -> Result<String, ReadSourceError> {
    if !bytes.is_ascii() {
        return Err(ReadSourceError::NonAscii { index });
    }
    let upper: Vec<u8> = bytes.iter().map(u8::to_ascii_uppercase).collect();
    // ASCII was checked above.
    String::from_utf8(upper).map_err(|_| ReadSourceError::NonAscii { index })
}

/// One read per line; lines are trimmed and blank lines skipped.
pub fn parse_lines<R: BufRead>(reader: R) -> Result<Vec<String>, ReadSourceError> {
    let mut sequences = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        sequences.push(normalise(sequences.len(), trimmed.as_bytes())?);
    }
    Ok(sequences)
}

pub fn parse_fasta<R: BufRead>(reader: R) -> Result<Vec<String>, ReadSourceError> {
    let mut sequences = Vec::new();
    for record in fasta::Reader::from_bufread(reader).records() {
        let record = record?;
        sequences.push(normalise(sequences.len(), record.seq())?);
    }
    Ok(sequences)
}

pub fn parse_fastq<R: BufRead>(reader: R) -> Result<Vec<String>, ReadSourceError> {
    let mut sequences = Vec::new();
    for record in fastq::Reader::from_bufread(reader).records() {
        let record = record?;
        sequences.push(normalise(sequences.len(), record.seq())?);
    }
    Ok(sequences)
}

/// Load every read from `path`, in file order, uppercased.
pub fn read_sequences<P: AsRef<Path>>(path: P) -> Result<Vec<String>, ReadSourceError> {
    let path = path.as_ref();
    let format = infer_format(path);
    let reader = open_reader(path)?;
    log::debug!("Reading {} as {:?}", path.display(), format);

    let sequences = match format {
        SequenceFormat::Fastq => parse_fastq(reader)?,
        SequenceFormat::Fasta => parse_fasta(reader)?,
        SequenceFormat::Lines => parse_lines(reader)?,
    };
    log::info!("Loaded {} reads from {}", sequences.len(), path.display());
    Ok(sequences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn infers_format_through_gzip_suffix() {
        assert_eq!(infer_format(Path::new("reads.fq")), SequenceFormat::Fastq);
        assert_eq!(infer_format(Path::new("reads.FASTA.gz")), SequenceFormat::Fasta);
        assert_eq!(infer_format(Path::new("frag_a.dat")), SequenceFormat::Lines);
        assert_eq!(infer_format(Path::new("frag_a")), SequenceFormat::Lines);
    }

    #[test]
    fn parses_trimmed_lines_and_skips_blanks() {
        let input = Cursor::new("  acgt \n\nGATC\r\n   \nttag");
        let reads = parse_lines(input).unwrap();
        assert_eq!(reads, vec!["ACGT", "GATC", "TTAG"]);
    }

    #[test]
    fn blank_lines_inside_a_file_do_not_become_reads() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let path = dir.path().join("frag.dat");
        std::fs::write(&path, "aaga\n\n   \ngatc\n").unwrap();

        let reads = read_sequences(&path).unwrap();
        assert_eq!(reads, vec!["AAGA", "GATC"]);

        let result = crate::assemble(&reads, &crate::AssemblyConfig::default()).unwrap();
        assert_eq!(result.log_lines(), vec!["2|AAGATC | AAGATC:0<-GATC:1".to_string()]);
    }

    #[test]
    fn rejects_non_ascii_symbols() {
        let input = Cursor::new("ACGT\nAÇGT\n");
        let err = parse_lines(input).unwrap_err();
        assert!(matches!(err, ReadSourceError::NonAscii { index: 1 }));
    }

    #[test]
    fn parses_fasta_and_fastq_records() {
        let fasta = Cursor::new(">r1\nACGT\nAC\n>r2\ngatc\n");
        assert_eq!(parse_fasta(fasta).unwrap(), vec!["ACGTAC", "GATC"]);

        let fastq = Cursor::new("@r1\nACGT\n+\nIIII\n@r2\nTTGA\n+\nIIII\n");
        assert_eq!(parse_fastq(fastq).unwrap(), vec!["ACGT", "TTGA"]);
    }

    #[test]
    fn reads_gzipped_line_files() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let dir = tempfile::tempdir().expect("tmpdir");
        let path = dir.path().join("frag.dat.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        writeln!(encoder, "AAGA").unwrap();
        writeln!(encoder, "GATC").unwrap();
        encoder.finish().unwrap();

        assert_eq!(read_sequences(&path).unwrap(), vec!["AAGA", "GATC"]);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = read_sequences("/nonexistent/frag.dat").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/frag.dat"));
    }
}
