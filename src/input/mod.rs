//! Input layer: turns tables and signal tracks into sorted partitions.

pub mod parsing;
pub mod signal;
pub mod tabular;

pub use signal::{read_bedgraph, read_wig};
pub use tabular::{ColumnSpec, ReferenceColumns, ReferenceReader, TabularInput, TabularReader};

use crate::error::{GaError, Result};
use crate::partition::PartitionSet;
use flate2::read::MultiGzDecoder;
use log::info;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Open a plain or gzip-compressed (`.gz`) file for buffered reading.
pub fn open_reader(path: &Path) -> Result<BufReader<Box<dyn Read>>> {
    let file = File::open(path).map_err(|e| {
        GaError::InvalidArgument(format!("cannot open {}: {}", path.display(), e))
    })?;
    let is_gzipped = path.extension() == Some(OsStr::new("gz"));
    let inner: Box<dyn Read> = if is_gzipped {
        Box::new(MultiGzDecoder::new(file))
    } else {
        Box::new(file)
    };
    Ok(BufReader::new(inner))
}

/// Layout of a signal track on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalFormat {
    /// One bedGraph file.
    BedGraph,
    /// One wiggle file covering every chromosome.
    Wig,
    /// A directory (or comma-separated list) of per-chromosome wiggle files.
    SepWig,
}

impl FromStr for SignalFormat {
    type Err = GaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bedgraph" => Ok(SignalFormat::BedGraph),
            "wig" | "onewig" | "onewiggz" => Ok(SignalFormat::Wig),
            "sepwig" | "sepwiggz" => Ok(SignalFormat::SepWig),
            other => Err(GaError::InvalidArgument(format!(
                "unknown signal format '{}' (expected bedgraph, wig or sepwig)",
                other
            ))),
        }
    }
}

fn read_one<R: BufRead>(reader: R, format: SignalFormat, set: &mut PartitionSet) -> Result<usize> {
    match format {
        SignalFormat::BedGraph => read_bedgraph(reader, set),
        SignalFormat::Wig | SignalFormat::SepWig => read_wig(reader, set),
    }
}

/// Files making up a per-chromosome track, in name order.
fn track_files(source: &Path) -> Result<Vec<PathBuf>> {
    if source.is_dir() {
        let mut files = Vec::new();
        for entry in fs::read_dir(source)? {
            let path = entry?.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        return Ok(files);
    }
    let listed = source.to_string_lossy();
    Ok(listed
        .split(',')
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect())
}

/// Load a signal track and sort it.
pub fn load_signal(source: &Path, format: SignalFormat) -> Result<PartitionSet> {
    let mut set = PartitionSet::new();
    let files = match format {
        SignalFormat::SepWig => track_files(source)?,
        _ => vec![source.to_path_buf()],
    };
    if files.is_empty() {
        return Err(GaError::InvalidArgument(format!(
            "no signal files found in {}",
            source.display()
        )));
    }

    let mut blocks = 0;
    for file in &files {
        blocks += read_one(open_reader(file)?, format, &mut set)?;
    }
    set.sort();
    info!(
        "loaded {} signal blocks on {} chromosomes from {}",
        blocks,
        set.len(),
        source.display()
    );
    Ok(set)
}

/// Load a peak or summit table and sort it.
pub fn load_table(path: &Path, reader: &TabularReader) -> Result<TabularInput> {
    let mut input = reader.read_path(path)?;
    input.records.sort();
    info!(
        "loaded {} records on {} chromosomes from {}",
        input.records.interval_count(),
        input.records.len(),
        path.display()
    );
    Ok(input)
}
