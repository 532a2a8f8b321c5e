//! Dist command implementation.
//!
//! Two modes over summit tables: the closest summit of file B for every
//! summit of file A, and the distances between neighbouring summits of
//! one file.

use crate::error::Result;
use crate::input::{load_table, ColumnSpec, TabularReader};
use crate::interval::IntervalRecord;
use crate::output::{file_extension, file_stem, parent_dir, TableWriter};
use crate::partition::PartitionSet;
use log::info;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Closest B summit of one A summit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Closest {
    pub distance: u64,
    pub position: u64,
}

/// Dist command configuration.
#[derive(Debug, Clone)]
pub struct DistCommand {
    pub columns_a: ColumnSpec,
    pub columns_b: ColumnSpec,
    pub header: bool,
}

impl Default for DistCommand {
    fn default() -> Self {
        Self::new()
    }
}

/// Summit position in column 3 by default.
fn summit_columns() -> ColumnSpec {
    ColumnSpec {
        chrom: 0,
        start: 3,
        end: 3,
        strand: None,
    }
}

impl DistCommand {
    pub fn new() -> Self {
        Self {
            columns_a: summit_columns(),
            columns_b: summit_columns(),
            header: false,
        }
    }

    /// Closest target for each sorted query; ties go to the left target.
    ///
    /// Both slices must be sorted by start. A single forward pass: the
    /// target index only moves right as the queries do.
    pub fn closest_partition(queries: &[IntervalRecord], targets: &[IntervalRecord]) -> Vec<Option<Closest>> {
        let mut next = 0;
        queries
            .iter()
            .map(|q| {
                // first target strictly right of the query
                while next < targets.len() && targets[next].start <= q.start {
                    next += 1;
                }
                let right = targets.get(next).map(|t| Closest {
                    distance: t.start - q.start,
                    position: t.start,
                });
                let left = next.checked_sub(1).map(|i| Closest {
                    distance: q.start - targets[i].start,
                    position: targets[i].start,
                });
                match (left, right) {
                    (Some(l), Some(r)) if r.distance < l.distance => Some(r),
                    (Some(l), _) => Some(l),
                    (None, r) => r,
                }
            })
            .collect()
    }

    /// Closest B summit for every A summit, in partition then start order.
    /// `None` when B has no summit on that chromosome.
    pub fn closest<'a>(
        &self,
        a: &'a PartitionSet,
        b: &PartitionSet,
    ) -> Vec<(&'a IntervalRecord, Option<Closest>)> {
        let mut rows = Vec::with_capacity(a.interval_count());
        for partition in a.iter() {
            let targets = b.get(partition.name()).map(|p| p.intervals.as_slice()).unwrap_or_default();
            let found = Self::closest_partition(&partition.intervals, targets);
            rows.extend(partition.intervals.iter().zip(found));
        }
        rows
    }

    /// Distances between consecutive summits of each chromosome.
    pub fn inter_summit_distances(set: &PartitionSet) -> Vec<(&str, u64)> {
        set.iter()
            .flat_map(|p| {
                p.intervals
                    .windows(2)
                    .map(move |w| (p.name(), w[1].start - w[0].start))
            })
            .collect()
    }

    pub fn write_closest<W: Write>(
        &self,
        header: Option<&str>,
        rows: &[(&IntervalRecord, Option<Closest>)],
        out: &mut TableWriter<W>,
    ) -> Result<()> {
        if let Some(header) = header {
            out.write_with_field(header, "dist\tsummit2")?;
        }
        for (record, closest) in rows {
            out.write_str(&record.source_text)?;
            match closest {
                Some(c) => {
                    out.write_tab()?;
                    out.write_int(c.distance)?;
                    out.write_tab()?;
                    out.write_int(c.position)?;
                }
                None => out.write_str("\tNA\tNA")?,
            }
            out.write_newline()?;
        }
        out.flush()
    }

    pub fn write_distances<W: Write>(
        &self,
        distances: &[(&str, u64)],
        out: &mut TableWriter<W>,
    ) -> Result<()> {
        out.write_line("chromosome\tInter_Summit_Distance")?;
        for (chrom, d) in distances {
            out.write_str(chrom)?;
            out.write_tab()?;
            out.write_int(*d)?;
            out.write_newline()?;
        }
        out.flush()
    }

    /// `<A dir>/<A>_closest_<B><A ext>`
    pub fn closest_path(a: &Path, b: &Path) -> PathBuf {
        parent_dir(a).join(format!(
            "{}_closest_{}{}",
            file_stem(a),
            file_stem(b),
            file_extension(a)
        ))
    }

    /// `<A dir>/<A>_ISD<A ext>`
    pub fn distances_path(a: &Path) -> PathBuf {
        parent_dir(a).join(format!("{}_ISD{}", file_stem(a), file_extension(a)))
    }

    pub fn run_closest(&self, a: &Path, b: &Path) -> Result<PathBuf> {
        let input_a = load_table(a, &TabularReader::new(self.columns_a).with_header(self.header))?;
        let input_b = load_table(b, &TabularReader::new(self.columns_b).with_header(self.header))?;

        let rows = self.closest(&input_a.records, &input_b.records);
        let path = Self::closest_path(a, b);
        self.write_closest(input_a.header.as_deref(), &rows, &mut TableWriter::create(&path)?)?;

        info!("wrote closest summits of {} records to {}", rows.len(), path.display());
        Ok(path)
    }

    pub fn run_distances(&self, a: &Path) -> Result<PathBuf> {
        let input = load_table(a, &TabularReader::new(self.columns_a).with_header(self.header))?;
        let distances = Self::inter_summit_distances(&input.records);
        let path = Self::distances_path(a);
        self.write_distances(&distances, &mut TableWriter::create(&path)?)?;

        info!("wrote {} inter-summit distances to {}", distances.len(), path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(chrom: &str, positions: &[u64]) -> Vec<IntervalRecord> {
        positions
            .iter()
            .map(|&p| IntervalRecord::new(chrom, p, p).with_source(format!("{}\t{}", chrom, p)))
            .collect()
    }

    fn closest(distance: u64, position: u64) -> Option<Closest> {
        Some(Closest { distance, position })
    }

    #[test]
    fn test_closest_edges_and_ties() {
        let a = points("chr1", &[5, 100, 150, 160, 400]);
        let b = points("chr1", &[100, 200, 300]);
        let out = DistCommand::closest_partition(&a, &b);

        assert_eq!(out[0], closest(95, 100)); // left of every target
        assert_eq!(out[1], closest(0, 100)); // exact hit
        assert_eq!(out[2], closest(50, 100)); // tie goes left
        assert_eq!(out[3], closest(40, 200));
        assert_eq!(out[4], closest(100, 300)); // right of every target
    }

    #[test]
    fn test_closest_brute_force() {
        let a = points("chr1", &[0, 3, 17, 18, 40, 41, 99]);
        let b = points("chr1", &[2, 10, 10, 25, 60]);
        let out = DistCommand::closest_partition(&a, &b);
        for (q, got) in a.iter().zip(out) {
            let best = b.iter().map(|t| t.start.abs_diff(q.start)).min().unwrap();
            assert_eq!(got.unwrap().distance, best);
        }
    }

    #[test]
    fn test_absent_chromosome_and_output() {
        let mut a = PartitionSet::new();
        for r in points("chr1", &[10]).into_iter().chain(points("chr2", &[20])) {
            a.add_interval(r).unwrap();
        }
        let mut b = PartitionSet::new();
        for r in points("chr1", &[15]) {
            b.add_interval(r).unwrap();
        }
        a.sort();
        b.sort();

        let cmd = DistCommand::new();
        let rows = cmd.closest(&a, &b);
        let mut buf = Vec::new();
        cmd.write_closest(Some("chr\tsmt"), &rows, &mut TableWriter::new(&mut buf))
            .unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "chr\tsmt\tdist\tsummit2\nchr1\t10\t5\t15\nchr2\t20\tNA\tNA\n"
        );
    }

    #[test]
    fn test_inter_summit_distances() {
        let mut set = PartitionSet::new();
        for r in points("chr1", &[10, 30, 35]).into_iter().chain(points("chr2", &[7])) {
            set.add_interval(r).unwrap();
        }
        set.sort();
        let d = DistCommand::inter_summit_distances(&set);
        assert_eq!(d, vec![("chr1", 20), ("chr1", 5)]);

        let mut buf = Vec::new();
        DistCommand::new()
            .write_distances(&d, &mut TableWriter::new(&mut buf))
            .unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "chromosome\tInter_Summit_Distance\nchr1\t20\nchr1\t5\n"
        );
    }

    #[test]
    fn test_paths() {
        assert_eq!(
            DistCommand::closest_path(Path::new("/a/s1.txt"), Path::new("/b/s2.txt")),
            PathBuf::from("/a/s1_closest_s2.txt")
        );
        assert_eq!(DistCommand::distances_path(Path::new("s1.txt")), PathBuf::from("./s1_ISD.txt"));
    }
}
