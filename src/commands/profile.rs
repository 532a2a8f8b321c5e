//! Profile command implementation.
//!
//! Averages a signal track in fixed-step windows around every summit and
//! reports the mean profile with 95 % confidence bounds. Optional extras:
//! strand-specific sense/antisense profiles, a ratio against a denominator
//! track, a per-summit matrix and random background simulations.

use crate::aggregate::{Ratio, SweepAggregator};
use crate::error::{GaError, Result, ScanError};
use crate::genome::GenomeTable;
use crate::input::{load_signal, load_table, ColumnSpec, SignalFormat, TabularReader};
use crate::output::{file_stem, parent_dir, TableWriter};
use crate::partition::PartitionSet;
use crate::stats::{fieller_interval, mean, t_interval, Interval};
use crate::windows::WindowWalk;
use log::{debug, info, warn};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::io::Write;
use std::path::{Path, PathBuf};

const PROFILE_HEADER: &str =
    "relative_pos\tsmt_mean\tCI95.00percent_U\tCI95.00percent_L\tsmtNb\tCentered\tSignal";

/// Slot values of every summit: one row per summit, one column per window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileMatrix {
    pub rows: Vec<Vec<f64>>,
}

impl ProfileMatrix {
    /// Values of one slot across all summits.
    pub fn column(&self, slot: usize) -> Vec<f64> {
        self.rows.iter().map(|row| row[slot]).collect()
    }

    /// Mean of every slot.
    pub fn slot_means(&self, slots: usize) -> Vec<f64> {
        (0..slots).map(|i| mean(&self.column(i))).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One line of a profile table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileRow {
    pub relative: i64,
    pub interval: Interval,
    pub count: usize,
}

/// Profile command configuration.
#[derive(Debug, Clone)]
pub struct ProfileCommand {
    pub walk: WindowWalk,
    pub columns: ColumnSpec,
    pub header: bool,
    /// Number of random background simulations; 0 disables them.
    pub simulations: usize,
    /// Seed for the background simulations; random when unset.
    pub seed: Option<u64>,
    /// Also write the per-summit matrix.
    pub matrix: bool,
}

impl Default for ProfileCommand {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks for one profile run, already loaded and sorted.
#[derive(Debug, Default)]
pub struct ProfileTracks {
    pub signal: PartitionSet,
    /// Minus-strand track; `signal` is then the plus-strand track.
    pub minus: Option<PartitionSet>,
    pub denominator: Option<PartitionSet>,
}

impl ProfileCommand {
    pub fn new() -> Self {
        Self {
            walk: WindowWalk {
                half_window: 1000,
                step: 10,
                width: 25,
            },
            columns: ColumnSpec::default(),
            header: false,
            simulations: 0,
            seed: None,
            matrix: false,
        }
    }

    /// `<signal dir>/<signal>_around_<summits>_halfwid<hw>winsize<win>step<step><suffix>.txt`
    pub fn output_path(&self, signal: &Path, summits: &Path, suffix: &str) -> PathBuf {
        parent_dir(signal).join(format!(
            "{}_around_{}_halfwid{}winsize{}step{}{}.txt",
            file_stem(signal),
            file_stem(summits),
            self.walk.half_window,
            self.walk.width,
            self.walk.step,
            suffix
        ))
    }

    /// Per-summit slot values over one track. Summits on a chromosome the
    /// track lacks get zeros.
    pub fn matrix(&self, summits: &PartitionSet, track: &PartitionSet) -> Result<ProfileMatrix> {
        let slots = self.walk.slots();
        let mut matrix = ProfileMatrix {
            rows: Vec::with_capacity(summits.interval_count()),
        };

        for partition in summits.iter() {
            let chrom = partition.name();
            let signals = match track.signals(chrom) {
                Ok(signals) => signals,
                Err(ScanError::UnknownChromosome(_)) => {
                    debug!("{}: not in signal track, profiles are 0", chrom);
                    matrix
                        .rows
                        .extend(partition.intervals.iter().map(|_| vec![0.0; slots]));
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let mut aggregator = SweepAggregator::new(chrom, signals);
            for summit in &partition.intervals {
                matrix.rows.push(self.walk.profile(&mut aggregator, summit)?);
            }
            let stats = aggregator.stats();
            debug!(
                "{}: {} summits, {} seeks, {} blocks examined, {} rescans",
                chrom,
                partition.intervals.len(),
                stats.seeks,
                stats.examined,
                stats.rescans
            );
        }

        Ok(matrix)
    }

    /// Sense and antisense matrices from a plus and a minus track.
    ///
    /// Minus-strand summits read sense from the minus track and antisense
    /// from the plus track.
    pub fn stranded_matrices(
        &self,
        summits: &PartitionSet,
        plus: &PartitionSet,
        minus: &PartitionSet,
    ) -> Result<(ProfileMatrix, ProfileMatrix)> {
        let mut sense = self.matrix(summits, plus)?;
        let mut anti = self.matrix(summits, minus)?;
        let strands = summits.iter().flat_map(|p| p.intervals.iter().map(|r| r.strand));
        for ((s, a), strand) in sense.rows.iter_mut().zip(anti.rows.iter_mut()).zip(strands) {
            if strand.is_minus() {
                std::mem::swap(s, a);
            }
        }
        Ok((sense, anti))
    }

    /// Mean and confidence bounds per slot: a t interval, or a Fieller
    /// interval for the ratio when a denominator matrix is given.
    pub fn summarize(
        &self,
        numerator: &ProfileMatrix,
        denominator: Option<&ProfileMatrix>,
    ) -> Result<Vec<ProfileRow>> {
        self.walk
            .relative_positions()
            .enumerate()
            .map(|(i, relative)| -> Result<ProfileRow> {
                let y = numerator.column(i);
                let interval = match denominator {
                    Some(den) => fieller_interval(&y, &den.column(i))?,
                    None => t_interval(&y),
                };
                Ok(ProfileRow {
                    relative,
                    interval,
                    count: numerator.len(),
                })
            })
            .collect()
    }

    fn rng(&self) -> SmallRng {
        match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        }
    }

    /// Background profiles around random positions, averaged over all
    /// simulations.
    ///
    /// Each simulation draws as many positions per chromosome as there are
    /// summits, `half_window` clear of the chromosome ends. The first value
    /// is the sense (or only) profile, the second the antisense profile
    /// when a minus track is loaded. With a denominator the sense profile
    /// is the ratio of averaged means, `None` where that is undefined.
    pub fn simulate<R: Rng>(
        &self,
        summits: &PartitionSet,
        genome: &GenomeTable,
        tracks: &ProfileTracks,
        rng: &mut R,
    ) -> Result<(Vec<Option<f64>>, Option<Vec<f64>>)> {
        let slots = self.walk.slots();
        let mut sense = vec![0.0; slots];
        let mut sense_d = vec![0.0; slots];
        let mut anti = vec![0.0; slots];

        for round in 0..self.simulations {
            let sites = genome.random_sites(summits, self.walk.half_window, rng)?;
            add_into(&mut sense, &self.matrix(&sites, &tracks.signal)?.slot_means(slots));
            if let Some(den) = &tracks.denominator {
                add_into(&mut sense_d, &self.matrix(&sites, den)?.slot_means(slots));
            }
            if let Some(minus) = &tracks.minus {
                add_into(&mut anti, &self.matrix(&sites, minus)?.slot_means(slots));
            }
            debug!("simulation {} of {} done", round + 1, self.simulations);
        }

        let n = self.simulations.max(1) as f64;
        let sense: Vec<Option<f64>> = match tracks.denominator {
            Some(_) => sense
                .iter()
                .zip(&sense_d)
                .map(|(y, x)| Ratio::new(y / n, x / n).value())
                .collect(),
            None => sense.iter().map(|y| Some(y / n)).collect(),
        };
        let anti: Option<Vec<f64>> = tracks
            .minus
            .as_ref()
            .map(|_| anti.iter().map(|y| y / n).collect());
        Ok((sense, anti))
    }

    pub fn write_profile<W: Write>(
        &self,
        rows: &[ProfileRow],
        summit_name: &str,
        signal_name: &str,
        out: &mut TableWriter<W>,
    ) -> Result<()> {
        out.write_line(PROFILE_HEADER)?;
        for row in rows {
            out.write_int(row.relative)?;
            for v in [row.interval.mean, row.interval.upper, row.interval.lower] {
                out.write_tab()?;
                out.write_float(v)?;
            }
            out.write_tab()?;
            out.write_int(row.count)?;
            out.write_tab()?;
            out.write_str(summit_name)?;
            out.write_tab()?;
            out.write_str(signal_name)?;
            out.write_newline()?;
        }
        out.flush()
    }

    /// Background table: the value repeats in the mean and both bound
    /// columns and the summit column reads `random`.
    pub fn write_random<W: Write>(
        &self,
        values: &[Option<f64>],
        count: usize,
        signal_name: &str,
        out: &mut TableWriter<W>,
    ) -> Result<()> {
        out.write_line(PROFILE_HEADER)?;
        for (relative, value) in self.walk.relative_positions().zip(values) {
            out.write_int(relative)?;
            for _ in 0..3 {
                out.write_tab()?;
                out.write_value(*value)?;
            }
            out.write_tab()?;
            out.write_int(count)?;
            out.write_str("\trandom\t")?;
            out.write_str(signal_name)?;
            out.write_newline()?;
        }
        out.flush()
    }

    /// Per-summit values under a relative-position header; with a
    /// denominator each cell is a ratio, `NA` where the denominator is zero.
    pub fn write_matrix<W: Write>(
        &self,
        numerator: &ProfileMatrix,
        denominator: Option<&ProfileMatrix>,
        out: &mut TableWriter<W>,
    ) -> Result<()> {
        let header: Vec<String> = self.walk.relative_positions().map(|r| r.to_string()).collect();
        out.write_line(&header.join("\t"))?;

        let mut undefined = 0usize;
        for (c, row) in numerator.rows.iter().enumerate() {
            for (i, y) in row.iter().enumerate() {
                if i > 0 {
                    out.write_tab()?;
                }
                match denominator {
                    Some(den) => {
                        let ratio = Ratio::new(*y, den.rows[c][i]);
                        if ratio == Ratio::Undefined {
                            undefined += 1;
                        }
                        out.write_ratio(ratio)?;
                    }
                    None => out.write_float(*y)?,
                }
            }
            out.write_newline()?;
        }
        if undefined > 0 {
            warn!("denominator was zero in {} windows. NA is returned.", undefined);
        }
        out.flush()
    }

    /// Load every input, compute the requested tables and write them.
    /// Returns the paths written.
    pub fn run(
        &self,
        summits: &Path,
        signal: &Path,
        format: SignalFormat,
        minus: Option<&Path>,
        denominator: Option<&Path>,
        genome: Option<&Path>,
    ) -> Result<Vec<PathBuf>> {
        if self.simulations > 0 && genome.is_none() {
            return Err(GaError::InvalidArgument(
                "random simulation needs a genome table".to_string(),
            ));
        }
        let input = load_table(summits, &TabularReader::new(self.columns).with_header(self.header))?;
        if input.records.interval_count() == 0 {
            return Err(GaError::InvalidArgument(format!(
                "no summits in {}",
                summits.display()
            )));
        }
        let tracks = ProfileTracks {
            signal: load_signal(signal, format)?,
            minus: minus.map(|m| load_signal(m, format)).transpose()?,
            denominator: denominator.map(|d| load_signal(d, format)).transpose()?,
        };

        let summit_name = file_stem(summits);
        let signal_name = file_stem(signal);
        let count = input.records.interval_count();
        let mut written = Vec::new();

        let (sense, anti) = match &tracks.minus {
            Some(minus_track) => {
                let (s, a) = self.stranded_matrices(&input.records, &tracks.signal, minus_track)?;
                (s, Some(a))
            }
            None => (self.matrix(&input.records, &tracks.signal)?, None),
        };
        let den = tracks
            .denominator
            .as_ref()
            .map(|d| self.matrix(&input.records, d))
            .transpose()?;

        let stranded = anti.is_some();
        let sense_suffix = if stranded { "_sense" } else { "" };
        let path = self.output_path(signal, summits, sense_suffix);
        let rows = self.summarize(&sense, den.as_ref())?;
        self.write_profile(&rows, &summit_name, &signal_name, &mut TableWriter::create(&path)?)?;
        written.push(path);

        if let Some(anti) = &anti {
            let path = self.output_path(signal, summits, "_anti");
            let rows = self.summarize(anti, None)?;
            self.write_profile(&rows, &summit_name, &signal_name, &mut TableWriter::create(&path)?)?;
            written.push(path);
        }

        if self.matrix {
            let path = self.output_path(signal, summits, "_all");
            self.write_matrix(&sense, den.as_ref(), &mut TableWriter::create(&path)?)?;
            written.push(path);
        }

        if let Some(genome) = genome.filter(|_| self.simulations > 0) {
            let table = GenomeTable::from_path(genome)?;
            let mut rng = self.rng();
            let (background, background_anti) =
                self.simulate(&input.records, &table, &tracks, &mut rng)?;

            let path = self.output_path(
                signal,
                summits,
                &format!("{}_random{}", sense_suffix, self.simulations),
            );
            self.write_random(&background, count, &signal_name, &mut TableWriter::create(&path)?)?;
            written.push(path);

            if let Some(values) = background_anti {
                let values: Vec<Option<f64>> = values.into_iter().map(Some).collect();
                let path =
                    self.output_path(signal, summits, &format!("_anti_random{}", self.simulations));
                self.write_random(&values, count, &signal_name, &mut TableWriter::create(&path)?)?;
                written.push(path);
            }
        }

        for path in &written {
            info!("wrote {}", path.display());
        }
        Ok(written)
    }
}

fn add_into(acc: &mut [f64], values: &[f64]) {
    for (a, v) in acc.iter_mut().zip(values) {
        *a += v;
    }
}
