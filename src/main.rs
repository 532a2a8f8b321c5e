//! ga: genome analysis tools
//!
//! Usage: ga <COMMAND> [OPTIONS]

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;

use gatools::commands::{DistCommand, OverlapCommand, ProfileCommand, RegionCommand, RpkmCommand};
use gatools::error::Result;
use gatools::input::{ColumnSpec, ReferenceColumns, SignalFormat};
use gatools::windows::{RegionMode, WindowWalk};

#[derive(Parser)]
#[command(name = "ga")]
#[command(version)]
#[command(about = "Genome analysis tools: RPKM, peak overlap, signal around summits and regions", long_about = None)]
struct Cli {
    /// Verbosity level (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Fail on a query window that goes backwards instead of rescanning
    #[arg(long, global = true)]
    strict_order: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Signal track options shared by the signal tools.
#[derive(Args)]
struct SignalArgs {
    /// Signal track (file, or directory / comma list for sepwig)
    #[arg(long)]
    sig: PathBuf,

    /// Signal format: bedgraph, wig (onewiggz) or sepwig (sepwiggz)
    #[arg(long, default_value = "bedgraph")]
    sigfmt: SignalFormat,

    /// Denominator track in the same format
    #[arg(long = "sig-d")]
    sig_d: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// RPKM of every reference transcript from an expression track
    Rpkm {
        /// Expression track
        #[arg(long)]
        exp: PathBuf,

        /// Expression track format
        #[arg(long, default_value = "bedgraph")]
        sigfmt: SignalFormat,

        /// Reference transcripts (genePred layout)
        #[arg(long = "ref")]
        reference: PathBuf,

        /// Read length
        #[arg(long, default_value = "101")]
        readlen: u64,

        /// Keep the first line of the reference as a header
        #[arg(long)]
        header: bool,

        #[arg(long, default_value = "2")]
        col_chr: usize,
        #[arg(long, default_value = "4")]
        col_start: usize,
        #[arg(long, default_value = "5")]
        col_end: usize,
        #[arg(long, default_value = "3")]
        col_strand: usize,
        #[arg(long, default_value = "9")]
        col_exon_start: usize,
        #[arg(long, default_value = "10")]
        col_exon_end: usize,
    },

    /// Split peaks of file 1 into those overlapping file 2 and the rest
    Overlap {
        /// Peak file A
        #[arg(short = '1', long = "file1")]
        file1: PathBuf,

        /// Peak file B
        #[arg(short = '2', long = "file2")]
        file2: PathBuf,

        /// Compare start +/- hw of each A peak instead of its extent
        #[arg(long)]
        hw: Option<u64>,

        /// Report how many B peaks each A peak overlaps
        #[arg(short = 'c', long)]
        count: bool,

        /// Keep the first line of each file as a header
        #[arg(long)]
        header: bool,

        #[arg(long, default_value = "0")]
        col_chr1: usize,
        #[arg(long, default_value = "1")]
        col_start1: usize,
        #[arg(long, default_value = "2")]
        col_end1: usize,
        #[arg(long, default_value = "0")]
        col_chr2: usize,
        #[arg(long, default_value = "1")]
        col_start2: usize,
        #[arg(long, default_value = "2")]
        col_end2: usize,
    },

    /// Mean signal per base in one window per summit or region
    Region {
        /// Summit or region file
        #[arg(long)]
        smt: PathBuf,

        #[command(flatten)]
        signal: SignalArgs,

        /// Region mode: smt, region, up-tss, tss-dw, up-tss-dw, up-tes, tes-dw, up-tes-dw
        #[arg(long)]
        mode: RegionMode,

        /// Half window size
        #[arg(long, default_value = "1000")]
        hw: u64,

        /// Keep the first line of the summit file as a header
        #[arg(long)]
        header: bool,

        #[arg(long, default_value = "0")]
        col_chr: usize,
        #[arg(long, default_value = "1")]
        col_start: usize,
        #[arg(long, default_value = "2")]
        col_end: usize,
        /// Summit position column (overrides --col-start)
        #[arg(long)]
        col_smt: Option<usize>,
        #[arg(long)]
        col_strand: Option<usize>,
    },

    /// Average signal profile around summits
    ///
    /// Rows run from -hw up to +hw in steps of --step, and every window is
    /// exactly --win bases wide, odd sizes included.
    Profile {
        /// Summit file
        #[arg(long)]
        smt: PathBuf,

        #[command(flatten)]
        signal: SignalArgs,

        /// Minus-strand track; --sig is then the plus-strand track
        #[arg(long = "sig-minus")]
        sig_minus: Option<PathBuf>,

        /// Genome table (chrom, size) for random simulations
        #[arg(long)]
        genome: Option<PathBuf>,

        /// Number of random background simulations
        #[arg(long = "rand", default_value = "0")]
        simulations: usize,

        /// Seed for the random simulations
        #[arg(long)]
        seed: Option<u64>,

        /// Also write the per-summit matrix
        #[arg(long)]
        all: bool,

        /// Half window size
        #[arg(long, default_value = "1000")]
        hw: u64,

        /// Step between windows
        #[arg(long, default_value = "10")]
        step: u64,

        /// Window size in bases (exact, not rounded down to even)
        #[arg(long, default_value = "25")]
        win: u64,

        /// Keep the first line of the summit file as a header
        #[arg(long)]
        header: bool,

        #[arg(long, default_value = "0")]
        col_chr: usize,
        #[arg(long, default_value = "1")]
        col_start: usize,
        #[arg(long, default_value = "2")]
        col_end: usize,
        #[arg(long)]
        col_strand: Option<usize>,
    },

    /// Distances between summits
    Dist {
        #[command(subcommand)]
        mode: DistMode,
    },
}

#[derive(Subcommand)]
enum DistMode {
    /// Closest summit of file 2 for each summit of file 1
    Two {
        #[arg(short = '1', long = "file1")]
        file1: PathBuf,
        #[arg(short = '2', long = "file2")]
        file2: PathBuf,
        #[arg(long)]
        header: bool,
        #[arg(long, default_value = "0")]
        col_chr1: usize,
        #[arg(long, default_value = "3")]
        col_smt1: usize,
        #[arg(long, default_value = "0")]
        col_chr2: usize,
        #[arg(long, default_value = "3")]
        col_smt2: usize,
    },
    /// Inter-summit distances within one file
    Isd {
        #[arg(short = '1', long = "file1")]
        file1: PathBuf,
        #[arg(long)]
        header: bool,
        #[arg(long, default_value = "0")]
        col_chr1: usize,
        #[arg(long, default_value = "3")]
        col_smt1: usize,
    },
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    if cli.strict_order {
        gatools::config::set_strict_order(true);
    }

    let result = match cli.command {
        Commands::Rpkm {
            exp,
            sigfmt,
            reference,
            readlen,
            header,
            col_chr,
            col_start,
            col_end,
            col_strand,
            col_exon_start,
            col_exon_end,
        } => {
            let cmd = RpkmCommand {
                read_length: readlen,
                columns: ReferenceColumns {
                    chrom: col_chr,
                    start: col_start,
                    end: col_end,
                    strand: col_strand,
                    exon_starts: col_exon_start,
                    exon_ends: col_exon_end,
                },
                header,
            };
            report(cmd.run(&exp, sigfmt, &reference))
        }

        Commands::Overlap {
            file1,
            file2,
            hw,
            count,
            header,
            col_chr1,
            col_start1,
            col_end1,
            col_chr2,
            col_start2,
            col_end2,
        } => {
            let cmd = OverlapCommand {
                columns_a: columns(col_chr1, col_start1, col_end1, None),
                columns_b: columns(col_chr2, col_start2, col_end2, None),
                half_window: hw,
                count,
                header,
            };
            cmd.run(&file1, &file2).map(|out| {
                println!("{}", out.annotated.display());
                println!("{}", out.summary.display());
            })
        }

        Commands::Region {
            smt,
            signal,
            mode,
            hw,
            header,
            col_chr,
            col_start,
            col_end,
            col_smt,
            col_strand,
        } => {
            let cmd = RegionCommand {
                mode,
                half_window: hw,
                columns: columns(col_chr, col_smt.unwrap_or(col_start), col_end, col_strand),
                header,
            };
            report(cmd.run(&smt, &signal.sig, signal.sigfmt, signal.sig_d.as_deref()))
        }

        Commands::Profile {
            smt,
            signal,
            sig_minus,
            genome,
            simulations,
            seed,
            all,
            hw,
            step,
            win,
            header,
            col_chr,
            col_start,
            col_end,
            col_strand,
        } => run_profile(
            &smt,
            &signal,
            sig_minus.as_deref(),
            genome.as_deref(),
            ProfileOptions {
                simulations,
                seed,
                all,
                hw,
                step,
                win,
                header,
                columns: columns(col_chr, col_start, col_end, col_strand),
            },
        ),

        Commands::Dist { mode } => match mode {
            DistMode::Two {
                file1,
                file2,
                header,
                col_chr1,
                col_smt1,
                col_chr2,
                col_smt2,
            } => {
                let cmd = DistCommand {
                    columns_a: columns(col_chr1, col_smt1, col_smt1, None),
                    columns_b: columns(col_chr2, col_smt2, col_smt2, None),
                    header,
                };
                report(cmd.run_closest(&file1, &file2))
            }
            DistMode::Isd {
                file1,
                header,
                col_chr1,
                col_smt1,
            } => {
                let cmd = DistCommand {
                    columns_a: columns(col_chr1, col_smt1, col_smt1, None),
                    header,
                    ..DistCommand::new()
                };
                report(cmd.run_distances(&file1))
            }
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn columns(chrom: usize, start: usize, end: usize, strand: Option<usize>) -> ColumnSpec {
    ColumnSpec {
        chrom,
        start,
        end,
        strand,
    }
}

/// Print the output path on success.
fn report(result: Result<PathBuf>) -> Result<()> {
    result.map(|path| println!("{}", path.display()))
}

struct ProfileOptions {
    simulations: usize,
    seed: Option<u64>,
    all: bool,
    hw: u64,
    step: u64,
    win: u64,
    header: bool,
    columns: ColumnSpec,
}

fn run_profile(
    smt: &Path,
    signal: &SignalArgs,
    sig_minus: Option<&Path>,
    genome: Option<&Path>,
    opts: ProfileOptions,
) -> Result<()> {
    let cmd = ProfileCommand {
        walk: WindowWalk::new(opts.hw, opts.step, opts.win)?,
        columns: opts.columns,
        header: opts.header,
        simulations: opts.simulations,
        seed: opts.seed,
        matrix: opts.all,
    };
    let written = cmd.run(
        smt,
        &signal.sig,
        signal.sigfmt,
        sig_minus,
        signal.sig_d.as_deref(),
        genome,
    )?;
    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}
