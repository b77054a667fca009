//! FastHicDump CLI entry point
//!
//! Extracts slices of Hi-C contact matrices as sparse upper-triangular
//! text.

use clap::{Parser, Subcommand, ValueEnum};
use fast_hicdump::core::{HicFile, Normalization, Unit};
use fast_hicdump::formats;
use std::path::PathBuf;
use std::time::Instant;

/// Normalization scheme (CLI enum)
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum NormArg {
    /// Raw counts
    #[default]
    #[value(name = "NONE")]
    None,
    /// Vanilla coverage
    #[value(name = "VC")]
    Vc,
    /// Square root of vanilla coverage
    #[value(name = "VC_SQRT")]
    VcSqrt,
    /// Knight-Ruiz (balanced)
    #[value(name = "KR")]
    Kr,
}

impl From<NormArg> for Normalization {
    fn from(arg: NormArg) -> Self {
        match arg {
            NormArg::None => Normalization::None,
            NormArg::Vc => Normalization::Vc,
            NormArg::VcSqrt => Normalization::VcSqrt,
            NormArg::Kr => Normalization::Kr,
        }
    }
}

/// Resolution unit (CLI enum)
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum UnitArg {
    /// Base pairs
    #[default]
    #[value(name = "BP")]
    Bp,
    /// Restriction enzyme fragments
    #[value(name = "FRAG")]
    Frag,
}

impl From<UnitArg> for Unit {
    fn from(arg: UnitArg) -> Self {
        match arg {
            UnitArg::Bp => Unit::Bp,
            UnitArg::Frag => Unit::Frag,
        }
    }
}

#[derive(Parser)]
#[command(name = "fast-hicdump")]
#[command(about = "High-performance Hi-C contact matrix extraction tool")]
#[command(version)]
#[command(author = "FastHicDump Contributors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dump a matrix slice as sparse text (x, y, count)
    Dump {
        /// Normalization: NONE, VC, VC_SQRT or KR
        norm: NormArg,
        /// Input .hic file
        hic: PathBuf,
        /// First locus: chr[:start:end]
        locus1: String,
        /// Second locus: chr[:start:end]
        locus2: String,
        /// Resolution unit: BP or FRAG
        unit: UnitArg,
        /// Bin size (e.g. 2500000, 1000000, ..., 5000 for BP)
        binsize: u32,
        /// Output file (optional, stdout if not specified)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
        /// Number of threads for block decoding
        #[arg(short = 't', long, default_value = "1")]
        threads: usize,
    },
    /// List the chromosomes declared in a file
    Chroms {
        /// Input .hic file
        hic: PathBuf,
    },
    /// Show file version and genome id
    Header {
        /// Input .hic file
        hic: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let start = Instant::now();

    match cli.command {
        Commands::Dump {
            norm,
            hic,
            locus1,
            locus2,
            unit,
            binsize,
            output,
            threads,
        } => {
            anyhow::ensure!(binsize > 0, "bin size must be positive");

            let mut file = HicFile::open(&hic)?;
            let contacts = file.query_with_threads(
                norm.into(),
                &locus1,
                &locus2,
                unit.into(),
                binsize,
                threads,
            )?;
            let stats = formats::write_contacts(&contacts, output.as_deref())?;

            eprintln!("\n=== Dump Statistics ===");
            eprintln!("Records:         {}", stats.records);
            if stats.nan_records > 0 {
                eprintln!("NaN records:     {}", stats.nan_records);
            }
            eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());
        }

        Commands::Chroms { hic } => {
            let file = HicFile::open(&hic)?;
            for chrom in file.chromosomes() {
                println!("{}\t{}", chrom.name, chrom.length);
            }
        }

        Commands::Header { hic } => {
            let file = HicFile::open(&hic)?;
            println!("version\t{}", file.header().version);
            println!("genome\t{}", file.header().genome_id);
            println!("chromosomes\t{}", file.chromosomes().len());
        }
    }

    Ok(())
}
