//! OxiArc 842 CLI
//!
//! A Pure Rust command-line tool for 842-compressed frame files.

mod commands;
mod utils;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use oxiarc_842::Alignment;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "oxiarc842")]
#[command(author, version, about = "842 compression - Pure Rust, kernel-compatible")]
#[command(long_about = "
oxiarc842 compresses files into 842 frames: fixed-size blocks encoded with
the same bitstream the Linux kernel sw842 and nx842 engines use.

Examples:
  oxiarc842 compress data.bin
  oxiarc842 compress data.bin -o data.842 --block-size 65536 --parallel
  oxiarc842 compress page.img --no-short-data --alignment 32
  oxiarc842 decompress data.bin.842
  oxiarc842 test data.bin.842
  oxiarc842 info data.bin.842 --json
")]
struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file into an 842 frame
    #[command(alias = "c")]
    Compress {
        /// File to compress
        input: PathBuf,

        /// Output file (default: <input>.842)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Uncompressed bytes per block (power of two, 512 to 16777216)
        #[arg(short, long, default_value_t = oxiarc_842::frame::DEFAULT_BLOCK_SIZE)]
        block_size: usize,

        /// Padding boundary after each block's END template
        #[arg(short, long, value_enum, default_value = "8")]
        alignment: AlignmentArg,

        /// Omit the per-block CRC trailer
        #[arg(long)]
        no_crc: bool,

        /// Disable the SHORT_DATA template (nx842-compatible blocks)
        #[arg(long)]
        no_short_data: bool,

        /// Compress blocks on all cores
        #[arg(short, long)]
        parallel: bool,

        /// Show progress bar
        #[arg(short = 'P', long)]
        progress: bool,

        /// Overwrite the output without asking
        #[arg(short, long)]
        force: bool,
    },

    /// Decompress an 842 frame
    #[command(alias = "d")]
    Decompress {
        /// Frame file to decompress
        input: PathBuf,

        /// Output file (default: input without .842, or <input>.out)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Decode blocks on all cores
        #[arg(short, long)]
        parallel: bool,

        /// Overwrite the output without asking
        #[arg(short, long)]
        force: bool,
    },

    /// Verify every block of a frame, checksums included
    #[command(alias = "t")]
    Test {
        /// Frame file to test
        input: PathBuf,
    },

    /// Show frame header and per-block statistics
    #[command(alias = "i")]
    Info {
        /// Frame file to inspect
        input: PathBuf,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Block alignment in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AlignmentArg {
    /// 8 bytes (default)
    #[value(name = "8")]
    Bytes8,
    /// 16 bytes
    #[value(name = "16")]
    Bytes16,
    /// 32 bytes
    #[value(name = "32")]
    Bytes32,
}

impl From<AlignmentArg> for Alignment {
    fn from(arg: AlignmentArg) -> Self {
        match arg {
            AlignmentArg::Bytes8 => Alignment::Bytes8,
            AlignmentArg::Bytes16 => Alignment::Bytes16,
            AlignmentArg::Bytes32 => Alignment::Bytes32,
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Compress {
            input,
            output,
            block_size,
            alignment,
            no_crc,
            no_short_data,
            parallel,
            progress,
            force,
        } => {
            let options = commands::CompressOptions {
                block_size,
                alignment: alignment.into(),
                crc: !no_crc,
                short_data: !no_short_data,
                parallel,
                progress,
                force,
            };
            commands::cmd_compress(&input, output.as_deref(), &options)
        }
        Commands::Decompress {
            input,
            output,
            parallel,
            force,
        } => commands::cmd_decompress(&input, output.as_deref(), parallel, force),
        Commands::Test { input } => commands::cmd_test(&input),
        Commands::Info { input, json } => commands::cmd_info(&input, json),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "oxiarc842", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
