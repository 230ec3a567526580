//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint};

/// Transfer operators of piecewise-expanding interval maps: Hofbauer tower plus Chebyshev blocks
#[derive(Parser, Debug)]
#[command(name = "hofbauer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug level: -d info, -dd debug, -ddd trace
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Config file (default: ./hofbauer.toml when present)
    #[arg(short, long, global = true, env = "HOFBAUER_CONFIG", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Which map to analyse.
#[derive(Args, Debug, Clone)]
pub struct MapArgs {
    /// Map name: tent or skew-tent
    #[arg(short, long, default_value = "tent")]
    pub map: String,

    /// Slope of the tent map (1 < a <= 2)
    #[arg(short = 'a', long, default_value_t = 2.0)]
    pub slope: f64,

    /// Peak location of the skew tent
    #[arg(long, default_value_t = 0.5)]
    pub peak: f64,

    /// Peak height of the skew tent
    #[arg(long, default_value_t = 1.0)]
    pub height: f64,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the tower domains and branch incidences
    Tower {
        #[command(flatten)]
        map: MapArgs,
        /// Tower depth (default: tower.depth)
        #[arg(long)]
        depth: Option<usize>,
    },

    /// Assemble the Chebyshev super-adjacency matrix
    Assemble {
        #[command(flatten)]
        map: MapArgs,
        /// Chebyshev order per block (default: approximation.order)
        #[arg(short = 'k', long)]
        order: Option<usize>,
        /// Tower depth (default: tower.depth)
        #[arg(long)]
        depth: Option<usize>,
        /// Refinement passes per block (default: approximation.refinement_passes)
        #[arg(long)]
        passes: Option<usize>,
        /// Write the matrix as whitespace-separated text
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Ulam bin-counting matrix of the map
    Ulam {
        #[command(flatten)]
        map: MapArgs,
        /// Number of bins (default: ulam.bins)
        #[arg(long)]
        bins: Option<usize>,
        /// Sample points per bin (default: ulam.samples)
        #[arg(long)]
        samples: Option<usize>,
        /// Uniform random samples instead of a grid
        #[arg(long)]
        random: bool,
        /// Seed for --random (default: ulam.seed)
        #[arg(long)]
        seed: Option<u64>,
        /// Write the matrix as whitespace-separated text
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Build both discretisations and print summary statistics
    Compare {
        #[command(flatten)]
        map: MapArgs,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,
    },

    /// Show config paths
    Path,
}
