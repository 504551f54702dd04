//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Lingon content engine CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name (default: lingon.toml)
    #[arg(short = 'C', long, default_value = "lingon.toml")]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve the site with in-browser editing and background translation
    Serve {
        /// Network interface to bind
        #[arg(short, long)]
        interface: Option<String>,

        /// HTTP port number
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Seed and fill translation sidecars for every page, then exit
    Translate {
        /// Only process this URL pathname instead of the whole site
        pathname: Option<String>,
    },
}
