use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "posterwall")]
#[command(author, version, about = "Poster wall indexer for a shared media folder")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the background scanner and the library API
    Start {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run a single scan cycle and print what changed
    Scan {
        /// Re-resolve every entry, not only new or changed ones
        #[arg(long)]
        force: bool,
    },

    /// Show how a path would be classified
    Classify {
        /// Path relative to the movies or TV folder, e.g. "Show/Season 1/S01E02.mkv"
        #[arg(required = true)]
        path: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List indexed entries of one kind
    List {
        /// movies, episodes or unknown
        #[arg(default_value = "movies")]
        kind: String,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
