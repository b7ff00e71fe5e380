pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lectern")]
#[command(about = "A chapter reader and translation-study tool", long_about = None)]
pub struct Cli {
    /// Use an in-memory database (nothing is persisted)
    #[arg(long, global = true)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a URL and display the chapter, fetching it if needed
    Open {
        /// Chapter URL
        url: String,
    },
    /// Fetch a URL into the local library without displaying it
    Fetch {
        /// Chapter URL
        url: String,
    },
    /// Display a chapter from the library by stable ID
    Show {
        /// Stable chapter ID (or unique prefix)
        stable_id: String,
    },
    /// List chapters in the library
    List,
    /// List supported provider sites
    Sites,
}
