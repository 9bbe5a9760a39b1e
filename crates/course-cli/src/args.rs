use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "course")]
#[command(about = "Manage your fork of the coursework exercise repository")]
#[command(version)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch your student repository and wire it up
    Init {
        /// URL of your personal fork
        url: String,

        /// Target directory (default: course)
        #[arg(short, long)]
        directory: Option<PathBuf>,

        /// URL of the shared course repository (added as 'upstream')
        #[arg(short, long)]
        upstream: Option<String>,
    },

    /// List chapters
    Chapters {
        /// Show only modified chapters
        #[arg(short, long)]
        modified: bool,
    },

    /// Run tests
    Test {
        /// Run tests for all chapters instead of the current one
        #[arg(short, long)]
        all: bool,
    },

    /// Commit and push solutions
    Upload {
        /// Upload all modified chapters instead of the current one
        #[arg(short, long)]
        all: bool,
    },

    /// Pull from upstream and push to origin
    Sync,

    /// Show raw git status
    Status,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
