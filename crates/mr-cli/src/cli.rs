//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mr_core::{Command, Invocation, ListFilter, RegistryFiles};
use mr_fs::RegistryFile;

/// Mr. Repo - keep track of the repositories checked out below a directory
#[derive(Parser, Debug)]
#[command(name = "mr-repo")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Registry root directory
    #[arg(short, long, global = true, env = "MR_REPO_DIR", default_value = ".")]
    pub dir: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Name of the declarations document inside the root
    #[arg(
        long,
        global = true,
        env = "MR_REPO_DECLARATIONS",
        default_value = RegistryFile::Declarations.as_str()
    )]
    pub declarations_file: String,

    /// Name of the presence list inside the root
    #[arg(
        long,
        global = true,
        env = "MR_REPO_PRESENCE",
        default_value = RegistryFile::Presence.as_str()
    )]
    pub presence_file: String,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start tracking repositories in the root directory
    ///
    /// Working copies already below the root are registered unless
    /// `--clean` is given.
    Init {
        /// Start with an empty registry
        #[arg(short, long)]
        clean: bool,
    },

    /// List tracked repositories that are checked out
    List {
        /// List every tracked repository
        #[arg(short, long, conflicts_with = "unavailable")]
        all: bool,

        /// List tracked repositories that are not checked out
        #[arg(short, long)]
        unavailable: bool,
    },

    /// Track an existing working copy
    Add {
        /// Path of the working copy
        path: PathBuf,
    },

    /// Stop tracking a repository (its files are kept)
    Rm {
        /// Repository name
        name: String,
    },

    /// Clone a tracked repository from its remote
    Get {
        /// Repository name
        name: String,
    },

    /// Delete the local copy of a tracked repository
    Unget {
        /// Repository name
        name: String,

        /// Delete even if the working copy has uncommitted changes
        #[arg(short, long)]
        force: bool,
    },

    /// Track every working copy found below the root
    Update,

    /// Validate the registry documents
    Check,
}

impl Cli {
    /// The core request described by these arguments.
    pub fn into_invocation(self) -> Invocation {
        Invocation {
            root: self.dir,
            files: RegistryFiles {
                declarations: self.declarations_file,
                presence: self.presence_file,
            },
            command: self.command.into(),
        }
    }
}

impl From<Commands> for Command {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Init { clean } => Command::Init { clean },
            Commands::List { all, unavailable } => Command::List {
                filter: match (all, unavailable) {
                    (true, _) => ListFilter::All,
                    (_, true) => ListFilter::Unavailable,
                    _ => ListFilter::Present,
                },
            },
            Commands::Add { path } => Command::Add { path },
            Commands::Rm { name } => Command::Rm { name },
            Commands::Get { name } => Command::Get { name },
            Commands::Unget { name, force } => Command::Unget { name, force },
            Commands::Update => Command::Update,
            Commands::Check => Command::Check,
        }
    }
}
