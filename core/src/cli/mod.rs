pub mod commands;

use crate::config::DEFAULT_MAP_FILE;
use crate::error::AppError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "diary")]
#[command(author, version, about = "Classify project files by role", long_about = None)]
pub struct Cli {
    /// Project root (defaults to current directory)
    #[arg(short, long, global = true)]
    pub root: Option<String>,

    /// Project map file (defaults to <root>/project_map.json)
    #[arg(short, long, global = true)]
    pub map: Option<String>,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan the project and classify new or modified files
    Classify {
        /// Config file (defaults to <root>/diary.json when present)
        #[arg(short, long)]
        config: Option<String>,

        /// Model for batches that fit its context (e.g., haiku, sonnet)
        #[arg(long)]
        model: Option<String>,

        /// Model for batches that need a long context
        #[arg(long)]
        long_model: Option<String>,

        /// Maximum concurrent batches
        #[arg(long)]
        concurrency: Option<usize>,

        /// Maximum files per batch
        #[arg(long)]
        batch_size: Option<usize>,

        /// Characters of file content to send with each path (0 = paths only)
        #[arg(long)]
        excerpt_chars: Option<usize>,

        /// Command to run instead of the claude CLI (prompt is sent on stdin)
        #[arg(long)]
        command: Option<String>,

        /// Use built-in path rules instead of a model
        #[arg(long)]
        offline: bool,

        /// Also classify hidden files and directories
        #[arg(long)]
        hidden: bool,
    },

    /// Show the persisted project map
    Show {
        /// Only show files with this role
        #[arg(long)]
        role: Option<String>,
    },

    /// List the roles files can be assigned
    Roles,
}

impl Cli {
    /// Get the project root, using current directory as default
    pub fn get_root(&self) -> Result<PathBuf, AppError> {
        match &self.root {
            Some(root) => Ok(PathBuf::from(root)),
            None => Ok(std::env::current_dir()?),
        }
    }

    /// Get the project map path, relative to the root unless absolute
    pub fn get_map_path(&self, root: &std::path::Path) -> PathBuf {
        match &self.map {
            Some(map) => {
                let map = PathBuf::from(map);
                if map.is_absolute() {
                    map
                } else {
                    root.join(map)
                }
            }
            None => root.join(DEFAULT_MAP_FILE),
        }
    }
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<(), AppError> {
    let root = cli.get_root()?;
    let map_path = cli.get_map_path(&root);

    match cli.command {
        Commands::Classify {
            config,
            model,
            long_model,
            concurrency,
            batch_size,
            excerpt_chars,
            command,
            offline,
            hidden,
        } => commands::classify::run(
            &root,
            &map_path,
            commands::classify::ClassifyArgs {
                config,
                model,
                long_model,
                concurrency,
                batch_size,
                excerpt_chars,
                command,
                offline,
                hidden,
            },
            cli.format,
        ),
        Commands::Show { role } => commands::show::run(&map_path, role.as_deref(), cli.format),
        Commands::Roles => commands::roles::run(cli.format),
    }
}
