//! # Strandweave CLI (`sw`)
//!
//! The `sw` binary loads strands into SQLite and queries the connection
//! graph and taxonomy index derived from them.
//!
//! ## Usage
//!
//! ```bash
//! sw --config ./config/sw.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `sw init` | Create the SQLite database and run schema migrations |
//! | `sw import <file>` | Upsert strands from a JSON file |
//! | `sw connections` | Discover and rank connections between strands |
//! | `sw shared <tags\|topics>` | Terms shared by two or more strands |
//! | `sw taxonomy top` | Most frequent terms at one level |
//! | `sw taxonomy lookup <term>` | Find which level a term lives at |
//! | `sw taxonomy list` | All terms at one level |
//! | `sw stats` | Database overview |
//! | `sw export` | Write strands and connections as JSON |
//! | `sw completions <shell>` | Print shell completions |

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

use strandweave::config;
use strandweave::discover::{self, ConnectionFilter, ConnectionsFormat, SharedKind};
use strandweave::export;
use strandweave::import;
use strandweave::migrate;
use strandweave::stats;
use strandweave::taxonomy_cmd;
use strandweave_core::taxonomy::TaxonomyLevel;

/// Strandweave CLI, a local-first knowledge graph for markdown digital
/// gardens.
#[derive(Parser)]
#[command(
    name = "sw",
    about = "Strandweave — connection discovery and taxonomy indexing for digital gardens",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/sw.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Idempotent; running it multiple times is safe.
    Init,

    /// Import strands from a JSON file.
    ///
    /// Accepts an array of strand records or the object written by
    /// `sw export`. Records are upserted by path.
    Import {
        /// Path to the JSON file.
        file: PathBuf,

        /// Parse and count records without writing to the database.
        #[arg(long)]
        dry_run: bool,
    },

    /// Discover connections between stored strands.
    Connections {
        /// Only show connections touching this strand path.
        #[arg(long)]
        path: Option<String>,

        /// Hide connections weaker than this (overrides config).
        #[arg(long)]
        min_strength: Option<f64>,

        /// Maximum number of connections to show (overrides config).
        #[arg(long)]
        limit: Option<usize>,

        /// Output format.
        #[arg(long, value_enum, default_value = "text")]
        format: ConnectionsFormat,
    },

    /// List terms shared by two or more strands.
    Shared {
        #[arg(value_enum)]
        kind: SharedKind,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Query the taxonomy index.
    Taxonomy {
        #[command(subcommand)]
        action: TaxonomyAction,
    },

    /// Show database statistics.
    Stats,

    /// Export strands and discovered connections as JSON.
    Export {
        /// Output file. Writes to stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print shell completions.
    Completions {
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum TaxonomyAction {
    /// Most frequent terms at one level.
    Top {
        /// `subjects`, `topics`, or `tags`.
        #[arg(long, default_value = "subjects")]
        level: TaxonomyLevel,

        /// Maximum number of terms (overrides config).
        #[arg(long)]
        limit: Option<usize>,

        #[arg(long)]
        json: bool,
    },

    /// Find the broadest level holding a term.
    Lookup {
        term: String,

        #[arg(long)]
        json: bool,
    },

    /// All terms at one level.
    List {
        #[arg(long)]
        level: TaxonomyLevel,

        #[arg(long)]
        json: bool,
    },
}

fn init_logging(level: tracing::Level) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "sw", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;
    init_logging(cfg.log.tracing_level()?);

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Import { file, dry_run } => {
            import::run_import(&cfg, &file, dry_run).await?;
        }
        Commands::Connections {
            path,
            min_strength,
            limit,
            format,
        } => {
            let filter = ConnectionFilter {
                path,
                min_strength,
                limit,
            };
            discover::run_connections(&cfg, &filter, format).await?;
        }
        Commands::Shared { kind, json } => {
            discover::run_shared(&cfg, kind, json).await?;
        }
        Commands::Taxonomy { action } => match action {
            TaxonomyAction::Top { level, limit, json } => {
                taxonomy_cmd::run_top(&cfg, level, limit, json).await?;
            }
            TaxonomyAction::Lookup { term, json } => {
                taxonomy_cmd::run_lookup(&cfg, &term, json).await?;
            }
            TaxonomyAction::List { level, json } => {
                taxonomy_cmd::run_list(&cfg, level, json).await?;
            }
        },
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Export { output } => {
            export::run_export(&cfg, output.as_deref()).await?;
        }
        Commands::Completions { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
