use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use stanza_etl::Config;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "stanza", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Root directory of the artifact store (default: ~/.local/share/stanza)
    #[arg(long, global = true)]
    store_root: Option<PathBuf>,

    /// Bucket to read and write (default: country)
    #[arg(long, global = true)]
    bucket: Option<String>,

    /// Folder within the bucket (default: data)
    #[arg(long, global = true)]
    folder: Option<String>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Scrape weekly charts and rebuild the charts table
    ///
    /// Every Saturday chart from the configured first date up to the most
    /// recent one is fetched once and stored as its own snapshot. Weeks
    /// already in the bucket are skipped, so an interrupted scrape resumes
    /// where it stopped. All snapshots are then folded into the normalized
    /// charts table.
    Charts {
        /// Treat this date as today when choosing the newest chart week
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Build the song library, top artists and number ones
    Library {
        /// Upload a manually tagged gender table (artist_strip,gender) first
        #[arg(long, value_name = "FILE")]
        import_genders: Option<PathBuf>,
    },
    /// Fetch lyrics for every library song that has none yet
    ///
    /// Progress is saved after each song. Transient API failures are retried
    /// with exponential backoff; songs that still fail are picked up by the
    /// next round or the next invocation.
    Lyrics,
    /// Merge, prune and collapse the lyrics into the hierarchical corpus
    Corpus {
        /// Drop songs with this many words or more
        #[arg(long)]
        max_song_words: Option<usize>,
    },
    /// Run the full charts → library → lyrics → corpus pipeline
    ///
    /// A run that stopped at a failed stage resumes from that stage. A run
    /// that finished starts over, scraping any new chart weeks and
    /// rebuilding every table.
    Run {
        /// Treat this date as today when choosing the newest chart week
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Discard stored stage state and run every stage
        #[arg(long)]
        restart: bool,
    },
    /// Show which datasets exist in the bucket folder
    Status,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Print an example config file
    Example,
    /// Create the config file with defaults if it does not exist
    Init,
}

fn apply_overrides(mut config: Config, cli: &Cli) -> Config {
    if let Some(store_root) = &cli.store_root {
        config = config.with_store_root(store_root.clone());
    }
    if let Some(bucket) = &cli.bucket {
        config = config.with_bucket(bucket.as_str());
    }
    if let Some(folder) = &cli.folder {
        config = config.with_folder(folder.as_str());
    }
    config
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = apply_overrides(Config::load()?, &cli);

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .init();

    match cli.command {
        Commands::Charts { today } => {
            commands::run_charts(&config, today).await?;
        }
        Commands::Library { import_genders } => {
            commands::run_library(&config, import_genders)?;
        }
        Commands::Lyrics => {
            commands::run_lyrics(&config).await?;
        }
        Commands::Corpus { max_song_words } => {
            commands::run_corpus(&config, max_song_words)?;
        }
        Commands::Run { today, restart } => {
            commands::run_pipeline(&config, today, restart).await?;
        }
        Commands::Status => {
            commands::show_status(&config)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show_config(&config)?,
            ConfigAction::Path => commands::config::show_path()?,
            ConfigAction::Example => commands::config::show_example()?,
            ConfigAction::Init => commands::config::init_config()?,
        },
    }

    Ok(())
}
