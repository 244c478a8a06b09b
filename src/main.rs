use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use menu_lens::{Command, Config};

#[derive(Parser, Debug)]
#[command(
    name = "menu-lens",
    version,
    about = "Match OCR'd menu text and queries against a dish catalog"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Additional settings file to load (highest priority)
    #[arg(short = 'r', long = "read-settings", global = true)]
    read_settings: Option<String>,

    /// Catalog directory holding tags.json and dishes.json
    #[arg(short = 'c', long = "catalog", global = true)]
    catalog: Option<String>,

    /// Enable verbose logging
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Listen address (overrides settings [server] addr)
        #[arg(long)]
        addr: Option<String>,
    },
    /// Match a JSON file of recognized lines or an OCR.space response
    Recognize {
        file: PathBuf,

        /// Record dish matches in this user's browsing history
        #[arg(short = 'u', long)]
        user: Option<String>,
    },
    /// Free-text dish search
    Search {
        #[arg(default_value = "")]
        query: String,

        /// Tag to rank first (repeatable)
        #[arg(long = "like")]
        likes: Vec<String>,

        /// Tag to exclude (repeatable)
        #[arg(long = "dislike")]
        dislikes: Vec<String>,

        /// Use this user's stored preferences when no --like/--dislike is given
        #[arg(short = 'u', long)]
        user: Option<String>,
    },
    /// Dishes carrying every given tag
    SearchTags {
        #[arg(required = true)]
        tags: Vec<String>,
    },
    /// Show a user's browsing history (newest first)
    Histories { user: String },
    /// Show a user's tag preferences, or replace them when any tag flag is given
    Preferences {
        user: String,

        #[arg(long = "like")]
        likes: Vec<String>,

        #[arg(long = "dislike")]
        dislikes: Vec<String>,

        /// Tag recorded as OTHER (no effect on search)
        #[arg(long = "other")]
        others: Vec<String>,
    },
}

impl From<Commands> for Command {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Serve { addr } => Command::Serve { addr },
            Commands::Recognize { file, user } => Command::Recognize { path: file, user },
            Commands::Search {
                query,
                likes,
                dislikes,
                user,
            } => Command::Search {
                query,
                likes,
                dislikes,
                user,
            },
            Commands::SearchTags { tags } => Command::SearchTags { tags },
            Commands::Histories { user } => Command::Histories { user },
            Commands::Preferences {
                user,
                likes,
                dislikes,
                others,
            } => Command::Preferences {
                user,
                likes,
                dislikes,
                others,
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    menu_lens::logging::init(cli.verbose)?;

    let config = Config {
        settings_path: cli.read_settings,
        catalog_dir: cli.catalog,
        command: cli.command.into(),
    };
    let output = menu_lens::run(config).await?;
    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}
