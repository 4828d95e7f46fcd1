// src/main.rs
//
// MapVault CLI

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use mapvault::application::commands;
use mapvault::application::dto::*;
use mapvault::application::{AppState, ErrorResponse, MapRanking};
use mapvault::config::LibraryConfig;
use mapvault::error::{AppError, AppResult};
use mapvault::integrations::{
    DecoderFactory, FfmpegDecoderFactory, NoThesaurus, Thesaurus, WordListThesaurus,
};

/// Battle map and token library
#[derive(Parser, Debug)]
#[command(name = "mapvault", version, about, long_about = None)]
struct Cli {
    /// Config file (JSON); defaults apply when it does not exist
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the assets root from the config
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Ranking used for map searches
    #[arg(long, value_enum, default_value_t = Ranking::Scored, global = true)]
    strategy: Ranking,

    /// Print results as JSON
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Ranking {
    Scored,
    TagCutoff,
}

impl From<Ranking> for MapRanking {
    fn from(ranking: Ranking) -> Self {
        match ranking {
            Ranking::Scored => MapRanking::Scored,
            Ranking::TagCutoff => MapRanking::TagCutoff,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search maps by name, tags and synonyms
    Search {
        query: Vec<String>,
        /// Maximum results; negative for all
        #[arg(short, long, default_value_t = -1, allow_negative_numbers = true)]
        limit: i64,
    },
    /// Search tokens by name
    Tokens {
        query: Vec<String>,
        #[arg(short, long, default_value_t = -1, allow_negative_numbers = true)]
        limit: i64,
    },
    /// Show one map
    Show { name: String },
    /// Show one token
    Token { name: String },
    /// Maps carrying any of the given tags
    Tagged { tags: Vec<String> },
    /// Edit a map's tags
    Tags {
        #[command(subcommand)]
        action: TagAction,
    },
    /// Mark a map as favorite
    Favorite {
        name: String,
        /// Clear the mark instead
        #[arg(long, default_value_t = false)]
        off: bool,
    },
    /// List favorite maps
    Favorites,
    /// Rename a map
    Rename { name: String, new_name: String },
    /// Remove a map and delete its files
    Remove { name: String },
    /// Catalogue a downloaded video
    Import {
        video: PathBuf,
        /// Where the video was fetched from
        #[arg(long)]
        origin: Option<String>,
    },
    /// Pull frames from a map and report their sizes
    Frames {
        name: String,
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },
}

#[derive(Subcommand, Debug)]
enum TagAction {
    /// Add tags (free text, split into words)
    Add { name: String, tags: Vec<String> },
    /// Remove tags
    Remove { name: String, tags: Vec<String> },
}

/// Whatever a command produced
#[derive(Serialize)]
#[serde(untagged)]
enum Output {
    Names(Vec<String>),
    Map(MapDto),
    Maps(Vec<MapDto>),
    Token(TokenDto),
    Tags(TagChangeDto),
    Renamed(RenameDto),
    Frames(FramesReportDto),
}

impl Output {
    fn render(&self) -> String {
        match self {
            Output::Names(names) => names.join("\n"),
            Output::Map(map) => render_map(map),
            Output::Maps(maps) => maps
                .iter()
                .map(|m| format!("{}\t{}", m.name, m.tags.join(", ")))
                .collect::<Vec<_>>()
                .join("\n"),
            Output::Token(token) => {
                format!("{}\t{}x{}\t{}", token.name, token.width, token.height, token.path)
            }
            Output::Tags(change) => format!(
                "{}: changed [{}], now [{}]",
                change.name,
                change.changed.join(", "),
                change.tags.join(", ")
            ),
            Output::Renamed(rename) => format!("{} -> {}", rename.old_name, rename.new_name),
            Output::Frames(report) => {
                let mut lines = vec![format!(
                    "{} ({} frames)",
                    report.name,
                    report
                        .frame_count
                        .map(|n| n.to_string())
                        .unwrap_or_else(|| "?".to_string())
                )];
                lines.extend(
                    report
                        .frames
                        .iter()
                        .map(|f| format!("  #{} {}x{}", f.index, f.width, f.height)),
                );
                lines.join("\n")
            }
        }
    }
}

fn render_map(map: &MapDto) -> String {
    let mut lines = vec![
        format!("name:      {}", map.name),
        format!("video:     {}", map.path),
        format!("thumbnail: {}", map.thumbnail_path),
        format!("tags:      {}", map.tags.join(", ")),
        format!("favorite:  {}", map.favorite),
    ];
    if let Some(origin) = &map.origin {
        lines.push(format!("origin:    {}", origin));
    }
    lines.join("\n")
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let outcome = bootstrap(&cli).and_then(|state| execute(&state, cli.command));
    match outcome {
        Ok(output) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                let text = output.render();
                if !text.is_empty() {
                    println!("{}", text);
                }
            }
            Ok(())
        }
        Err(e) => {
            let response = ErrorResponse::from_app_error(&e);
            if cli.json {
                eprintln!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                eprintln!("error: {}", response);
            }
            std::process::exit(response.exit_code());
        }
    }
}

fn bootstrap(cli: &Cli) -> AppResult<AppState> {
    // 1. CONFIGURATION
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config = LibraryConfig::load(&config_path)?;
    if let Some(root) = &cli.root {
        config.assets_root = root.clone();
    }

    // 2. INTEGRATIONS
    let factory: Arc<dyn DecoderFactory> = Arc::new(FfmpegDecoderFactory::new());
    let thesaurus: Arc<dyn Thesaurus> = match config.thesaurus_path() {
        Some(path) => Arc::new(WordListThesaurus::from_file(&path)?),
        None => Arc::new(NoThesaurus),
    };

    // 3. SERVICES + WIRING
    AppState::initialize(config, factory, thesaurus, cli.strategy.into())
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mapvault")
        .join("config.json")
}

fn execute(state: &AppState, command: Command) -> AppResult<Output> {
    let output = match command {
        Command::Search { query, limit } => {
            Output::Names(commands::search_maps(state, &query.join(" "), limit))
        }
        Command::Tokens { query, limit } => {
            Output::Names(commands::search_tokens(state, &query.join(" "), limit))
        }
        Command::Show { name } => Output::Map(commands::get_map(state, &name)?),
        Command::Token { name } => Output::Token(commands::get_token(state, &name)?),
        Command::Tagged { tags } => {
            Output::Maps(commands::maps_with_tags(state, &tags.join(" ")))
        }
        Command::Tags { action } => match action {
            TagAction::Add { name, tags } => {
                Output::Tags(commands::add_tags(state, &name, &non_empty(tags)?)?)
            }
            TagAction::Remove { name, tags } => {
                Output::Tags(commands::remove_tags(state, &name, &non_empty(tags)?)?)
            }
        },
        Command::Favorite { name, off } => {
            Output::Map(commands::set_favorite(state, &name, !off)?)
        }
        Command::Favorites => Output::Maps(commands::list_favorites(state)),
        Command::Rename { name, new_name } => {
            Output::Renamed(commands::rename_map(state, &name, &new_name)?)
        }
        Command::Remove { name } => Output::Map(commands::remove_map(state, &name)?),
        Command::Import { video, origin } => {
            let video = std::path::absolute(&video)?;
            Output::Map(commands::import_map(state, video, origin)?)
        }
        Command::Frames { name, count } => {
            let report = commands::pull_frames(state, &name, count)?;
            commands::release_stream(state, &name);
            Output::Frames(report)
        }
    };
    Ok(output)
}

fn non_empty(words: Vec<String>) -> AppResult<String> {
    let text = words.join(" ");
    if text.trim().is_empty() {
        return Err(AppError::Other("No tags given".to_string()));
    }
    Ok(text)
}
