use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};
use podcastr::app::{self, App};
use podcastr::config::Config;
use podcastr::episode_download::{
    FeedFetcher, FeedQuery, FeedState, HttpFeedFetcher, load_feed_state,
};
use podcastr::episode_factory::EpisodeFactory;
use podcastr::player::PlayerStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Browse and play the latest podcast episodes from the terminal.
#[derive(Parser, Debug)]
#[command(name = "podcastr", version)]
struct Args {
    /// Base URL of the episodes API (overrides config)
    #[arg(long)]
    api_url: Option<String>,

    /// Number of episodes to request (overrides config)
    #[arg(long)]
    limit: Option<usize>,

    /// Log file (overrides config)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Config file to read instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the episode lists and exit instead of starting the UI
    #[arg(long)]
    print: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn setup_logging(verbosity: u8, log_file: &Path) -> Result<()> {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(
            fern::log_file(log_file)
                .with_context(|| format!("opening log file {}", log_file.display()))?,
        )
        .apply()?;
    Ok(())
}

fn print_feed(state: &FeedState) {
    match state {
        FeedState::Loaded(feed) => {
            println!("Últimos lançamentos");
            for episode in &feed.latest {
                println!("{}\n", episode);
            }
            println!("Todos episódios");
            for episode in &feed.all {
                println!("{}\n", episode);
            }
        }
        FeedState::Unavailable(reason) => println!("Episódios indisponíveis: {}", reason),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(api_url) = args.api_url {
        config.api_url = api_url;
    }
    if let Some(limit) = args.limit {
        config.episode_limit = limit;
    }
    if let Some(log_file) = args.log_file {
        config.log_file = log_file;
    }

    setup_logging(args.verbose, &config.log_file)?;
    info!("Starting with {:?}", config);

    let fetcher: Arc<dyn FeedFetcher + Send + Sync> = Arc::new(HttpFeedFetcher::new()?);
    let query = FeedQuery { limit: config.episode_limit, ..FeedQuery::default() };
    let feed_state =
        load_feed_state(&config.api_url, &query, fetcher.as_ref(), &EpisodeFactory::new()).await;

    if args.print {
        print_feed(&feed_state);
        return Ok(());
    }

    app::start_ui(App::new(feed_state, PlayerStore::new()))
}
