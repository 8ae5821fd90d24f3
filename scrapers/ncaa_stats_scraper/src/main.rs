use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::info;

use ncaa_stats_scraper::{
    checkpoint::JsonlCheckpoint,
    config::ScraperConfig,
    fetcher::HttpFetcher,
    input::read_players_file,
    orchestrator::ScrapeOrchestrator,
    pacing::ThreadSleep,
};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape the latest season stats for every player in a CSV
    Scrape {
        /// CSV file with Name and URL columns
        #[arg(short, long)]
        input: PathBuf,

        /// Only process the first N players
        #[arg(short, long)]
        limit: Option<usize>,

        /// Directory for checkpoint files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Suffix appended to every output file name
        #[arg(short, long)]
        suffix: Option<String>,

        /// Print every scraped record instead of counts
        #[arg(short, long)]
        verbose: bool,
    },
    /// Print what the last checkpoint holds
    Summary {
        /// Directory for checkpoint files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Suffix appended to every output file name
        #[arg(short, long)]
        suffix: Option<String>,

        /// Print every saved record instead of counts
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut config = ScraperConfig::from_env();

    match cli.command {
        Commands::Scrape {
            input,
            limit,
            output_dir,
            suffix,
            verbose,
        } => {
            if let Some(dir) = output_dir {
                config.output.dir = dir;
            }
            if let Some(suffix) = suffix {
                config.output.suffix = suffix;
            }

            let mut players = read_players_file(&input)
                .with_context(|| format!("Failed to read players from {:?}", input))?;
            if let Some(limit) = limit {
                players.truncate(limit);
                info!("Limited to processing {} players", limit);
            }

            let fetcher = HttpFetcher::new(&config.scraping).context("Failed to create HTTP client")?;
            let store = JsonlCheckpoint::new(&config.output.dir, &config.output.suffix);

            let pb = ProgressBar::new(players.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} players ({eta}) {msg}")
                    .context("Invalid progress bar template")?,
            );

            let mut orchestrator =
                ScrapeOrchestrator::new(&config, fetcher, store, ThreadSleep).with_progress(pb);
            orchestrator.run(&players).context("Scrape run aborted")?;

            info!(
                "Processed {} players, scraped {}",
                orchestrator.processed(),
                orchestrator.scraped()
            );
            print!("{}", orchestrator.result().summary(verbose));
        }
        Commands::Summary {
            output_dir,
            suffix,
            verbose,
        } => {
            let dir = output_dir.unwrap_or(config.output.dir);
            let suffix = suffix.unwrap_or(config.output.suffix);
            let store = JsonlCheckpoint::new(&dir, suffix);
            let result = store
                .load()
                .with_context(|| format!("Failed to load checkpoint from {:?}", dir))?;
            print!("{}", result.summary(verbose));
        }
    }

    Ok(())
}
