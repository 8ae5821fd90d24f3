use indicatif::ProgressBar;
use scraper::Html;
use std::time::Duration;
use tracing::{info, warn};

use crate::{
    checkpoint::CheckpointSink,
    config::ScraperConfig,
    error::{Result, ScrapeError},
    extractor::SeasonRowExtractor,
    fetcher::PageFetcher,
    locator::TableLocator,
    pacing::Pause,
    types::{PlayerRef, ScrapeResult, TableKind},
};

const PROGRESS_LOG_INTERVAL: usize = 10;

/// What happened to a single player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerOutcome {
    /// At least one known table was found and extracted.
    Recorded(Vec<TableKind>),
    /// The page loaded but none of the known tables were on it.
    NoTables,
    /// The server answered with a non-success status.
    BadStatus(u16),
}

/// Drives the sequential fetch, locate and extract loop and owns everything
/// accumulated along the way.
pub struct ScrapeOrchestrator<F, S, P> {
    fetcher: F,
    sink: S,
    pause: P,
    locator: TableLocator,
    extractor: SeasonRowExtractor,
    request_delay: Duration,
    checkpoint_interval: usize,
    progress: ProgressBar,
    result: ScrapeResult,
    processed: usize,
    scraped: usize,
}

impl<F, S, P> ScrapeOrchestrator<F, S, P>
where
    F: PageFetcher,
    S: CheckpointSink,
    P: Pause,
{
    pub fn new(config: &ScraperConfig, fetcher: F, sink: S, pause: P) -> Self {
        Self {
            fetcher,
            sink,
            pause,
            locator: TableLocator::new(),
            extractor: SeasonRowExtractor::new(),
            request_delay: config.request_delay(),
            checkpoint_interval: config.output.checkpoint_interval.max(1),
            progress: ProgressBar::hidden(),
            result: ScrapeResult::default(),
            processed: 0,
            scraped: 0,
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn result(&self) -> &ScrapeResult {
        &self.result
    }

    pub fn into_result(self) -> ScrapeResult {
        self.result
    }

    /// Players handled so far, successful or not.
    pub fn processed(&self) -> usize {
        self.processed
    }

    /// Players whose page had at least one known table.
    pub fn scraped(&self) -> usize {
        self.scraped
    }

    /// Scrapes every player in order, checkpointing along the way and once
    /// more at the end. A fatal error stops the run and leaves only the last
    /// periodic checkpoint on disk.
    pub fn run(&mut self, players: &[PlayerRef]) -> Result<()> {
        info!("Starting scrape of {} players", players.len());
        self.progress.set_length(players.len() as u64);

        for player in players {
            self.scrape_player(player)?;
            self.progress.inc(1);

            if self.processed % self.checkpoint_interval == 0 {
                self.sink.save(&self.result)?;
            }
        }

        self.sink.save(&self.result)?;
        self.progress.finish_and_clear();
        info!(
            "Finished: processed {} players, scraped {}, {} errors",
            self.processed,
            self.scraped,
            self.result.errors.len()
        );
        Ok(())
    }

    /// Handles one player: waits out the request delay, fetches the page and
    /// folds whatever it yields into the result.
    pub fn scrape_player(&mut self, player: &PlayerRef) -> Result<PlayerOutcome> {
        self.processed += 1;
        self.pause.pause(self.request_delay);
        self.progress.set_message(player.name.clone());

        let page = self.fetcher.fetch(&player.url)?;
        if !page.is_success() {
            warn!(
                "Failed to scrape stats for {}: HTTP {} from {}",
                player.name, page.status, player.url
            );
            self.result.errors.push(player.clone());
            return Ok(PlayerOutcome::BadStatus(page.status.as_u16()));
        }

        let document = Html::parse_document(&page.body);
        let tables = self.locator.locate(&document);
        if tables.is_empty() {
            warn!("Failed to scrape stats for {}: no stats tables on page", player.name);
            self.result.errors.push(player.clone());
            return Ok(PlayerOutcome::NoTables);
        }

        self.scraped += 1;
        if self.scraped % PROGRESS_LOG_INTERVAL == 0 {
            info!("Scraped data for {} players", self.scraped);
        }

        let mut kinds = Vec::with_capacity(tables.len());
        for (kind, table) in tables {
            let record = self
                .extractor
                .extract(&player.name, table)
                .map_err(|source| ScrapeError::Extraction {
                    player: player.name.clone(),
                    kind,
                    source,
                })?;
            self.result.push(kind, record);
            kinds.push(kind);
        }

        Ok(PlayerOutcome::Recorded(kinds))
    }
}
