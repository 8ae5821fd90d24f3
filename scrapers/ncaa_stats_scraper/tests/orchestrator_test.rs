use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use std::{
    cell::RefCell,
    collections::HashMap,
    time::Duration,
};
use tempfile::tempdir;

use ncaa_stats_scraper::{
    checkpoint::{CheckpointSink, JsonlCheckpoint},
    config::ScraperConfig,
    error::{ExtractionError, FetchError, ScrapeError, StorageError},
    fetcher::{FetchedPage, HttpFetcher, PageFetcher},
    orchestrator::{PlayerOutcome, ScrapeOrchestrator},
    pacing::Pause,
    types::{PlayerRef, ScrapeResult, StatRecord, TableKind},
};

const PER_GAME_ONLY: &str = r#"<html><body>
<table id="players_per_game">
<thead><tr><th>Season</th><th>School</th><th>Conf</th><th>Pts</th><th>Reb</th></tr></thead>
<tbody><tr><th>2019-20</th><td>Duke</td><td>ACC</td><td>20.5</td><td></td></tr></tbody>
<tfoot><tr><th>Career</th><td></td><td></td><td>20.5</td><td>7.0</td></tr></tfoot>
</table>
</body></html>"#;

const NO_TABLES: &str = "<html><body><p>Nothing to see</p></body></html>";

const BROKEN_TABLE: &str = r#"<table id="players_advanced">
<tr><th>Season</th><th>School</th><th>Conf</th><th>PER</th></tr>
<tr><th>2019-20</th><td>Duke</td><td>ACC</td><td>n/a</td></tr>
<tr><th>Career</th><td></td><td></td><td>1.0</td></tr>
</table>"#;

/// Serves canned pages keyed by URL.
#[derive(Default)]
struct StubFetcher {
    pages: HashMap<String, (u16, String)>,
    requested: RefCell<Vec<String>>,
}

impl StubFetcher {
    fn page(mut self, url: &str, status: u16, body: &str) -> Self {
        self.pages.insert(url.to_string(), (status, body.to_string()));
        self
    }
}

impl PageFetcher for StubFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.requested.borrow_mut().push(url.to_string());
        let (status, body) = self.pages.get(url).expect("unexpected url").clone();
        Ok(FetchedPage {
            url: url.to_string(),
            status: StatusCode::from_u16(status).unwrap(),
            body,
        })
    }
}

/// Keeps every snapshot it is handed.
#[derive(Default)]
struct RecordingSink {
    snapshots: Vec<ScrapeResult>,
}

impl CheckpointSink for RecordingSink {
    fn save(&mut self, result: &ScrapeResult) -> Result<(), StorageError> {
        self.snapshots.push(result.clone());
        Ok(())
    }
}

#[derive(Default)]
struct RecordingPause(RefCell<Vec<Duration>>);

impl Pause for RecordingPause {
    fn pause(&self, duration: Duration) {
        self.0.borrow_mut().push(duration);
    }
}

fn per_game_record(player: &str) -> StatRecord {
    let mut record = StatRecord::new(player);
    record.stats.insert("Pts".to_string(), 20.5);
    record
}

#[test]
fn test_end_to_end_scenario() {
    let fetcher = StubFetcher::default()
        .page("url1", 200, PER_GAME_ONLY)
        .page("url2", 200, NO_TABLES);
    let mut sink = RecordingSink::default();
    let pause = RecordingPause::default();
    let players = vec![PlayerRef::new("A", "url1"), PlayerRef::new("B", "url2")];

    let mut orchestrator = ScrapeOrchestrator::new(&ScraperConfig::default(), &fetcher, &mut sink, &pause);
    orchestrator.run(&players).unwrap();

    assert_eq!(orchestrator.processed(), 2);
    assert_eq!(orchestrator.scraped(), 1);
    let result = orchestrator.into_result();

    assert_eq!(result.per_game, vec![per_game_record("A")]);
    assert_eq!(result.error_names(), vec!["B"]);
    assert!(result.per_min.is_empty());
    assert!(result.per_poss.is_empty());
    assert!(result.advanced.is_empty());

    // Only the final save; no periodic checkpoint before ten players.
    assert_eq!(sink.snapshots, vec![result]);
    assert_eq!(*fetcher.requested.borrow(), vec!["url1", "url2"]);
    assert_eq!(*pause.0.borrow(), vec![Duration::from_secs(6); 2]);
}

#[test]
fn test_player_outcomes() {
    let fetcher = StubFetcher::default()
        .page("ok", 200, PER_GAME_ONLY)
        .page("empty", 200, NO_TABLES)
        .page("gone", 404, PER_GAME_ONLY);
    let mut orchestrator = ScrapeOrchestrator::new(
        &ScraperConfig::default(),
        &fetcher,
        RecordingSink::default(),
        RecordingPause::default(),
    );

    assert_eq!(
        orchestrator.scrape_player(&PlayerRef::new("A", "ok")).unwrap(),
        PlayerOutcome::Recorded(vec![TableKind::PerGame])
    );
    assert_eq!(
        orchestrator.scrape_player(&PlayerRef::new("B", "empty")).unwrap(),
        PlayerOutcome::NoTables
    );
    // A 404 page is not parsed even when it happens to carry a table.
    assert_eq!(
        orchestrator.scrape_player(&PlayerRef::new("C", "gone")).unwrap(),
        PlayerOutcome::BadStatus(404)
    );

    assert_eq!(orchestrator.result().per_game.len(), 1);
    assert_eq!(orchestrator.result().error_names(), vec!["B", "C"]);
    assert_eq!(orchestrator.processed(), 3);
    assert_eq!(orchestrator.scraped(), 1);
}

#[test]
fn test_checkpoint_every_ten_players() {
    let mut fetcher = StubFetcher::default();
    let mut players = Vec::new();
    for i in 0..12 {
        let url = format!("url{}", i);
        let body = if i % 3 == 0 { NO_TABLES } else { PER_GAME_ONLY };
        fetcher = fetcher.page(&url, 200, body);
        players.push(PlayerRef::new(format!("P{}", i), url));
    }
    let mut sink = RecordingSink::default();

    let mut orchestrator =
        ScrapeOrchestrator::new(&ScraperConfig::default(), &fetcher, &mut sink, RecordingPause::default());
    orchestrator.run(&players).unwrap();
    let final_result = orchestrator.into_result();

    assert_eq!(sink.snapshots.len(), 2);
    let checkpoint = &sink.snapshots[0];
    assert_eq!(checkpoint.per_game.len(), 6);
    assert_eq!(checkpoint.error_names(), vec!["P0", "P3", "P6", "P9"]);
    assert_eq!(sink.snapshots[1], final_result);
    assert_eq!(final_result.per_game.len(), 8);
}

#[test]
fn test_extraction_failure_is_fatal_and_keeps_last_checkpoint() {
    let dir = tempdir().unwrap();
    let mut fetcher = StubFetcher::default();
    let mut players = Vec::new();
    for i in 0..10 {
        let url = format!("url{}", i);
        fetcher = fetcher.page(&url, 200, if i == 4 { NO_TABLES } else { PER_GAME_ONLY });
        players.push(PlayerRef::new(format!("P{}", i), url));
    }
    fetcher = fetcher.page("broken", 200, BROKEN_TABLE);
    players.push(PlayerRef::new("P10", "broken"));
    fetcher = fetcher.page("never", 200, PER_GAME_ONLY);
    players.push(PlayerRef::new("P11", "never"));

    let store = JsonlCheckpoint::new(dir.path(), "test");
    let mut orchestrator =
        ScrapeOrchestrator::new(&ScraperConfig::default(), &fetcher, store.clone(), RecordingPause::default());

    match orchestrator.run(&players) {
        Err(ScrapeError::Extraction { player, kind, source }) => {
            assert_eq!(player, "P10");
            assert_eq!(kind, TableKind::Advanced);
            assert_eq!(
                source,
                ExtractionError::InvalidNumber {
                    field: "PER".to_string(),
                    value: "n/a".to_string(),
                }
            );
        }
        other => panic!("expected an extraction error, got {:?}", other),
    }
    assert!(!fetcher.requested.borrow().contains(&"never".to_string()));

    let saved = store.load().unwrap();
    assert_eq!(saved.per_game.len(), 9);
    assert_eq!(saved.per_game[0], per_game_record("P0"));
    assert_eq!(saved.error_names(), vec!["P4"]);
    assert!(saved.advanced.is_empty());
}

#[test]
fn test_http_run_writes_all_artifacts() {
    let mut server = mockito::Server::new();
    let a = server
        .mock("GET", "/cbb/players/a-1.html")
        .with_status(200)
        .with_body(PER_GAME_ONLY)
        .create();
    let b = server
        .mock("GET", "/cbb/players/b-1.html")
        .with_status(200)
        .with_body(NO_TABLES)
        .create();
    let c = server
        .mock("GET", "/cbb/players/c-1.html")
        .with_status(500)
        .with_body("Internal Server Error")
        .create();

    let dir = tempdir().unwrap();
    let mut config = ScraperConfig::default();
    config.rate_limits.request_delay_secs = 0;
    config.scraping.request_timeout_secs = 5;
    config.output.dir = dir.path().to_path_buf();

    let players: Vec<PlayerRef> = ["a", "b", "c"]
        .iter()
        .map(|p| PlayerRef::new(p.to_uppercase(), format!("{}/cbb/players/{}-1.html", server.url(), p)))
        .collect();

    let fetcher = HttpFetcher::new(&config.scraping).unwrap();
    let store = JsonlCheckpoint::new(&config.output.dir, &config.output.suffix);
    let mut orchestrator = ScrapeOrchestrator::new(&config, fetcher, store.clone(), RecordingPause::default());
    orchestrator.run(&players).unwrap();

    a.assert();
    b.assert();
    c.assert();

    let saved = store.load().unwrap();
    assert_eq!(saved.per_game, vec![per_game_record("A")]);
    assert_eq!(saved.errors, players[1..].to_vec());
    let artifacts = store.current_artifacts().unwrap().unwrap();
    for kind in TableKind::ALL {
        assert!(artifacts.join(store.records_file_name(kind)).exists());
    }
    assert!(artifacts.join(store.error_players_file_name()).exists());
}
