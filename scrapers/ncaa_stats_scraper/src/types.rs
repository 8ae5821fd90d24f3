use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

pub const PLAYER_NAME_FIELD: &str = "Player Name";

/// One scrape unit: a player and the stats page to read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRef {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "URL")]
    pub url: String,
}

impl PlayerRef {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TableKind {
    PerGame,
    PerMin,
    PerPoss,
    Advanced,
}

impl TableKind {
    pub const ALL: [TableKind; 4] = [
        TableKind::PerGame,
        TableKind::PerMin,
        TableKind::PerPoss,
        TableKind::Advanced,
    ];

    /// The `id` attribute of the table on the player page.
    pub fn table_id(self) -> &'static str {
        match self {
            TableKind::PerGame => "players_per_game",
            TableKind::PerMin => "players_per_min",
            TableKind::PerPoss => "players_per_poss",
            TableKind::Advanced => "players_advanced",
        }
    }

    pub fn from_table_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.table_id() == id)
    }

    /// Base name of the persisted artifact holding this kind's records.
    pub fn artifact_stem(self) -> &'static str {
        match self {
            TableKind::PerGame => "per_game_raw_stats_log",
            TableKind::PerMin => "per_40_min_stats_log",
            TableKind::PerPoss => "per_100_poss_stats_log",
            TableKind::Advanced => "per_game_advanced_stats_log",
        }
    }

    /// Heading used when printing this kind's records.
    pub fn log_label(self) -> &'static str {
        match self {
            TableKind::PerGame => "Raw Stats Log",
            TableKind::PerMin => "Per 40 Minutes Stats Log",
            TableKind::PerPoss => "Per 100 Possessions Stats Log",
            TableKind::Advanced => "Advanced Stats Log",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_id())
    }
}

/// Most recent season row of one table for one player.
///
/// Blank cells never make it in here: every entry in `stats` is a finite
/// number read from a non-empty cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatRecord {
    #[serde(rename = "Player Name")]
    pub player_name: String,
    #[serde(flatten)]
    pub stats: BTreeMap<String, f64>,
}

impl StatRecord {
    pub fn new(player_name: impl Into<String>) -> Self {
        Self {
            player_name: player_name.into(),
            stats: BTreeMap::new(),
        }
    }

    pub fn get(&self, field: &str) -> Option<f64> {
        self.stats.get(field).copied()
    }

    /// Field names in the record, "Player Name" first.
    pub fn field_names(&self) -> Vec<&str> {
        std::iter::once(PLAYER_NAME_FIELD)
            .chain(self.stats.keys().map(String::as_str))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub per_game: Vec<StatRecord>,
    pub per_min: Vec<StatRecord>,
    pub per_poss: Vec<StatRecord>,
    pub advanced: Vec<StatRecord>,
    /// Players whose page came back with an error status or without any
    /// of the known tables.
    pub errors: Vec<PlayerRef>,
}

impl ScrapeResult {
    pub fn records(&self, kind: TableKind) -> &[StatRecord] {
        match kind {
            TableKind::PerGame => &self.per_game,
            TableKind::PerMin => &self.per_min,
            TableKind::PerPoss => &self.per_poss,
            TableKind::Advanced => &self.advanced,
        }
    }

    pub fn records_mut(&mut self, kind: TableKind) -> &mut Vec<StatRecord> {
        match kind {
            TableKind::PerGame => &mut self.per_game,
            TableKind::PerMin => &mut self.per_min,
            TableKind::PerPoss => &mut self.per_poss,
            TableKind::Advanced => &mut self.advanced,
        }
    }

    pub fn push(&mut self, kind: TableKind, record: StatRecord) {
        self.records_mut(kind).push(record);
    }

    pub fn error_names(&self) -> Vec<&str> {
        self.errors.iter().map(|p| p.name.as_str()).collect()
    }

    /// End-of-run report. `full` prints every record as JSON instead of
    /// per-kind counts.
    pub fn summary(&self, full: bool) -> Summary<'_> {
        Summary { result: self, full }
    }
}

pub struct Summary<'a> {
    result: &'a ScrapeResult,
    full: bool,
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Error Players: {:?}", self.result.error_names())?;
        for kind in TableKind::ALL {
            let records = self.result.records(kind);
            if self.full {
                let json = serde_json::to_string(records).map_err(|_| fmt::Error)?;
                writeln!(f, "{}: {}", kind.log_label(), json)?;
            } else {
                writeln!(f, "{}: {} records", kind.log_label(), records.len())?;
            }
        }
        Ok(())
    }
}
