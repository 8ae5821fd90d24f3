use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use tracing::debug;

use crate::types::TableKind;

/// Known stats tables found on one parsed page, borrowed from the document.
pub type RawTableSet<'a> = BTreeMap<TableKind, ElementRef<'a>>;

pub struct TableLocator {
    table_selector: Selector,
}

impl Default for TableLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl TableLocator {
    pub fn new() -> Self {
        Self {
            table_selector: Selector::parse("table[id]").expect("static selector"),
        }
    }

    /// Picks out the known tables present in `document`. When an id repeats,
    /// the first table carrying it wins.
    pub fn locate<'a>(&self, document: &'a Html) -> RawTableSet<'a> {
        let mut tables = RawTableSet::new();

        for table in document.select(&self.table_selector) {
            let Some(kind) = table.value().id().and_then(TableKind::from_table_id) else {
                continue;
            };
            tables.entry(kind).or_insert(table);
        }

        debug!(
            "Located {} known tables: {:?}",
            tables.len(),
            tables.keys().collect::<Vec<_>>()
        );
        tables
    }
}
