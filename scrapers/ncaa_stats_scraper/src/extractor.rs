use scraper::{ElementRef, Selector};

use crate::{error::ExtractionError, types::StatRecord};

/// Leading header cells that name the season, school and conference rather
/// than a statistic.
const SKIPPED_HEADER_CELLS: usize = 3;
/// Leading `<td>` cells of a season row that line up with the skipped headers
/// (the season itself sits in a `<th>`).
const SKIPPED_DATA_CELLS: usize = 2;

/// Reads the latest season row out of a player stats table.
pub struct SeasonRowExtractor {
    row_selector: Selector,
    header_selector: Selector,
    cell_selector: Selector,
}

impl Default for SeasonRowExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SeasonRowExtractor {
    pub fn new() -> Self {
        Self {
            row_selector: Selector::parse("tr").expect("static selector"),
            header_selector: Selector::parse("th").expect("static selector"),
            cell_selector: Selector::parse("td").expect("static selector"),
        }
    }

    pub fn extract(&self, player_name: &str, table: ElementRef<'_>) -> Result<StatRecord, ExtractionError> {
        let rows: Vec<ElementRef> = table.select(&self.row_selector).collect();
        let header_row = rows.first().ok_or(ExtractionError::MissingHeaderRow)?;

        let headers: Vec<String> = header_row
            .select(&self.header_selector)
            .skip(SKIPPED_HEADER_CELLS)
            .map(cell_text)
            .collect();

        // The last row is the career total.
        let season_cells = rows[..rows.len() - 1]
            .iter()
            .rev()
            .map(|row| row.select(&self.cell_selector).collect::<Vec<_>>())
            .find(|cells| !cells.is_empty())
            .ok_or(ExtractionError::NoSeasonFound)?;

        let values: Vec<String> = season_cells
            .into_iter()
            .skip(SKIPPED_DATA_CELLS)
            .map(cell_text)
            .collect();

        if values.len() != headers.len() {
            return Err(ExtractionError::ColumnMismatch {
                expected: headers.len(),
                found: values.len(),
            });
        }

        let mut record = StatRecord::new(player_name);
        for (field, value) in headers.into_iter().zip(values) {
            if value.is_empty() {
                continue;
            }
            let number = parse_stat(&value).ok_or_else(|| ExtractionError::InvalidNumber {
                field: field.clone(),
                value: value.clone(),
            })?;
            record.stats.insert(field, number);
        }

        Ok(record)
    }
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

fn parse_stat(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|n| n.is_finite())
}
