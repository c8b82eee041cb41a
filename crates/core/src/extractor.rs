//! Finding cadastral numbers in CSV-shaped text.
//!
//! A recognised header column wins; otherwise every substring shaped like a
//! cadastral number is collected from the raw text.

use std::sync::OnceLock;

use csv::ReaderBuilder;
use log::{debug, warn};
use regex::Regex;

use crate::domain::Identifier;

/// Header columns that hold cadastral numbers, in order of preference.
pub const TARGET_COLUMNS: [&str; 2] = ["Наименование объекта", "Кадастровый номер"];

const CADASTRAL_NUMBER_PATTERN: &str = r"\d{2}:\d{2}:\d{6,7}:\d+";

const BOM: char = '\u{feff}';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// Values were taken from the named column
    ColumnBased(String),
    /// Values were matched anywhere in the text
    PatternBased,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub strategy: ExtractionStrategy,
    /// Candidates in source order, duplicates included
    pub identifiers: Vec<Identifier>,
}

fn cadastral_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(CADASTRAL_NUMBER_PATTERN).expect("cadastral number pattern is valid"))
}

/// Returns every non-overlapping cadastral-number-shaped substring of `text`.
pub fn scan_pattern(text: &str) -> Vec<Identifier> {
    cadastral_pattern()
        .find_iter(text)
        .map(|m| Identifier::new(m.as_str()))
        .collect()
}

/// Delimiters tried when looking for a target column, in order.
pub const CANDIDATE_DELIMITERS: [u8; 3] = [b',', b';', b'\t'];

fn csv_reader(text: &str, delimiter: u8) -> csv::Reader<&[u8]> {
    ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes())
}

/// Locates the preferred target column among the header cells.
fn find_target_column(headers: &csv::StringRecord) -> Option<(usize, &'static str)> {
    TARGET_COLUMNS.iter().find_map(|target| {
        headers
            .iter()
            .position(|cell| cell.trim_start_matches(BOM).trim() == *target)
            .map(|index| (index, *target))
    })
}

/// Extracts candidate identifiers from the whole input text.
pub fn extract_identifiers(text: &str) -> Extraction {
    let text = text.trim_start_matches(BOM);

    let target = CANDIDATE_DELIMITERS.iter().find_map(|&delimiter| {
        match csv_reader(text, delimiter).headers() {
            Ok(headers) => find_target_column(headers).map(|(index, column)| (delimiter, index, column)),
            Err(e) => {
                debug!("Header row could not be parsed with {:?}: {}", char::from(delimiter), e);
                None
            }
        }
    });

    let Some((delimiter, index, column)) = target else {
        return Extraction {
            strategy: ExtractionStrategy::PatternBased,
            identifiers: scan_pattern(text),
        };
    };

    let mut reader = csv_reader(text, delimiter);
    let mut identifiers = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping unreadable CSV row {}: {}", line + 2, e);
                continue;
            }
        };
        if let Some(cell) = record.get(index) {
            let cell = cell.trim();
            if !cell.is_empty() {
                identifiers.push(Identifier::new(cell));
            }
        }
    }

    Extraction {
        strategy: ExtractionStrategy::ColumnBased(column.to_string()),
        identifiers,
    }
}
