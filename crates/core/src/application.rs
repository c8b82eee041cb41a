use std::thread;
use std::time::Duration;

use log::{info, warn};

use crate::domain::{LookupResult, RowKind, RunSummary, FIELD_SCHEMA};
use crate::error::ParseError;
use crate::extractor::{extract_identifiers, ExtractionStrategy};
use crate::normalizer::normalize;
use crate::ports::{LookupClient, ReportWriter, Result, TextSource};
use crate::utils::dedup_preserving_order;

/// Spacing between successive registry requests
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(50);

/// Fixed wait applied after every lookup, regardless of how long it took
#[derive(Debug, Clone, Copy)]
pub struct Throttle {
    delay: Duration,
}

impl Throttle {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn wait(&self) {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_DELAY)
    }
}

/// Application service: reads the input, looks every cadastral number up once
/// and writes the normalized report
pub struct ParsingServiceImpl {
    text_source: Box<dyn TextSource>,
    lookup_client: Box<dyn LookupClient>,
    report_writer: Box<dyn ReportWriter>,
    throttle: Throttle,
}

impl ParsingServiceImpl {
    /// Creates a new ParsingServiceImpl with the given dependencies
    pub fn new(
        text_source: Box<dyn TextSource>,
        lookup_client: Box<dyn LookupClient>,
        report_writer: Box<dyn ReportWriter>,
        throttle: Throttle,
    ) -> Self {
        Self {
            text_source,
            lookup_client,
            report_writer,
            throttle,
        }
    }

    /// Runs the whole batch. Lookups happen one at a time in first-occurrence
    /// order; only unreadable input, an empty identifier list or a report
    /// write failure end the run with an error.
    pub fn execute(&mut self) -> Result<RunSummary> {
        let source = self.text_source.read_text()?;
        info!("Processing {}", source.name);

        let extraction = extract_identifiers(&source.content);
        match &extraction.strategy {
            ExtractionStrategy::ColumnBased(column) => info!("Reading column \"{}\"", column),
            ExtractionStrategy::PatternBased => {
                info!("No known column header, searching the whole text")
            }
        }

        let identifiers = dedup_preserving_order(extraction.identifiers);
        if identifiers.is_empty() {
            return Err(ParseError::NoIdentifiers(source.name));
        }
        let total = identifiers.len();
        info!("Found {} unique cadastral numbers", total);

        self.report_writer.write_header(&FIELD_SCHEMA)?;
        let mut summary = RunSummary {
            output_path: self.report_writer.destination().to_path_buf(),
            total,
            ..RunSummary::default()
        };

        for (i, identifier) in identifiers.iter().enumerate() {
            let result = self.lookup_client.lookup(identifier);
            if let LookupResult::Failed(reason) = &result {
                warn!("Lookup failed for {}: {}", identifier, reason);
            }

            let row = normalize(identifier, &result);
            self.report_writer.write_row(&row)?;

            let outcome = match row.kind {
                RowKind::Record => {
                    summary.records += 1;
                    "OK"
                }
                RowKind::Placeholder => {
                    summary.placeholders += 1;
                    "no record"
                }
                RowKind::Error => {
                    summary.errors += 1;
                    "error"
                }
            };
            info!("[{}/{}] {} ... {}", i + 1, total, identifier, outcome);

            self.throttle.wait();
        }

        self.report_writer.finish()?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Identifier, OutputRow, SourceText, CADASTRAL_NUMBER_FIELD};
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::rc::Rc;

    struct FakeSource(Option<String>);

    impl TextSource for FakeSource {
        fn read_text(&self) -> Result<SourceText> {
            match &self.0 {
                Some(content) => Ok(SourceText {
                    name: "input.csv".to_string(),
                    content: content.clone(),
                }),
                None => Err(ParseError::NoCsvInArchive(PathBuf::from("input.zip"))),
            }
        }
    }

    #[derive(Default)]
    struct FakeRegistry {
        responses: HashMap<String, LookupResult>,
        calls: Rc<RefCell<Vec<String>>>,
    }

    impl LookupClient for FakeRegistry {
        fn lookup(&self, identifier: &Identifier) -> LookupResult {
            self.calls.borrow_mut().push(identifier.to_string());
            self.responses
                .get(identifier.as_str())
                .cloned()
                .unwrap_or(LookupResult::Empty)
        }
    }

    #[derive(Default)]
    struct Recorded {
        header: Option<Vec<String>>,
        rows: Vec<OutputRow>,
        finished: bool,
    }

    struct RecordingWriter {
        recorded: Rc<RefCell<Recorded>>,
        path: PathBuf,
    }

    impl ReportWriter for RecordingWriter {
        fn write_header(&mut self, header: &[&str]) -> Result<()> {
            self.recorded.borrow_mut().header = Some(header.iter().map(|h| h.to_string()).collect());
            Ok(())
        }

        fn write_row(&mut self, row: &OutputRow) -> Result<()> {
            self.recorded.borrow_mut().rows.push(row.clone());
            Ok(())
        }

        fn finish(&mut self) -> Result<()> {
            self.recorded.borrow_mut().finished = true;
            Ok(())
        }

        fn destination(&self) -> &Path {
            &self.path
        }
    }

    fn service(
        content: Option<&str>,
        responses: HashMap<String, LookupResult>,
    ) -> (ParsingServiceImpl, Rc<RefCell<Recorded>>, Rc<RefCell<Vec<String>>>) {
        let recorded = Rc::new(RefCell::new(Recorded::default()));
        let calls = Rc::new(RefCell::new(Vec::new()));
        let service = ParsingServiceImpl::new(
            Box::new(FakeSource(content.map(str::to_string))),
            Box::new(FakeRegistry {
                responses,
                calls: Rc::clone(&calls),
            }),
            Box::new(RecordingWriter {
                recorded: Rc::clone(&recorded),
                path: PathBuf::from("input_PARSED.csv"),
            }),
            Throttle::new(Duration::ZERO),
        );
        (service, recorded, calls)
    }

    #[test]
    fn test_execute_writes_one_row_per_unique_identifier() {
        let content = "Кадастровый номер\nb\na\nb\nc\na\n";
        let (mut service, recorded, calls) = service(Some(content), HashMap::new());

        let summary = service.execute().unwrap();

        assert_eq!(*calls.borrow(), vec!["b", "a", "c"]);
        let recorded = recorded.borrow();
        assert_eq!(recorded.header.as_ref().unwrap().len(), FIELD_SCHEMA.len());
        let numbers: Vec<&str> = recorded
            .rows
            .iter()
            .map(|row| row.cells[CADASTRAL_NUMBER_FIELD].as_str())
            .collect();
        assert_eq!(numbers, vec!["b", "a", "c"]);
        assert!(recorded.finished);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.placeholders, 3);
        assert_eq!(summary.output_path, PathBuf::from("input_PARSED.csv"));
    }

    #[test]
    fn test_execute_counts_row_kinds() {
        let mut responses = HashMap::new();
        responses.insert(
            "77:01:0001001:23".to_string(),
            LookupResult::Found(json!({
                "data": { "features": [ { "properties": { "options": { "status": "Учтенный" } } } ] }
            })),
        );
        responses.insert(
            "50:10:0020304:1".to_string(),
            LookupResult::Found(json!({ "data": { "features": "broken" } })),
        );
        responses.insert(
            "66:41:0204016:10".to_string(),
            LookupResult::Failed("connection reset".to_string()),
        );
        let content = "77:01:0001001:23 50:10:0020304:1 66:41:0204016:10";
        let (mut service, recorded, _) = service(Some(content), responses);

        let summary = service.execute().unwrap();

        assert_eq!(summary.records, 1);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.placeholders, 1);
        let recorded = recorded.borrow();
        assert_eq!(recorded.rows[0].cells[9], "Учтенный");
        assert!(recorded.rows[1].cells.iter().all(|c| c == "Error"));
        assert_eq!(recorded.rows[2].cells[CADASTRAL_NUMBER_FIELD], "66:41:0204016:10");
    }

    #[test]
    fn test_execute_without_identifiers_writes_nothing() {
        let (mut service, recorded, calls) = service(Some("Адрес\nМосква\n"), HashMap::new());

        let err = service.execute().unwrap_err();

        assert!(matches!(err, ParseError::NoIdentifiers(_)));
        assert!(calls.borrow().is_empty());
        assert!(recorded.borrow().header.is_none());
    }

    #[test]
    fn test_execute_unreadable_source_writes_nothing() {
        let (mut service, recorded, calls) = service(None, HashMap::new());

        let err = service.execute().unwrap_err();

        assert!(matches!(err, ParseError::NoCsvInArchive(_)));
        assert!(calls.borrow().is_empty());
        assert!(recorded.borrow().header.is_none());
    }
}
