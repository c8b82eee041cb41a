use std::path::Path;

use crate::domain::{Identifier, LookupResult, OutputRow, SourceText};
use crate::error::ParseError;

pub type Result<T> = std::result::Result<T, ParseError>;

/// Supplies the whole decoded text of the input (plain file or archive member).
pub trait TextSource {
    fn read_text(&self) -> Result<SourceText>;
}

/// Queries the cadastral registry for a single identifier.
/// Implementations report misses and transport failures through [`LookupResult`], never by panicking.
pub trait LookupClient {
    fn lookup(&self, identifier: &Identifier) -> LookupResult;
}

/// Port for the tabular report. The destination must not exist on disk
/// before `write_header` is called.
pub trait ReportWriter {
    fn write_header(&mut self, header: &[&str]) -> Result<()>;
    fn write_row(&mut self, row: &OutputRow) -> Result<()>;
    fn finish(&mut self) -> Result<()>;
    fn destination(&self) -> &Path;
}
