use cadastre_core::domain::OutputRow;
use cadastre_core::error::ParseError;
use cadastre_core::ports::{ReportWriter, Result};
use csv::{QuoteStyle, Terminator, Writer, WriterBuilder};
use log::debug;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// CSV report writer: semicolon separated, every field quoted, CRLF line
/// endings and a UTF-8 byte-order mark so spreadsheet tools pick the right
/// encoding.
///
/// Nothing is created on disk until the header is written.
pub struct CsvReportWriter {
    output_path: PathBuf,
    writer: Option<Writer<File>>,
}

impl CsvReportWriter {
    pub fn new(output_path: PathBuf) -> Self {
        Self {
            output_path,
            writer: None,
        }
    }

    fn report_error(&self, error: impl ToString) -> ParseError {
        ParseError::Report {
            path: self.output_path.clone(),
            reason: error.to_string(),
        }
    }

    fn open(&self) -> Result<Writer<File>> {
        if let Some(dir) = self.output_path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let mut file = File::create(&self.output_path).map_err(|e| self.report_error(e))?;
        file.write_all(UTF8_BOM).map_err(|e| self.report_error(e))?;

        Ok(WriterBuilder::new()
            .delimiter(b';')
            .quote_style(QuoteStyle::Always)
            .terminator(Terminator::CRLF)
            .from_writer(file))
    }

    fn active_writer(&mut self) -> Result<&mut Writer<File>> {
        let path = &self.output_path;
        self.writer.as_mut().ok_or_else(|| ParseError::Report {
            path: path.clone(),
            reason: "header must be written first".to_string(),
        })
    }
}

impl ReportWriter for CsvReportWriter {
    fn write_header(&mut self, header: &[&str]) -> Result<()> {
        debug!("Creating report {}", self.output_path.display());
        let mut writer = self.open()?;
        writer.write_record(header).map_err(|e| self.report_error(e))?;
        self.writer = Some(writer);
        Ok(())
    }

    fn write_row(&mut self, row: &OutputRow) -> Result<()> {
        let result = self.active_writer()?.write_record(row.cells());
        result.map_err(|e| self.report_error(e))
    }

    fn finish(&mut self) -> Result<()> {
        let result = self.active_writer()?.flush();
        result.map_err(|e| self.report_error(e))
    }

    fn destination(&self) -> &Path {
        &self.output_path
    }
}
