use cadastre_core::domain::SourceText;
use cadastre_core::error::ParseError;
use cadastre_core::ports::{Result, TextSource};
use log::{debug, info};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Reads the input either straight from a CSV file or from the first CSV
/// member of a ZIP archive
pub struct FileTextSource {
    path: PathBuf,
}

impl FileTextSource {
    /// Creates a new FileTextSource for the given input path
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn is_archive(&self) -> bool {
        self.path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("zip"))
            .unwrap_or(false)
    }

    fn read_plain(&self) -> Result<SourceText> {
        let bytes = fs::read(&self.path)?;
        let name = display_name(&self.path);
        let content = decode_text(&name, bytes)?;
        Ok(SourceText { name, content })
    }

    /// Picks the first member, in archive order, whose name ends in `.csv`
    fn read_archive(&self) -> Result<SourceText> {
        let file = File::open(&self.path)?;
        let mut archive = ZipArchive::new(file).map_err(|e| self.archive_error(e))?;
        debug!("Archive {} has {} members", self.path.display(), archive.len());

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index).map_err(|e| self.archive_error(e))?;
            if !entry.is_file() || !entry.name().to_lowercase().ends_with(".csv") {
                continue;
            }

            let name = entry.name().to_string();
            info!("Using archive member {}", name);
            let mut bytes = Vec::new();
            entry.read_to_end(&mut bytes).map_err(|e| self.archive_error(e))?;
            let content = decode_text(&name, bytes)?;
            return Ok(SourceText { name, content });
        }

        Err(ParseError::NoCsvInArchive(self.path.clone()))
    }

    fn archive_error(&self, error: impl ToString) -> ParseError {
        ParseError::Archive {
            path: self.path.clone(),
            reason: error.to_string(),
        }
    }
}

impl TextSource for FileTextSource {
    fn read_text(&self) -> Result<SourceText> {
        if !self.path.is_file() {
            return Err(ParseError::InputNotFound(self.path.clone()));
        }

        if self.is_archive() {
            self.read_archive()
        } else {
            self.read_plain()
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Decodes UTF-8 text, dropping a leading byte-order mark
fn decode_text(name: &str, mut bytes: Vec<u8>) -> Result<String> {
    if bytes.starts_with(UTF8_BOM) {
        bytes.drain(..UTF8_BOM.len());
    }
    String::from_utf8(bytes).map_err(|_| ParseError::Encoding {
        name: name.to_string(),
    })
}
