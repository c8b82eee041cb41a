use std::fmt;

use serde_json::Value;

/// Column labels of the report, in output order.
pub const FIELD_SCHEMA: [&str; 14] = [
    "Вид объекта недвижимости",
    "Вид земельного участка",
    "Дата присвоения",
    "Кадастровый номер",
    "Кадастровый квартал",
    "Адрес",
    "Площадь уточненная",
    "Площадь декларированная",
    "Площадь",
    "Статус",
    "Категория земель",
    "Вид разрешенного использования",
    "Форма собственности",
    "Кадастровая стоимость",
];

pub const FIELD_COUNT: usize = FIELD_SCHEMA.len();

/// Position of the cadastral number column in [`FIELD_SCHEMA`].
pub const CADASTRAL_NUMBER_FIELD: usize = 3;

pub const PLACEHOLDER: &str = "-";
pub const ERROR_SENTINEL: &str = "Error";

/// A cadastral number as found in the input, e.g. `77:01:0001001:23`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the registry lookup produced for one identifier.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupResult {
    /// Decoded JSON body of the registry response
    Found(Value),
    /// The registry answered but had nothing to say
    Empty,
    /// Transport or protocol failure, with a human readable reason
    Failed(String),
}

/// How a report row came to be, used for the run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Record,
    Placeholder,
    Error,
}

/// One report line: exactly one cell per [`FIELD_SCHEMA`] entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRow {
    pub kind: RowKind,
    pub cells: [String; FIELD_COUNT],
}

impl OutputRow {
    pub fn filled(kind: RowKind, value: &str) -> Self {
        Self {
            kind,
            cells: std::array::from_fn(|_| value.to_string()),
        }
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }
}

/// Text content handed over by a [`crate::ports::TextSource`].
#[derive(Debug, Clone)]
pub struct SourceText {
    /// File or archive member name, for messages
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub output_path: std::path::PathBuf,
    pub total: usize,
    pub records: usize,
    pub placeholders: usize,
    pub errors: usize,
}
