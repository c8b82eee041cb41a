//! Maps registry responses onto the fixed report schema.
//!
//! Each output field resolves through an ordered list of candidate keys; the
//! first one holding a non-empty value wins. The orderings reflect which keys
//! the registry actually fills for different object kinds.

use log::warn;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::{
    Identifier, LookupResult, OutputRow, RowKind, CADASTRAL_NUMBER_FIELD, ERROR_SENTINEL, FIELD_COUNT,
    PLACEHOLDER,
};

/// Literal the registry uses for "no data".
pub const NO_DATA_MARKER: &str = "н/д";

const CURRENCY_SUFFIX: &str = "руб.";

/// A response whose structure could not be traversed.
#[derive(Debug, Error)]
#[error("unexpected response shape: {0}")]
pub struct MalformedResponse(String);

type Object = Map<String, Value>;

/// Produces the report row for one identifier. Never fails: misses become a
/// placeholder row and malformed responses an all-`Error` row.
pub fn normalize(identifier: &Identifier, result: &LookupResult) -> OutputRow {
    let row = match result {
        LookupResult::Found(value) => match map_response(identifier, value) {
            Ok(row) => row,
            Err(e) => {
                warn!("Failed to process response for {}: {}", identifier, e);
                OutputRow::filled(RowKind::Error, ERROR_SENTINEL)
            }
        },
        LookupResult::Empty | LookupResult::Failed(_) => placeholder_row(identifier),
    };
    cleanse_row(row)
}

/// Row for "no record found": dashes everywhere except the cadastral number.
pub fn placeholder_row(identifier: &Identifier) -> OutputRow {
    let mut row = OutputRow::filled(RowKind::Placeholder, PLACEHOLDER);
    row.cells[CADASTRAL_NUMBER_FIELD] = identifier.to_string();
    row
}

/// Replaces empty cells and the registry's "no data" marker with a dash.
pub fn cleanse_value(value: &str) -> String {
    if value.is_empty() || value == NO_DATA_MARKER {
        PLACEHOLDER.to_string()
    } else {
        value.to_string()
    }
}

pub fn cleanse_row(mut row: OutputRow) -> OutputRow {
    for cell in row.cells.iter_mut() {
        *cell = cleanse_value(cell);
    }
    row
}

/// Renders a JSON value as a cell, or `None` when it counts as empty.
fn render(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some("True".to_string()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) if items.is_empty() => None,
        Value::Object(map) if map.is_empty() => None,
        other => Some(other.to_string()),
    }
}

fn first_present<'a>(candidates: impl IntoIterator<Item = Option<&'a Value>>) -> Option<String> {
    candidates.into_iter().flatten().find_map(render)
}

/// Nested object under `key`. Absent or null is `None`; any other non-object is malformed.
fn child_object<'a>(parent: &'a Object, key: &str) -> Result<Option<&'a Object>, MalformedResponse> {
    match parent.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(MalformedResponse(format!("'{key}' is not an object"))),
    }
}

/// The first "meta" entry's category name, if any.
fn meta_category(root: &Object) -> Result<Option<&Value>, MalformedResponse> {
    let entries = match root.get("meta") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(entries)) => entries,
        Some(_) => return Err(MalformedResponse("'meta' is not a list".to_string())),
    };
    match entries.first() {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(entry)) => Ok(entry.get("categoryName")),
        Some(_) => Err(MalformedResponse("'meta' entry is not an object".to_string())),
    }
}

fn map_response(identifier: &Identifier, value: &Value) -> Result<OutputRow, MalformedResponse> {
    let root = value
        .as_object()
        .ok_or_else(|| MalformedResponse("response is not an object".to_string()))?;

    if root.contains_key("error") {
        return Ok(placeholder_row(identifier));
    }
    let Some(data) = child_object(root, "data")? else {
        return Ok(placeholder_row(identifier));
    };
    let features = match data.get("features") {
        None | Some(Value::Null) => return Ok(placeholder_row(identifier)),
        Some(Value::Array(features)) => features,
        Some(_) => return Err(MalformedResponse("'features' is not a list".to_string())),
    };
    let Some(feature) = features.first() else {
        return Ok(placeholder_row(identifier));
    };
    let feature = feature
        .as_object()
        .ok_or_else(|| MalformedResponse("feature is not an object".to_string()))?;

    let props = child_object(feature, "properties")?;
    let opt = match props {
        Some(props) => child_object(props, "options")?,
        None => None,
    };
    let meta = meta_category(root)?;

    let opt_key = |key: &str| opt.and_then(|o| o.get(key));
    let prop_key = |key: &str| props.and_then(|p| p.get(key));

    let resolved: [Option<String>; FIELD_COUNT] = [
        first_present([opt_key("land_record_type"), meta, prop_key("categoryName")]),
        first_present([opt_key("land_record_subtype")]),
        first_present([opt_key("land_record_reg_date")]),
        first_present([opt_key("cad_num"), root.get("kad_number")])
            .or_else(|| Some(identifier.to_string())),
        first_present([opt_key("quarter_cad_number"), opt_key("kvartal")]),
        first_present([opt_key("readable_address"), prop_key("address")]),
        first_present([opt_key("specified_area")]),
        first_present([opt_key("declared_area")]),
        first_present([opt_key("area_value"), opt_key("specified_area")]),
        first_present([opt_key("status"), opt_key("state_cd")]),
        first_present([opt_key("land_record_category_type"), opt_key("category_code")]),
        first_present([opt_key("permitted_use_established_by_document"), opt_key("util_code")]),
        first_present([opt_key("ownership_type"), opt_key("right_form")]),
        first_present([opt_key("cost_value")]).map(|cost| format!("{cost} {CURRENCY_SUFFIX}")),
    ];

    Ok(OutputRow {
        kind: RowKind::Record,
        cells: resolved.map(|cell| cell.unwrap_or_else(|| PLACEHOLDER.to_string())),
    })
}
