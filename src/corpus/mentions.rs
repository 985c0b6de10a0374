//! Mention list loader
//!
//! Accepts either a bare JSON list of mentions or the line extractor's
//! full output, which nests the list under `all_mentions`.

use super::{read_json, Strictness};
use crate::error::{FormulaicError, RecordKind, Result};
use crate::models::Mention;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// Load mentions from a JSON file
pub fn load_mentions(path: &Path, strictness: Strictness) -> Result<Vec<Mention>> {
    let value = read_json(path)?;
    let mentions = parse_mentions(&value, strictness)?;
    debug!("Loaded {} mentions from {}", mentions.len(), path.display());
    Ok(mentions)
}

/// Extract mentions from an already-parsed JSON document
pub fn parse_mentions(value: &Value, strictness: Strictness) -> Result<Vec<Mention>> {
    let (items, label) = match value {
        Value::Array(items) => (items, "mentions"),
        Value::Object(obj) => match obj.get("all_mentions").and_then(Value::as_array) {
            Some(items) => (items, "all_mentions"),
            None => return Err(root_error()),
        },
        _ => return Err(root_error()),
    };

    let mut mentions = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match Mention::deserialize(item) {
            Ok(mention) => mentions.push(mention),
            Err(e) => strictness.handle(FormulaicError::MalformedRecord {
                kind: RecordKind::Mention,
                location: format!("{label}[{i}]"),
                reason: e.to_string(),
            })?,
        }
    }
    Ok(mentions)
}

fn root_error() -> FormulaicError {
    FormulaicError::MalformedRecord {
        kind: RecordKind::Mention,
        location: "<root>".into(),
        reason: "expected a list of mentions or an object with `all_mentions`".into(),
    }
}
