//! Confirmed-formula database loader
//!
//! ```json
//! {
//!   "Zeus": {
//!     "total_mentions": 10,
//!     "formulae_by_type": {
//!       "epithet": [
//!         {"pattern": "nefelhgere/ta", "frequency": 20, "position": "after",
//!          "semantic_category": "character epithet", "notes": ""}
//!       ]
//!     },
//!     "total_confirmed_formulae": 1
//!   }
//! }
//! ```

use super::{read_json, Strictness};
use crate::error::{FormulaicError, RecordKind, Result};
use crate::models::Position;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};

/// One reviewed formula as stored in the database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaEntry {
    pub pattern: String,
    pub frequency: u32,
    pub position: Position,
    #[serde(default)]
    pub semantic_category: String,
    #[serde(default)]
    pub notes: String,
}

/// All confirmed formulae for one character
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterEntry {
    /// Mention count recorded at review time (informational only)
    #[serde(default)]
    pub total_mentions: u32,
    /// Formulae grouped by type tag, in file order
    #[serde(default)]
    pub formulae_by_type: IndexMap<String, Vec<FormulaEntry>>,
    #[serde(default)]
    pub total_confirmed_formulae: Option<u32>,
}

impl CharacterEntry {
    pub fn formula_count(&self) -> usize {
        self.formulae_by_type.values().map(Vec::len).sum()
    }
}

/// The confirmed-formula database, keyed by character in file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormulaDatabase {
    characters: IndexMap<String, CharacterEntry>,
}

impl FormulaDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, character: impl Into<String>, entry: CharacterEntry) {
        self.characters.insert(character.into(), entry);
    }

    pub fn get(&self, character: &str) -> Option<&CharacterEntry> {
        self.characters.get(character)
    }

    /// Characters in file order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CharacterEntry)> {
        self.characters.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    pub fn total_formulae(&self) -> usize {
        self.characters.values().map(CharacterEntry::formula_count).sum()
    }

    /// Build a database from an already-parsed JSON document
    pub fn from_json(value: &Value, strictness: Strictness) -> Result<Self> {
        let Some(root) = value.as_object() else {
            return Err(FormulaicError::MalformedRecord {
                kind: RecordKind::Character,
                location: "<root>".into(),
                reason: "expected an object keyed by character name".into(),
            });
        };

        let mut db = FormulaDatabase::new();
        for (name, entry) in root {
            if let Some(entry) = parse_character(name, entry, strictness)? {
                db.insert(name.clone(), entry);
            }
        }
        Ok(db)
    }
}

/// Load the formula database from a JSON file
pub fn load_formula_database(path: &Path, strictness: Strictness) -> Result<FormulaDatabase> {
    let value = read_json(path)?;
    let db = FormulaDatabase::from_json(&value, strictness)?;
    debug!(
        "Loaded {} characters with {} formulae from {}",
        db.len(),
        db.total_formulae(),
        path.display()
    );
    Ok(db)
}

fn parse_character(name: &str, value: &Value, strictness: Strictness) -> Result<Option<CharacterEntry>> {
    let malformed = |location: String, reason: &str| FormulaicError::MalformedRecord {
        kind: RecordKind::Character,
        location,
        reason: reason.to_string(),
    };

    let Some(obj) = value.as_object() else {
        strictness.handle(malformed(name.to_string(), "expected an object"))?;
        return Ok(None);
    };

    let Some(by_type) = obj.get("formulae_by_type").and_then(Value::as_object) else {
        strictness.handle(malformed(name.to_string(), "missing `formulae_by_type` object"))?;
        return Ok(None);
    };

    let mut formulae_by_type = IndexMap::new();
    for (tag, list) in by_type {
        let Some(items) = list.as_array() else {
            strictness.handle(malformed(
                format!("{name}.formulae_by_type.{tag}"),
                "expected a list of formulae",
            ))?;
            continue;
        };

        let mut formulae = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            match FormulaEntry::deserialize(item) {
                Ok(formula) => formulae.push(formula),
                Err(e) => strictness.handle(FormulaicError::MalformedRecord {
                    kind: RecordKind::Formula,
                    location: format!("{name}.formulae_by_type.{tag}[{i}]"),
                    reason: e.to_string(),
                })?,
            }
        }
        formulae_by_type.insert(tag.clone(), formulae);
    }

    let entry = CharacterEntry {
        total_mentions: obj
            .get("total_mentions")
            .and_then(Value::as_u64)
            .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
            .unwrap_or(0),
        formulae_by_type,
        total_confirmed_formulae: obj
            .get("total_confirmed_formulae")
            .and_then(Value::as_u64)
            .map(|n| u32::try_from(n).unwrap_or(u32::MAX)),
    };

    if let Some(expected) = entry.total_confirmed_formulae {
        let loaded = entry.formula_count();
        if loaded != expected as usize {
            warn!(
                "{}: total_confirmed_formulae is {} but {} formulae were loaded",
                name, expected, loaded
            );
        }
    }

    Ok(Some(entry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "Zeus": {
                "total_mentions": 10,
                "formulae_by_type": {
                    "epithet": [
                        {"pattern": "nefelhgere/ta", "frequency": 20, "position": "after",
                         "semantic_category": "character epithet", "notes": ""}
                    ],
                    "half_line": [
                        {"pattern": "path/r a)ndrw=n te qew=n te", "frequency": 8, "position": "after"}
                    ]
                },
                "total_confirmed_formulae": 2
            },
            "Hector": {
                "total_mentions": 4,
                "formulae_by_type": {
                    "epithet": [
                        {"pattern": "koruqai/olos", "position": "before"}
                    ]
                }
            }
        })
    }

    #[test]
    fn test_lenient_skips_broken_formula() {
        let db = FormulaDatabase::from_json(&sample(), Strictness::Lenient).unwrap();
        assert_eq!(db.len(), 2);
        assert_eq!(db.get("Zeus").unwrap().formula_count(), 2);
        // Hector's only formula lacks `frequency`, so the character survives empty
        let hector = db.get("Hector").unwrap();
        assert_eq!(hector.formula_count(), 0);
        assert_eq!(hector.total_mentions, 4);
    }

    #[test]
    fn test_strict_rejects_broken_formula() {
        let err = FormulaDatabase::from_json(&sample(), Strictness::Strict).unwrap_err();
        match err {
            FormulaicError::MalformedRecord { kind, location, reason } => {
                assert_eq!(kind, RecordKind::Formula);
                assert_eq!(location, "Hector.formulae_by_type.epithet[0]");
                assert!(reason.contains("frequency"), "reason: {reason}");
            }
            other => panic!("expected MalformedRecord, got {other:?}"),
        }
    }

    #[test]
    fn test_character_without_formulae_by_type() {
        let value = json!({"Apollo": {"total_mentions": 3}});
        let db = FormulaDatabase::from_json(&value, Strictness::Lenient).unwrap();
        assert!(db.is_empty());
        assert!(FormulaDatabase::from_json(&value, Strictness::Strict).is_err());
    }

    #[test]
    fn test_root_must_be_object() {
        let err = FormulaDatabase::from_json(&json!([1, 2]), Strictness::Lenient).unwrap_err();
        assert!(matches!(err, FormulaicError::MalformedRecord { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("formulae_database.json");
        std::fs::write(&path, sample().to_string()).unwrap();
        let db = load_formula_database(&path, Strictness::Lenient).unwrap();
        assert_eq!(db.total_formulae(), 2);
        let names: Vec<&str> = db.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Zeus", "Hector"]);
    }

    #[test]
    fn test_type_tags_keep_file_order() {
        let text = r#"{
            "Achilles": {
                "formulae_by_type": {
                    "patronymic": [{"pattern": "*Phlhi+a/dew", "frequency": 30, "position": "before"}],
                    "epithet": [{"pattern": "po/das w)ku/s", "frequency": 30, "position": "after"}]
                }
            }
        }"#;
        let value: Value = serde_json::from_str(text).unwrap();
        let db = FormulaDatabase::from_json(&value, Strictness::Strict).unwrap();
        let tags: Vec<&str> = db
            .get("Achilles")
            .unwrap()
            .formulae_by_type
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(tags, vec!["patronymic", "epithet"]);
    }
}
