//! Per-character formula pattern index

use crate::corpus::FormulaDatabase;
use crate::models::{FormulaRecord, FormulaType};
use indexmap::IndexMap;

/// Searchable formula list for each character in the database.
///
/// Characters and their records keep the database file order. That order is
/// what breaks ties when two detected formulae share a corpus frequency.
#[derive(Debug, Clone, Default)]
pub struct PatternIndex {
    by_character: IndexMap<String, Vec<FormulaRecord>>,
}

impl PatternIndex {
    /// Flatten the database into lower-cased patterns. Never fails.
    pub fn build(database: &FormulaDatabase) -> Self {
        let by_character = database
            .iter()
            .map(|(character, entry)| {
                let records = entry
                    .formulae_by_type
                    .iter()
                    .flat_map(|(tag, formulae)| {
                        let formula_type = FormulaType::from_tag(tag);
                        formulae.iter().map(move |f| FormulaRecord {
                            pattern: f.pattern.to_lowercase(),
                            original: f.pattern.clone(),
                            formula_type,
                            position: f.position,
                            frequency: f.frequency,
                            semantic_category: f.semantic_category.clone(),
                        })
                    })
                    .collect();
                (character.to_string(), records)
            })
            .collect();

        Self { by_character }
    }

    /// Formulae for a character, or `None` if the character is not indexed
    pub fn patterns_for(&self, character: &str) -> Option<&[FormulaRecord]> {
        self.by_character.get(character).map(Vec::as_slice)
    }

    pub fn contains(&self, character: &str) -> bool {
        self.by_character.contains_key(character)
    }

    /// Indexed characters in database order
    pub fn characters(&self) -> impl Iterator<Item = &str> {
        self.by_character.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_character.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_character.is_empty()
    }

    pub fn total_patterns(&self) -> usize {
        self.by_character.values().map(Vec::len).sum()
    }
}
