//! Mention scanner: which of a character's formulae appear in a line
//!
//! Matching is plain substring containment on the lower-cased line. A short
//! pattern can therefore hit inside a longer, unrelated word form.

use super::PatternIndex;
use crate::models::{FormulaRecord, Mention};

/// All formulae of the mention's character that occur in its line, in index
/// order. Characters without an index entry yield an empty list.
pub fn detect_formulae<'a>(mention: &Mention, index: &'a PatternIndex) -> Vec<&'a FormulaRecord> {
    match index.patterns_for(&mention.character) {
        Some(patterns) => scan_line(&mention.line.to_lowercase(), patterns),
        None => Vec::new(),
    }
}

/// Scan an already lower-cased line against a pattern list
pub fn scan_line<'a>(line_lower: &str, patterns: &'a [FormulaRecord]) -> Vec<&'a FormulaRecord> {
    patterns
        .iter()
        .filter(|record| !record.pattern.is_empty() && line_lower.contains(record.pattern.as_str()))
        .collect()
}
