//! Expectation model: empirical formula rates per character
//!
//! For every indexed character, counts how many of its mentions contain
//! each formula and turns the counts into marginal probabilities over the
//! character's mention total. A mention with two formulae counts towards
//! both, so the rates are not a distribution and may sum past 1.

use super::scanner::scan_line;
use super::PatternIndex;
use crate::models::{FormulaRecord, Mention};
use indexmap::IndexMap;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Formula usage statistics for one character
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpectationProfile {
    pub total_mentions: u32,
    /// Mentions containing each pattern (only patterns seen at least once)
    pub formula_counts: BTreeMap<String, u32>,
    /// `formula_counts[p] / total_mentions`
    pub formula_probabilities: BTreeMap<String, f64>,
}

impl ExpectationProfile {
    /// Fold a character's mentions into a profile
    pub fn compute<'a>(
        patterns: &[FormulaRecord],
        mentions: impl IntoIterator<Item = &'a Mention>,
    ) -> Self {
        let mut total_mentions = 0u32;
        let mut formula_counts: BTreeMap<String, u32> = BTreeMap::new();

        for mention in mentions {
            total_mentions += 1;
            for record in scan_line(&mention.line.to_lowercase(), patterns) {
                *formula_counts.entry(record.pattern.clone()).or_insert(0) += 1;
            }
        }

        let formula_probabilities = formula_counts
            .iter()
            .map(|(pattern, &count)| (pattern.clone(), ratio(count, total_mentions)))
            .collect();

        Self {
            total_mentions,
            formula_counts,
            formula_probabilities,
        }
    }

    /// Rate of a pattern, 0 if it never occurred
    pub fn probability_of(&self, pattern: &str) -> f64 {
        self.formula_probabilities.get(pattern).copied().unwrap_or(0.0)
    }

    /// Sum of all formula occurrences (can exceed the mention total)
    pub fn formula_occurrences(&self) -> u32 {
        self.formula_counts.values().sum()
    }

    /// Mentions left over once formula occurrences are taken out, floored at 0
    pub fn bare_count(&self) -> u32 {
        self.total_mentions.saturating_sub(self.formula_occurrences())
    }

    /// Estimated rate of formula-less mentions, in [0, 1]
    pub fn bare_probability(&self) -> f64 {
        ratio(self.bare_count(), self.total_mentions)
    }
}

fn ratio(count: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

/// Expectation profiles for every character in the pattern index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpectationModel {
    profiles: IndexMap<String, ExpectationProfile>,
}

impl ExpectationModel {
    /// Compute all profiles. Characters are independent, so each profile
    /// is folded on its own rayon task and collected in index order.
    pub fn build(mentions: &[Mention], index: &PatternIndex) -> Self {
        let mut by_character: HashMap<&str, Vec<&Mention>> = HashMap::new();
        for mention in mentions {
            if index.contains(&mention.character) {
                by_character.entry(mention.character.as_str()).or_default().push(mention);
            }
        }

        let characters: Vec<&str> = index.characters().collect();
        let computed: Vec<(String, ExpectationProfile)> = characters
            .par_iter()
            .map(|&character| {
                let patterns = index.patterns_for(character).unwrap_or(&[]);
                let char_mentions = by_character.get(character).map(Vec::as_slice).unwrap_or(&[]);
                let profile = ExpectationProfile::compute(patterns, char_mentions.iter().copied());
                (character.to_string(), profile)
            })
            .collect();
        let profiles: IndexMap<String, ExpectationProfile> = computed.into_iter().collect();

        debug!("Computed expectation profiles for {} characters", profiles.len());
        Self { profiles }
    }

    pub fn profile(&self, character: &str) -> Option<&ExpectationProfile> {
        self.profiles.get(character)
    }

    /// Profiles in index (database) order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ExpectationProfile)> {
        self.profiles.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
