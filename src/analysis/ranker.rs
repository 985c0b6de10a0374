//! Deviation ranker: filter, sort and group scored mentions
//!
//! Works over anything implementing [`Ranked`], so the same ranking runs on
//! fresh [`MentionAnalysis`] values and on records reloaded from a saved
//! analysis file.

use crate::models::{Classification, FormulaRecord, MentionAnalysis, Surprisal};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;

/// Default cut-off: 3 bits, i.e. probability below 1/8
pub const DEFAULT_HIGH_SURPRISAL_THRESHOLD: f64 = 3.0;

/// Default number of most surprising entries kept per character
pub const DEFAULT_PER_CHARACTER_TOP: usize = 3;

/// A scored mention that can be ranked and reported
pub trait Ranked {
    fn character(&self) -> &str;
    fn line_num(&self) -> u32;
    fn line(&self) -> &str;
    fn classification(&self) -> Classification;
    fn probability(&self) -> f64;
    fn surprisal(&self) -> Surprisal;
    fn is_deviation(&self) -> bool;

    /// Display text of the primary formula, if any
    fn primary_formula(&self) -> Option<&str> {
        None
    }

    /// Display text of every detected formula
    fn detected_formulae(&self) -> Vec<&str> {
        Vec::new()
    }

    /// Full record of the primary formula, when still available
    fn primary_record(&self) -> Option<&FormulaRecord> {
        None
    }

    fn context(&self) -> Option<&str> {
        None
    }
}

impl Ranked for MentionAnalysis {
    fn character(&self) -> &str {
        &self.mention.character
    }

    fn line_num(&self) -> u32 {
        self.mention.line_num
    }

    fn line(&self) -> &str {
        &self.mention.line
    }

    fn classification(&self) -> Classification {
        self.classification
    }

    fn probability(&self) -> f64 {
        self.probability
    }

    fn surprisal(&self) -> Surprisal {
        self.surprisal
    }

    fn is_deviation(&self) -> bool {
        self.is_deviation
    }

    fn primary_formula(&self) -> Option<&str> {
        self.primary_formula.as_ref().map(|f| f.original.as_str())
    }

    fn detected_formulae(&self) -> Vec<&str> {
        self.detected_formulae.iter().map(|f| f.original.as_str()).collect()
    }

    fn primary_record(&self) -> Option<&FormulaRecord> {
        self.primary_formula.as_ref()
    }

    fn context(&self) -> Option<&str> {
        self.mention.context.as_deref()
    }
}

/// Knobs for [`rank`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankOptions {
    /// Entries must exceed this many bits to be listed as high surprisal
    pub threshold: f64,
    pub per_character_top: usize,
    /// Only list entries flagged as deviations
    pub deviations_only: bool,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_HIGH_SURPRISAL_THRESHOLD,
            per_character_top: DEFAULT_PER_CHARACTER_TOP,
            deviations_only: false,
        }
    }
}

/// Aggregate counts over all analyzed mentions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeviationSummary {
    pub total: usize,
    pub formulaic: usize,
    pub bare: usize,
    pub deviations: usize,
}

impl DeviationSummary {
    pub fn from_analyses<T: Ranked>(items: &[T]) -> Self {
        items.iter().fold(Self::default(), |mut summary, item| {
            summary.total += 1;
            match item.classification() {
                Classification::Formulaic => summary.formulaic += 1,
                Classification::BareMention => summary.bare += 1,
            }
            if item.is_deviation() {
                summary.deviations += 1;
            }
            summary
        })
    }

    /// Share of the total as a percentage (0 when nothing was analyzed)
    pub fn percent(&self, count: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 * 100.0 / self.total as f64
        }
    }
}

/// Per-character slice of the ranking
#[derive(Debug)]
pub struct CharacterBreakdown<'a, T> {
    pub character: &'a str,
    pub total: usize,
    pub deviations: usize,
    /// Highest surprisal first, at most `per_character_top` entries
    pub most_surprising: Vec<&'a T>,
}

impl<T> CharacterBreakdown<'_, T> {
    pub fn deviation_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.deviations as f64 * 100.0 / self.total as f64
        }
    }
}

/// Everything the reporters need
#[derive(Debug)]
pub struct DeviationRanking<'a, T> {
    pub threshold: f64,
    pub high_surprisal: Vec<&'a T>,
    pub summary: DeviationSummary,
    pub characters: Vec<CharacterBreakdown<'a, T>>,
}

impl<T> DeviationRanking<'_, T> {
    /// Reorder the per-character breakdown to follow `order`.
    ///
    /// Characters missing from `order` go last, in their current order.
    pub fn order_characters<'o>(&mut self, order: impl IntoIterator<Item = &'o str>) {
        let mut position: HashMap<&str, usize> = HashMap::new();
        for (i, name) in order.into_iter().enumerate() {
            position.entry(name).or_insert(i);
        }
        self.characters
            .sort_by_key(|c| position.get(c.character).copied().unwrap_or(usize::MAX));
    }
}

/// Sort by surprisal, highest first. Stable, so ties keep input order.
fn sort_descending<T: Ranked>(items: &mut [&T]) {
    items.sort_by(|a, b| b.surprisal().total_cmp(&a.surprisal()));
}

/// Entries strictly above `threshold` bits, most surprising first
pub fn high_surprisal<T: Ranked>(items: &[T], threshold: f64) -> Vec<&T> {
    let mut selected: Vec<&T> = items.iter().filter(|a| a.surprisal().exceeds(threshold)).collect();
    sort_descending(&mut selected);
    selected
}

/// Group by character in first-appearance order and keep each character's top entries
pub fn by_character<T: Ranked>(items: &[T], top_n: usize) -> Vec<CharacterBreakdown<'_, T>> {
    let groups = items.iter().fold(IndexMap::<&str, Vec<&T>>::new(), |mut acc, item| {
        acc.entry(item.character()).or_default().push(item);
        acc
    });

    groups
        .into_iter()
        .map(|(character, mut entries)| {
            let total = entries.len();
            let deviations = entries.iter().filter(|e| e.is_deviation()).count();
            sort_descending(&mut entries);
            entries.truncate(top_n);
            CharacterBreakdown {
                character,
                total,
                deviations,
                most_surprising: entries,
            }
        })
        .collect()
}

/// Build the full ranking in one pass over the inputs
pub fn rank<'a, T: Ranked>(items: &'a [T], options: &RankOptions) -> DeviationRanking<'a, T> {
    let mut high = high_surprisal(items, options.threshold);
    if options.deviations_only {
        high.retain(|a| a.is_deviation());
    }

    DeviationRanking {
        threshold: options.threshold,
        high_surprisal: high,
        summary: DeviationSummary::from_analyses(items),
        characters: by_character(items, options.per_character_top),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Scored {
        character: &'static str,
        line_num: u32,
        surprisal: Surprisal,
        deviation: bool,
        classification: Classification,
    }

    impl Ranked for Scored {
        fn character(&self) -> &str {
            self.character
        }
        fn line_num(&self) -> u32 {
            self.line_num
        }
        fn line(&self) -> &str {
            ""
        }
        fn classification(&self) -> Classification {
            self.classification
        }
        fn probability(&self) -> f64 {
            match self.surprisal {
                Surprisal::Finite(bits) => 2f64.powf(-bits),
                Surprisal::Infinite => 0.0,
            }
        }
        fn surprisal(&self) -> Surprisal {
            self.surprisal
        }
        fn is_deviation(&self) -> bool {
            self.deviation
        }
    }

    fn scored(character: &'static str, line_num: u32, bits: Option<f64>, deviation: bool) -> Scored {
        Scored {
            character,
            line_num,
            surprisal: bits.map_or(Surprisal::Infinite, Surprisal::Finite),
            deviation,
            classification: if deviation {
                Classification::BareMention
            } else {
                Classification::Formulaic
            },
        }
    }

    #[test]
    fn test_threshold_is_exclusive_and_sorted_descending() {
        let items = vec![
            scored("Zeus", 1, Some(5.0), false),
            scored("Zeus", 2, Some(3.0), false),
            scored("Zeus", 3, Some(3.0), false),
            scored("Zeus", 4, Some(7.0), false),
        ];
        let high = high_surprisal(&items, 3.0);
        let bits: Vec<f64> = high.iter().map(|a| a.surprisal.bits()).collect();
        assert_eq!(bits, vec![7.0, 5.0]);
    }

    #[test]
    fn test_ties_keep_input_order_and_infinity_leads() {
        let items = vec![
            scored("Hector", 10, Some(4.0), false),
            scored("Zeus", 20, None, true),
            scored("Achilles", 30, Some(4.0), false),
        ];
        let lines: Vec<u32> = high_surprisal(&items, 3.0).iter().map(|a| a.line_num).collect();
        assert_eq!(lines, vec![20, 10, 30]);
    }

    #[test]
    fn test_summary_counts() {
        let items = vec![
            scored("Zeus", 1, Some(1.0), false),
            scored("Zeus", 2, Some(2.3), true),
            scored("Hector", 3, Some(0.4), false),
            scored("Hector", 4, None, true),
        ];
        let summary = DeviationSummary::from_analyses(&items);
        assert_eq!(
            summary,
            DeviationSummary {
                total: 4,
                formulaic: 2,
                bare: 2,
                deviations: 2
            }
        );
        assert_eq!(summary.formulaic + summary.bare, summary.total);
        assert!((summary.percent(summary.deviations) - 50.0).abs() < 1e-12);
        assert_eq!(DeviationSummary::default().percent(0), 0.0);
    }

    #[test]
    fn test_by_character_keeps_top_n() {
        let items = vec![
            scored("Zeus", 1, Some(1.0), false),
            scored("Zeus", 2, Some(6.0), true),
            scored("Achilles", 3, Some(0.7), false),
            scored("Zeus", 4, Some(2.0), false),
            scored("Zeus", 5, Some(4.0), true),
        ];
        let groups = by_character(&items, 3);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].character, "Achilles");
        assert_eq!(groups[1].total, 1);

        let zeus = &groups[0];
        assert_eq!(zeus.total, 4);
        assert_eq!(zeus.deviations, 2);
        assert!((zeus.deviation_rate() - 50.0).abs() < 1e-12);
        let lines: Vec<u32> = zeus.most_surprising.iter().map(|a| a.line_num).collect();
        assert_eq!(lines, vec![2, 5, 4]);
    }

    #[test]
    fn test_breakdown_follows_database_order() {
        let items = vec![
            scored("Achilles", 1, Some(0.7), false),
            scored("Apollo", 2, Some(1.0), false),
            scored("Zeus", 3, Some(6.0), true),
            scored("Hector", 4, Some(2.0), false),
        ];
        let mut ranking = rank(&items, &RankOptions::default());
        let names: Vec<&str> = ranking.characters.iter().map(|c| c.character).collect();
        assert_eq!(names, vec!["Achilles", "Apollo", "Zeus", "Hector"]);

        // Database lists Zeus first; Apollo is not in it
        ranking.order_characters(["Zeus", "Nestor", "Achilles", "Hector"]);
        let names: Vec<&str> = ranking.characters.iter().map(|c| c.character).collect();
        assert_eq!(names, vec!["Zeus", "Achilles", "Hector", "Apollo"]);
    }

    #[test]
    fn test_rank_deviations_only() {
        let items = vec![
            scored("Zeus", 1, Some(5.0), false),
            scored("Zeus", 2, Some(4.0), true),
        ];
        let options = RankOptions {
            deviations_only: true,
            ..RankOptions::default()
        };
        let ranking = rank(&items, &options);
        assert_eq!(ranking.high_surprisal.len(), 1);
        assert_eq!(ranking.high_surprisal[0].line_num, 2);
        // Summary still covers every input
        assert_eq!(ranking.summary.total, 2);
        assert_eq!(ranking.threshold, DEFAULT_HIGH_SURPRISAL_THRESHOLD);
    }

    #[test]
    fn test_rank_does_not_reorder_input() {
        let items = vec![
            scored("Zeus", 1, Some(3.5), false),
            scored("Zeus", 2, Some(9.0), false),
        ];
        let _ = rank(&items, &RankOptions::default());
        assert_eq!(items[0].line_num, 1);
        assert_eq!(items[1].line_num, 2);
    }
}
