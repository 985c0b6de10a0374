//! Surprisal scorer: classify a mention and score how unexpected it is
//!
//! A bare mention is scored against the character's bare rate, a formulaic
//! mention against the rate of its primary formula. Both deviation
//! thresholds are exclusive: a rate equal to the threshold is expected.

use super::expectation::ExpectationModel;
use super::scanner::detect_formulae;
use super::PatternIndex;
use crate::models::{FormulaRecord, Mention, MentionAnalysis, Surprisal};
use tracing::debug;

/// A formulaic mention is a deviation below this primary-formula rate
pub const FORMULA_DEVIATION_THRESHOLD: f64 = 0.10;

/// A bare mention is a deviation below this bare rate
pub const BARE_DEVIATION_THRESHOLD: f64 = 0.30;

/// `-log2(p)` in bits, infinite at `p = 0`
pub fn surprisal(probability: f64) -> Surprisal {
    Surprisal::from_probability(probability)
}

/// Pick the detected formula with the highest corpus frequency.
///
/// Ties go to the formula that comes first in the character's index order,
/// which is the order `detected` arrives in from the scanner.
pub fn primary_formula<'a>(detected: &[&'a FormulaRecord]) -> Option<&'a FormulaRecord> {
    detected
        .iter()
        .copied()
        .reduce(|best, candidate| if candidate.frequency > best.frequency { candidate } else { best })
}

/// Scores mentions against a pattern index and its expectation model
pub struct SurprisalScorer<'a> {
    index: &'a PatternIndex,
    model: &'a ExpectationModel,
}

impl<'a> SurprisalScorer<'a> {
    pub fn new(index: &'a PatternIndex, model: &'a ExpectationModel) -> Self {
        Self { index, model }
    }

    /// Analyze one mention. Returns `None` for characters without a profile.
    pub fn analyze(&self, mention: &Mention) -> Option<MentionAnalysis> {
        let Some(profile) = self.model.profile(&mention.character) else {
            debug!(
                "Skipping line {}: no expectation profile for {}",
                mention.line_num, mention.character
            );
            return None;
        };

        let detected = detect_formulae(mention, self.index);

        let Some(primary) = primary_formula(&detected) else {
            let bare_probability = profile.bare_probability();
            return Some(MentionAnalysis::bare(
                mention.clone(),
                bare_probability,
                bare_probability < BARE_DEVIATION_THRESHOLD,
            ));
        };

        let probability = profile.probability_of(&primary.pattern);
        Some(MentionAnalysis::formulaic(
            mention.clone(),
            detected.iter().map(|r| (*r).clone()).collect(),
            primary.clone(),
            probability,
            probability < FORMULA_DEVIATION_THRESHOLD,
        ))
    }

    /// Analyze every mention, keeping input order and dropping skipped ones
    pub fn analyze_all(&self, mentions: &[Mention]) -> Vec<MentionAnalysis> {
        mentions.iter().filter_map(|m| self.analyze(m)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::expectation::ExpectationProfile;
    use crate::corpus::{CharacterEntry, FormulaDatabase, FormulaEntry, Strictness};
    use crate::models::{Classification, FormulaType, Position};

    fn formula(pattern: &str, frequency: u32) -> FormulaEntry {
        FormulaEntry {
            pattern: pattern.into(),
            frequency,
            position: Position::Before,
            semantic_category: String::new(),
            notes: String::new(),
        }
    }

    fn mention(character: &str, line: &str) -> Mention {
        Mention {
            character: character.into(),
            form: String::new(),
            line_num: 1,
            line: line.into(),
            context: None,
            epithets: vec![],
        }
    }

    fn record(pattern: &str, frequency: u32) -> FormulaRecord {
        FormulaRecord {
            pattern: pattern.into(),
            original: pattern.into(),
            formula_type: FormulaType::Epithet,
            position: Position::Before,
            frequency,
            semantic_category: String::new(),
        }
    }

    #[test]
    fn test_surprisal_reference_values() {
        assert_eq!(surprisal(1.0), Surprisal::Finite(0.0));
        assert_eq!(surprisal(0.5), Surprisal::Finite(1.0));
        assert_eq!(surprisal(0.125), Surprisal::Finite(3.0));
        assert_eq!(surprisal(0.0), Surprisal::Infinite);
        assert!((surprisal(0.1).bits() - 3.321928).abs() < 1e-6);
    }

    #[test]
    fn test_primary_formula_prefers_frequency_then_first() {
        let a = record("po/das w)ku/s", 30);
        let b = record("di=os", 10);
        let c = record("*phlhi+a/dew", 30);
        assert_eq!(primary_formula(&[&b, &a, &c]).unwrap().pattern, "po/das w)ku/s");
        assert_eq!(primary_formula(&[&c, &a]).unwrap().pattern, "*phlhi+a/dew");
        assert!(primary_formula(&[]).is_none());
    }

    #[test]
    fn test_frequency_tie_follows_database_order() {
        // Patronymic listed before epithet in the file, both at frequency 30
        let value = serde_json::json!({
            "Achilles": {
                "total_mentions": 2,
                "formulae_by_type": {
                    "patronymic": [{"pattern": "*Phlhi+a/dew", "frequency": 30,
                                    "position": "before", "semantic_category": "lineage"}],
                    "epithet": [{"pattern": "po/das w)ku/s", "frequency": 30,
                                 "position": "after", "semantic_category": "swiftness"}]
                },
                "total_confirmed_formulae": 2
            }
        });
        let db = FormulaDatabase::from_json(&value, Strictness::Strict).unwrap();
        let index = PatternIndex::build(&db);
        let mentions = vec![
            mention("Achilles", "*Phlhi+a/dew *)axilh=os po/das w)ku/s"),
            mention("Achilles", "*Phlhi+a/dew *)axilh=os"),
        ];
        let model = ExpectationModel::build(&mentions, &index);
        let scorer = SurprisalScorer::new(&index, &model);

        let analysis = scorer.analyze(&mentions[0]).unwrap();
        assert_eq!(analysis.detected_formulae.len(), 2);
        assert_eq!(analysis.primary_formula.as_ref().unwrap().pattern, "*phlhi+a/dew");
        assert_eq!(analysis.probability, 1.0);
        assert_eq!(analysis.surprisal, Surprisal::Finite(0.0));
        assert!(!analysis.is_deviation);
    }

    /// Zeus: 10 mentions, "di=os" in exactly one of them
    fn zeus_fixture() -> (PatternIndex, Vec<Mention>) {
        let mut db = FormulaDatabase::new();
        let mut zeus = CharacterEntry::default();
        zeus.formulae_by_type.insert(
            "epithet".into(),
            vec![formula("nefelhgere/ta", 20), formula("di=os", 5)],
        );
        db.insert("Zeus", zeus);

        let mut mentions = vec![mention("Zeus", "e)/klue di=os *zeu/s")];
        for _ in 0..8 {
            mentions.push(mention("Zeus", "prose/fh nefelhgere/ta *zeu/s"));
        }
        mentions.push(mention("Zeus", "*dio/s d' e)telei/eto boulh/"));
        (PatternIndex::build(&db), mentions)
    }

    #[test]
    fn test_formula_at_ten_percent_is_not_a_deviation() {
        let (index, mentions) = zeus_fixture();
        let model = ExpectationModel::build(&mentions, &index);
        let scorer = SurprisalScorer::new(&index, &model);

        let analysis = scorer.analyze(&mentions[0]).unwrap();
        assert_eq!(analysis.classification, Classification::Formulaic);
        assert!((analysis.probability - 0.1).abs() < 1e-12);
        assert!((analysis.surprisal.bits() - 3.3219).abs() < 1e-4);
        assert!(!analysis.is_deviation, "p = 0.1 sits on the boundary and must not deviate");
        assert_eq!(analysis.primary_formula.as_ref().unwrap().original, "di=os");
    }

    #[test]
    fn test_bare_mention_scored_against_bare_rate() {
        let (index, mentions) = zeus_fixture();
        let model = ExpectationModel::build(&mentions, &index);
        let scorer = SurprisalScorer::new(&index, &model);

        let analysis = scorer.analyze(&mentions[9]).unwrap();
        assert_eq!(analysis.classification, Classification::BareMention);
        assert!(analysis.detected_formulae.is_empty());
        assert!((analysis.probability - 0.1).abs() < 1e-12);
        assert!(analysis.is_deviation);
    }

    #[test]
    fn test_bare_probability_zero_is_infinite_deviation() {
        let mut db = FormulaDatabase::new();
        let mut hector = CharacterEntry::default();
        hector
            .formulae_by_type
            .insert("epithet".into(), vec![formula("koruqai/olos", 15)]);
        db.insert("Hector", hector);
        let index = PatternIndex::build(&db);

        let population: Vec<Mention> = (0..5)
            .map(|_| mention("Hector", "me/gas koruqai/olos *(/ektwr"))
            .collect();
        let model = ExpectationModel::build(&population, &index);
        assert_eq!(model.profile("Hector").unwrap().bare_probability(), 0.0);

        let scorer = SurprisalScorer::new(&index, &model);
        let analysis = scorer.analyze(&mention("Hector", "*(/ektwr d' ou) ti")).unwrap();
        assert_eq!(analysis.classification, Classification::BareMention);
        assert_eq!(analysis.probability, 0.0);
        assert_eq!(analysis.surprisal, Surprisal::Infinite);
        assert!(analysis.is_deviation);
    }

    /// Profile over `total` mentions where "kudos" occurs in `hits` of them
    fn profile_with(hits: u32, total: u32) -> ExpectationProfile {
        let patterns = vec![record("kudos", 1)];
        let mentions: Vec<Mention> = (0..total)
            .map(|i| mention("X", if i < hits { "kudos" } else { "xyz" }))
            .collect();
        ExpectationProfile::compute(&patterns, mentions.iter())
    }

    #[test]
    fn test_threshold_boundaries_are_strict() {
        // 3 of 10 bare: exactly 0.30 is not a deviation
        let at_bare = profile_with(7, 10);
        assert_eq!(at_bare.bare_probability(), 0.3);
        assert!(at_bare.bare_probability() >= BARE_DEVIATION_THRESHOLD);

        let below_bare = profile_with(7001, 10000);
        assert!(below_bare.bare_probability() < BARE_DEVIATION_THRESHOLD);

        let at_formula = profile_with(1000, 10000);
        assert_eq!(at_formula.probability_of("kudos"), 0.1);
        assert!(at_formula.probability_of("kudos") >= FORMULA_DEVIATION_THRESHOLD);

        let below_formula = profile_with(999, 10000);
        assert!(below_formula.probability_of("kudos") < FORMULA_DEVIATION_THRESHOLD);
    }

    #[test]
    fn test_character_without_profile_is_skipped() {
        let (index, mentions) = zeus_fixture();
        let model = ExpectationModel::build(&mentions, &index);
        let scorer = SurprisalScorer::new(&index, &model);
        assert!(scorer.analyze(&mention("Apollo", "e(khbo/los *a)po/llwn")).is_none());

        let mut all = mentions.clone();
        all.push(mention("Apollo", "e(khbo/los *a)po/llwn"));
        let analyses = scorer.analyze_all(&all);
        assert_eq!(analyses.len(), mentions.len());
    }

    #[test]
    fn test_every_analysis_has_exactly_one_classification() {
        let (index, mentions) = zeus_fixture();
        let model = ExpectationModel::build(&mentions, &index);
        let scorer = SurprisalScorer::new(&index, &model);
        for analysis in scorer.analyze_all(&mentions) {
            match analysis.classification {
                Classification::Formulaic => {
                    assert!(analysis.primary_formula.is_some());
                    assert!(!analysis.detected_formulae.is_empty());
                }
                Classification::BareMention => {
                    assert!(analysis.primary_formula.is_none());
                    assert!(analysis.detected_formulae.is_empty());
                }
            }
        }
    }
}
