//! Core data models for formula analysis
//!
//! These models are shared by the loaders, the analysis pipeline and the
//! reporters. Everything here is immutable once constructed.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;

/// Placeholder written in place of infinite surprisal.
///
/// JSON has no infinity, so `+inf` is stored as this value and read back as
/// [`Surprisal::Infinite`]. A real surprisal this large would need a
/// probability near 2^-999, which no count ratio can produce.
pub const INFINITE_SURPRISAL_SENTINEL: f64 = 999.0;

/// Kind of formula, as grouped in the formula database
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FormulaType {
    Epithet,
    SpeechFormula,
    VerbPhrase,
    HalfLine,
    Patronymic,
    #[default]
    #[serde(other)]
    Other,
}

impl FormulaType {
    /// Map a `formulae_by_type` key to a type. Unknown tags become `Other`.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "epithet" => FormulaType::Epithet,
            "speech_formula" => FormulaType::SpeechFormula,
            "verb_phrase" => FormulaType::VerbPhrase,
            "half_line" => FormulaType::HalfLine,
            "patronymic" => FormulaType::Patronymic,
            _ => FormulaType::Other,
        }
    }
}

impl std::fmt::Display for FormulaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormulaType::Epithet => write!(f, "epithet"),
            FormulaType::SpeechFormula => write!(f, "speech_formula"),
            FormulaType::VerbPhrase => write!(f, "verb_phrase"),
            FormulaType::HalfLine => write!(f, "half_line"),
            FormulaType::Patronymic => write!(f, "patronymic"),
            FormulaType::Other => write!(f, "other"),
        }
    }
}

/// Where a formula sits relative to the character's name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Before,
    After,
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Position::Before => write!(f, "before"),
            Position::After => write!(f, "after"),
        }
    }
}

/// A confirmed formula ready for matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaRecord {
    /// Lower-cased text used for matching
    pub pattern: String,
    /// Text as it appears in the database, for display
    pub original: String,
    pub formula_type: FormulaType,
    pub position: Position,
    /// Frequency recorded when the formula was mined from the corpus
    pub frequency: u32,
    #[serde(default)]
    pub semantic_category: String,
}

/// A single character mention, as produced by the line extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    pub character: String,
    /// Inflected name form that triggered the mention
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub form: String,
    #[serde(deserialize_with = "deserialize_line_num")]
    pub line_num: u32,
    pub line: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub epithets: Vec<String>,
}

/// Line numbers come from the TEI `n` attribute, so they may be strings.
pub(crate) fn deserialize_line_num<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum LineNumber {
        Number(u32),
        Text(String),
    }

    match LineNumber::deserialize(deserializer)? {
        LineNumber::Number(n) => Ok(n),
        LineNumber::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("line_num '{s}' is not a line number"))),
    }
}

/// How a mention was classified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    BareMention,
    Formulaic,
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classification::BareMention => write!(f, "bare_mention"),
            Classification::Formulaic => write!(f, "formulaic"),
        }
    }
}

/// Surprisal in bits, with zero-probability events kept distinct
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Surprisal {
    Finite(f64),
    Infinite,
}

impl Surprisal {
    /// `-log2(p)`, or `Infinite` when `p` is zero.
    pub fn from_probability(probability: f64) -> Self {
        if probability > 0.0 {
            let bits = -probability.log2();
            // log2(1.0) negates to -0.0
            Surprisal::Finite(if bits == 0.0 { 0.0 } else { bits })
        } else {
            Surprisal::Infinite
        }
    }

    /// Interpret a stored value, treating the sentinel as infinite.
    pub fn from_sentinel(value: f64) -> Self {
        if value == INFINITE_SURPRISAL_SENTINEL || value.is_infinite() {
            Surprisal::Infinite
        } else {
            Surprisal::Finite(value)
        }
    }

    /// Value to write to storage formats without infinity
    pub fn to_sentinel(self) -> f64 {
        match self {
            Surprisal::Finite(bits) if bits.is_finite() => bits,
            _ => INFINITE_SURPRISAL_SENTINEL,
        }
    }

    pub fn bits(self) -> f64 {
        match self {
            Surprisal::Finite(bits) => bits,
            Surprisal::Infinite => f64::INFINITY,
        }
    }

    pub fn is_infinite(self) -> bool {
        matches!(self, Surprisal::Infinite)
    }

    /// Strictly greater than `threshold` bits
    pub fn exceeds(self, threshold: f64) -> bool {
        self.bits() > threshold
    }

    /// Total order: finite values by magnitude, infinity above all of them
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.bits().total_cmp(&other.bits())
    }
}

impl std::fmt::Display for Surprisal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Surprisal::Finite(bits) => write!(f, "{:.2}", bits),
            Surprisal::Infinite => write!(f, "inf"),
        }
    }
}

impl Serialize for Surprisal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Surprisal::Finite(bits) if bits.is_finite() => serializer.serialize_f64(*bits),
            _ => serializer.serialize_u32(INFINITE_SURPRISAL_SENTINEL as u32),
        }
    }
}

impl<'de> Deserialize<'de> for Surprisal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Ok(Surprisal::from_sentinel(value))
    }
}

/// Result of analyzing one mention
#[derive(Debug, Clone, PartialEq)]
pub struct MentionAnalysis {
    pub mention: Mention,
    pub detected_formulae: Vec<FormulaRecord>,
    /// Detected formula with the highest corpus frequency
    pub primary_formula: Option<FormulaRecord>,
    pub classification: Classification,
    pub probability: f64,
    pub surprisal: Surprisal,
    pub is_deviation: bool,
}

impl MentionAnalysis {
    pub fn bare(mention: Mention, probability: f64, is_deviation: bool) -> Self {
        Self {
            mention,
            detected_formulae: Vec::new(),
            primary_formula: None,
            classification: Classification::BareMention,
            probability,
            surprisal: Surprisal::from_probability(probability),
            is_deviation,
        }
    }

    pub fn formulaic(
        mention: Mention,
        detected_formulae: Vec<FormulaRecord>,
        primary_formula: FormulaRecord,
        probability: f64,
        is_deviation: bool,
    ) -> Self {
        Self {
            mention,
            detected_formulae,
            primary_formula: Some(primary_formula),
            classification: Classification::Formulaic,
            probability,
            surprisal: Surprisal::from_probability(probability),
            is_deviation,
        }
    }
}
