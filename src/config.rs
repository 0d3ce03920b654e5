use std::collections::HashSet;
use std::str::FromStr;

use crate::errors::*;

/// How much of the turn annotation ends up in the target string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationLevel {
    /// Dialogue state only, emitted at user turns.
    Dst,
    /// State plus active intent and requested slots, emitted at user turns.
    DstIntent,
    /// State, intent, delexicalized actions and the system response,
    /// emitted at system turns.
    DstIntentAct,
}

impl FromStr for GenerationLevel {
    type Err = ::failure::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dst" => Ok(GenerationLevel::Dst),
            "dst_intent" => Ok(GenerationLevel::DstIntent),
            "dst_intent_act" => Ok(GenerationLevel::DstIntentAct),
            _ => Err(SgdTextError::InvalidMode("generation level", s.to_string()).into()),
        }
    }
}

/// What stands in for a schema item in the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    /// The natural language description from the schema.
    FullDesc,
    /// The domain-qualified item name.
    ItemName,
    /// A random permutation of the item name's characters, for experiments
    /// that hide semantics from the model.
    RandName,
}

impl FromStr for DataFormat {
    type Err = ::failure::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "full_desc" => Ok(DataFormat::FullDesc),
            "item_name" => Ok(DataFormat::ItemName),
            "rand_name" => Ok(DataFormat::RandName),
            _ => Err(SgdTextError::InvalidMode("data format", s.to_string()).into()),
        }
    }
}

/// Multiple-choice prompting for categorical slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultipleChoiceFormat {
    /// No enumeration; categorical values are spelled out in the target.
    None,
    /// Options rendered as `a) value b) value`.
    A,
    /// Options rendered as `0a) value 0b) value`, carrying the slot id.
    OneA,
}

impl MultipleChoiceFormat {
    pub fn enabled(&self) -> bool {
        *self != MultipleChoiceFormat::None
    }
}

impl FromStr for MultipleChoiceFormat {
    type Err = ::failure::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(MultipleChoiceFormat::None),
            "a" => Ok(MultipleChoiceFormat::A),
            "1a" => Ok(MultipleChoiceFormat::OneA),
            _ => Err(SgdTextError::InvalidMode("multiple choice format", s.to_string()).into()),
        }
    }
}

/// Fully resolved generation configuration, threaded explicitly through the
/// linearizer and decoder. All mode strings are checked before any dialogue
/// is processed.
#[derive(Debug, Clone)]
pub struct LinearizerConfig {
    /// Separates slot/intent ids from their descriptions or values.
    pub delimiter: String,
    pub level: GenerationLevel,
    pub data_format: DataFormat,
    pub lowercase: bool,
    /// Randomize schema item order and categorical value order per turn.
    pub randomize_items: bool,
    pub multiple_choice: MultipleChoiceFormat,
    /// Services excluded from generation, for zero-shot cross-domain setups.
    pub blocked_domains: HashSet<String>,
}

impl Default for LinearizerConfig {
    fn default() -> Self {
        Self {
            delimiter: "=".to_string(),
            level: GenerationLevel::Dst,
            data_format: DataFormat::FullDesc,
            lowercase: true,
            randomize_items: true,
            multiple_choice: MultipleChoiceFormat::None,
            blocked_domains: HashSet::new(),
        }
    }
}
