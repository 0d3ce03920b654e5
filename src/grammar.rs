//! The one place where the linearized text format is written down.
//!
//! The linearizer renders with the marker tokens below; the decoder compiles
//! its parsing regexes from the same definitions, so every assumption the
//! decoder makes about encoder output is visible here.
//!
//! Format of a rendered example:
//!
//! ```text
//! 0=[slot0 desc] 1=[slot1 desc] 0a) value 0b) value ... i0=[intent0 desc] \
//! [user] utterance [system] utterance ... \t
//! [states] 0=[value] 1=[1b] ... [intents] i0 [req_slots] 2 3 ...
//! ```
//!
//! System turns additionally carry `[actions] act(0;1;) act(none;)` and a
//! `[response]`-prefixed system utterance, depending on the generation level.
//!
//! The `regex` crate has no lookaround, so "a value runs until the next
//! `id=` pair" is implemented by segmenting on match positions rather than
//! with a lookahead; see [`segment`].

use regex::Regex;

use crate::config::{LinearizerConfig, MultipleChoiceFormat};
use crate::errors::*;

pub const USER_TOK: &str = "[user]";
pub const SYSTEM_TOK: &str = "[system]";
pub const RESPONSE_TOK: &str = "[response]";
pub const STATES_TOK: &str = "[states]";
pub const INTENTS_TOK: &str = "[intents]";
pub const REQ_SLOTS_TOK: &str = "[req_slots]";
pub const ACTIONS_TOK: &str = "[actions]";

/// Rendered for predicted values that resolve to nothing known.
pub const UNKNOWN_VALUE: &str = "unknown";
/// Predicted value meaning "no assignment for this slot".
pub const NONE_VALUE: &str = "none";
/// Wildcard slot value, never converted to an option reference.
pub const DONTCARE_VALUE: &str = "dontcare";

/// Secondary identifiers for categorical values, in display order.
pub const OPTION_LETTERS: [char; 26] = [
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r',
    's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

/// Compiled parsing rules for one generation configuration.
pub struct PromptGrammar {
    /// `{id}{delim}` or `i{id}{delim}` at a token boundary; starts a schema
    /// item description in the prompt and a pair in a prediction.
    item_start: Regex,
    /// `{letter}) ` or `{id}{letter}) `; starts one enumerated option.
    option_start: Regex,
    /// A predicted option reference: optional digits followed by one letter.
    letter_ref: Regex,
    /// A predicted intent reference, `i{id}`.
    intent_ref: Regex,
}

impl PromptGrammar {
    pub fn new(config: &LinearizerConfig) -> Result<Self> {
        let delimiter = regex::escape(&config.delimiter);
        let item_start = Regex::new(&format!(r"(?:^|\s)(i?\d+){}", delimiter))?;
        let option_start = match config.multiple_choice {
            MultipleChoiceFormat::OneA => Regex::new(r"(?:^|\s)\d+([a-z])\) ")?,
            _ => Regex::new(r"(?:^|\s)([a-z])\) ")?,
        };
        let letter_ref = Regex::new(r"^(?:\d+)?([a-z])$")?;
        let intent_ref = Regex::new(r"i(\d+)")?;
        Ok(Self {
            item_start,
            option_start,
            letter_ref,
            intent_ref,
        })
    }

    /// Splits `text` into `(id token, body)` segments, one per rendered item
    /// or predicted pair. The body of a segment runs to the start of the
    /// next one, which is what the non-greedy capture in the original format
    /// description means.
    pub fn item_segments<'t>(&self, text: &'t str) -> Vec<(&'t str, &'t str)> {
        segment(&self.item_start, text)
    }

    /// Splits a slot item body into its description and `(letter, value)`
    /// option segments.
    pub fn option_segments<'t>(&self, body: &'t str) -> (&'t str, Vec<(&'t str, &'t str)>) {
        match self.option_start.find(body) {
            Some(first) => (&body[..first.start()], segment(&self.option_start, body)),
            None => (body, vec![]),
        }
    }

    /// The option letter referenced by a predicted categorical value, if the
    /// value has the shape of a reference at all.
    pub fn letter_reference<'t>(&self, value: &'t str) -> Option<&'t str> {
        self.letter_ref
            .captures(value)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// The first intent id referenced in a predicted intent section.
    pub fn intent_reference(&self, section: &str) -> Option<usize> {
        self.intent_ref
            .captures(section)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }
}

fn segment<'t>(start: &Regex, text: &'t str) -> Vec<(&'t str, &'t str)> {
    let starts: Vec<_> = start
        .captures_iter(text)
        .filter_map(|caps| {
            let token = caps.get(1)?;
            let whole = caps.get(0)?;
            Some((whole.range(), token.range()))
        })
        .collect();
    starts
        .iter()
        .enumerate()
        .map(|(i, (whole, token))| {
            let body_end = starts
                .get(i + 1)
                .map(|(next, _)| next.start)
                .unwrap_or_else(|| text.len());
            (&text[token.clone()], text[whole.end..body_end].trim())
        })
        .collect()
}
