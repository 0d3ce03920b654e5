use failure::{format_err, ResultExt};
use indexmap::IndexMap;
use log::{debug, warn};

use crate::config::{GenerationLevel, LinearizerConfig};
use crate::errors::*;
use crate::grammar::{
    PromptGrammar, ACTIONS_TOK, DONTCARE_VALUE, INTENTS_TOK, NONE_VALUE, REQ_SLOTS_TOK,
    STATES_TOK, SYSTEM_TOK, UNKNOWN_VALUE, USER_TOK,
};
use crate::models::{Dialogue, DialogueState};

/// Item and option maps reconstructed from one rendered prompt. This is all
/// the decoder ever knows about the schema: it never sees the schema files.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptItems {
    pub slots: IndexMap<usize, SlotItem>,
    pub intents: IndexMap<usize, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotItem {
    /// The rendered item text (slot name, description or obfuscated name,
    /// depending on the generation data format).
    pub text: String,
    /// Enumerated option letters and their values; empty for
    /// non-categorical slots or when multiple choice was off.
    pub options: IndexMap<String, String>,
}

/// One model prediction to decode, together with the prompt it was
/// generated from and the frame it belongs to.
#[derive(Debug, Clone)]
pub struct PredictionRecord {
    pub dialogue_id: String,
    pub turn_id: String,
    pub frame_id: String,
    pub prompt: String,
    pub prediction: String,
}

/// Structured state recovered from one prediction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedFrame {
    pub slot_values: IndexMap<String, Vec<String>>,
    pub active_intent: Option<String>,
}

/// Decodes predicted text back into slot-value assignments using the same
/// encoding rules as the linearizer, in reverse.
///
/// Malformed prompts are fatal (the encoder and decoder have gone out of
/// sync); malformed predictions never are, since model output is inherently
/// noisy. Unresolvable predicted values degrade to the `unknown` sentinel
/// with a logged warning.
pub struct PredictionDecoder<'a> {
    config: &'a LinearizerConfig,
    grammar: PromptGrammar,
}

impl<'a> PredictionDecoder<'a> {
    pub fn new(config: &'a LinearizerConfig) -> Result<Self> {
        let grammar = PromptGrammar::new(config)?;
        Ok(Self { config, grammar })
    }

    /// Rebuilds the id→item and letter→value maps from a rendered prompt.
    pub fn parse_prompt(&self, prompt: &str) -> Result<PromptItems> {
        let context_start = [USER_TOK, SYSTEM_TOK]
            .iter()
            .filter_map(|tok| prompt.find(tok))
            .min()
            .ok_or_else(|| {
                SgdTextError::MalformedPrompt("no dialogue context marker".to_string())
            })?;
        let description_section = &prompt[..context_start];

        let mut items = PromptItems {
            slots: IndexMap::new(),
            intents: IndexMap::new(),
        };
        for (token, body) in self.grammar.item_segments(description_section) {
            if let Some(id_digits) = token.strip_prefix('i') {
                let id: usize = id_digits.parse()?;
                items.intents.insert(id, body.to_string());
            } else {
                let id: usize = token.parse()?;
                let (text, options) = self.grammar.option_segments(body);
                items.slots.insert(
                    id,
                    SlotItem {
                        text: text.trim().to_string(),
                        options: options
                            .into_iter()
                            .map(|(letter, value)| (letter.to_string(), value.to_string()))
                            .collect(),
                    },
                );
            }
        }
        if items.slots.is_empty() {
            return Err(
                SgdTextError::MalformedPrompt("no item descriptions found".to_string()).into(),
            );
        }
        Ok(items)
    }

    /// Decodes one predicted string against its prompt.
    pub fn decode(&self, prompt: &str, prediction: &str) -> Result<DecodedFrame> {
        let items = self.parse_prompt(prompt)?;
        let mut decoded = DecodedFrame::default();

        match section(prediction, STATES_TOK, &[INTENTS_TOK, REQ_SLOTS_TOK, ACTIONS_TOK]) {
            Some(states_section) => {
                for (token, value) in self.grammar.item_segments(states_section) {
                    if token.starts_with('i') {
                        continue;
                    }
                    let id: usize = match token.parse() {
                        Ok(id) => id,
                        Err(_) => continue,
                    };
                    let item = match items.slots.get(&id) {
                        Some(item) => item,
                        None => {
                            warn!("Predicted state references unknown slot id {}", id);
                            continue;
                        }
                    };
                    if value.is_empty() || value == NONE_VALUE {
                        continue;
                    }
                    let resolved = self.normalize_value(item, value);
                    decoded
                        .slot_values
                        .insert(item.text.clone(), vec![resolved]);
                }
            }
            None => warn!("Prediction carries no {} section", STATES_TOK),
        }

        if self.config.level != GenerationLevel::Dst {
            if let Some(intent_section) =
                section(prediction, INTENTS_TOK, &[REQ_SLOTS_TOK, ACTIONS_TOK])
            {
                if let Some(id) = self.grammar.intent_reference(intent_section) {
                    match items.intents.get(&id) {
                        Some(text) => decoded.active_intent = Some(text.clone()),
                        None => warn!("Prediction references unknown intent id {}", id),
                    }
                }
            }
        }
        debug!(
            "Decoded {} slot values, intent: {:?}",
            decoded.slot_values.len(),
            decoded.active_intent
        );
        Ok(decoded)
    }

    /// Writes a decoded prediction into the matching frame of a structured
    /// dialogue, in place. Resolved values are stored as singleton lists;
    /// absent values are simply not written.
    pub fn apply_prediction(
        &self,
        dialogue: &mut Dialogue,
        record: &PredictionRecord,
    ) -> Result<()> {
        if dialogue.dialogue_id != record.dialogue_id {
            return Err(format_err!(
                "Prediction for dialogue '{}' applied to dialogue '{}'",
                record.dialogue_id,
                dialogue.dialogue_id
            ));
        }
        let decoded = self.decode(&record.prompt, &record.prediction)?;

        let dialogue_id = dialogue.dialogue_id.clone();
        let turn_index: usize = record
            .turn_id
            .parse::<usize>()
            .with_context(|_| format!("Invalid turn id '{}'", record.turn_id))?;
        let frame_index: usize = record
            .frame_id
            .parse::<usize>()
            .with_context(|_| format!("Invalid frame id '{}'", record.frame_id))?;
        let turn = dialogue.turns.get_mut(turn_index).ok_or_else(|| {
            SgdTextError::UnknownTurn(dialogue_id.clone(), record.turn_id.clone())
        })?;
        let frame = turn.frames.get_mut(frame_index).ok_or_else(|| {
            SgdTextError::UnknownFrame(dialogue_id, record.turn_id.clone(), record.frame_id.clone())
        })?;

        let service = frame.service.clone();
        let state = frame.state.get_or_insert_with(DialogueState::default);
        for (name, values) in decoded.slot_values {
            state.slot_values.insert(strip_domain(&name, &service), values);
        }
        if let Some(intent) = decoded.active_intent {
            state.active_intent = strip_domain(&intent, &service);
        }
        Ok(())
    }

    /// Resolves one predicted slot value. Never fails: predictions are
    /// untrusted, so anything unrecognized becomes the `unknown` sentinel.
    fn normalize_value(&self, item: &SlotItem, value: &str) -> String {
        if item.options.is_empty() || value == DONTCARE_VALUE {
            return value.to_string();
        }
        if let Some(letter) = self.grammar.letter_reference(value) {
            if let Some(resolved) = item.options.get(letter) {
                return resolved.clone();
            }
        }
        // Space-insensitive fallback covers near misses such as
        // "guest house" for the option "guesthouse".
        let squeezed = squeeze(value);
        for option in item.options.values() {
            if squeeze(option) == squeezed {
                return option.clone();
            }
        }
        warn!(
            "Predicted value '{}' for item '{}' matches no known option",
            value, item.text
        );
        UNKNOWN_VALUE.to_string()
    }
}

fn section<'t>(text: &'t str, start_tok: &str, end_toks: &[&str]) -> Option<&'t str> {
    let start = text.find(start_tok)? + start_tok.len();
    let rest = &text[start..];
    let end = end_toks
        .iter()
        .filter_map(|tok| rest.find(tok))
        .min()
        .unwrap_or_else(|| rest.len());
    Some(&rest[..end])
}

fn squeeze(value: &str) -> String {
    value.to_lowercase().replace(' ', "")
}

fn strip_domain(name: &str, service: &str) -> String {
    let prefix = format!("{}-", service.to_lowercase());
    if name.to_lowercase().starts_with(&prefix) {
        name[prefix.len()..].to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DataFormat, MultipleChoiceFormat};
    use crate::formatter::format_example;
    use crate::linearizer::TurnLinearizer;
    use crate::testutils::{test_config, train_dialogue, train_index};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn decode_config() -> LinearizerConfig {
        LinearizerConfig {
            data_format: DataFormat::ItemName,
            multiple_choice: MultipleChoiceFormat::OneA,
            level: GenerationLevel::DstIntent,
            ..test_config()
        }
    }

    fn first_example(config: &LinearizerConfig) -> crate::formatter::Example {
        let index = train_index();
        let mut rng = StdRng::seed_from_u64(0);
        let records = TurnLinearizer::new(&index, config)
            .process_dialogue(&train_dialogue(), &mut rng)
            .unwrap();
        format_example(config, &records[0]).unwrap()
    }

    #[test]
    fn test_parse_prompt_rebuilds_option_maps() {
        // Given
        let config = decode_config();
        let decoder = PredictionDecoder::new(&config).unwrap();
        let example = first_example(&config);

        // When
        let items = decoder.parse_prompt(&example.prompt).unwrap();

        // Then
        assert_eq!("train-departure", items.slots[&0].text);
        assert_eq!("cambridge", items.slots[&0].options["a"]);
        assert_eq!("leicester", items.slots[&0].options["b"]);
        assert_eq!("train-findtrain", items.intents[&0]);
        // The numeric categorical slot was reclassified and has no options.
        assert!(items.slots[&3].options.is_empty());
    }

    #[test]
    fn test_round_trip_of_generated_target() {
        // Given: the generated target itself fed back as a prediction.
        let config = decode_config();
        let decoder = PredictionDecoder::new(&config).unwrap();
        let example = first_example(&config);

        // When
        let decoded = decoder.decode(&example.prompt, &example.target).unwrap();

        // Then
        assert_eq!(
            vec!["cambridge".to_string()],
            decoded.slot_values["train-departure"]
        );
        assert_eq!(Some("train-findtrain".to_string()), decoded.active_intent);
    }

    #[test]
    fn test_round_trip_with_shuffled_items() {
        // Given: a prompt rendered with randomized item and option order.
        let config = LinearizerConfig {
            randomize_items: true,
            ..decode_config()
        };
        let index = train_index();
        let mut rng = StdRng::seed_from_u64(1234);
        let records = TurnLinearizer::new(&index, &config)
            .process_dialogue(&train_dialogue(), &mut rng)
            .unwrap();
        let decoder = PredictionDecoder::new(&config).unwrap();

        // When: decoding every user example against its own target.
        for record in records.iter().filter(|r| r.user_turn) {
            let example = format_example(&config, record).unwrap();
            let decoded = decoder.decode(&example.prompt, &example.target).unwrap();

            // Then: the departure value survives whatever ids and letters
            // the shuffle assigned.
            assert_eq!(
                vec!["cambridge".to_string()],
                decoded.slot_values["train-departure"]
            );
        }
    }

    #[test]
    fn test_round_trip_with_colon_delimiter() {
        // Given
        let config = LinearizerConfig {
            delimiter: ":".to_string(),
            ..decode_config()
        };
        let decoder = PredictionDecoder::new(&config).unwrap();
        let example = first_example(&config);
        assert!(example.target.starts_with("[states] 0:0a"));

        // When
        let decoded = decoder.decode(&example.prompt, &example.target).unwrap();

        // Then
        assert_eq!(
            vec!["cambridge".to_string()],
            decoded.slot_values["train-departure"]
        );
    }

    #[test]
    fn test_non_categorical_value_passes_unchanged() {
        // Given
        let config = decode_config();
        let decoder = PredictionDecoder::new(&config).unwrap();
        let example = first_example(&config);

        // When: the day slot (id 2) is non-categorical.
        let decoded = decoder
            .decode(&example.prompt, "[states] 2=8th [intents] [req_slots]")
            .unwrap();

        // Then
        assert_eq!(vec!["8th".to_string()], decoded.slot_values["train-day"]);
    }

    #[test]
    fn test_space_insensitive_fallback() {
        // Given a prompt enumerating "guesthouse" as an option.
        let config = LinearizerConfig {
            multiple_choice: MultipleChoiceFormat::OneA,
            level: GenerationLevel::Dst,
            ..test_config()
        };
        let decoder = PredictionDecoder::new(&config).unwrap();
        let prompt = "0=type of the place 0a) guesthouse 0b) hotel [user] any guest house will do";

        // When: the model spells the value with a space.
        let decoded = decoder.decode(prompt, "[states] 0=guest house").unwrap();

        // Then
        assert_eq!(
            vec!["guesthouse".to_string()],
            decoded.slot_values["type of the place"]
        );
    }

    #[test]
    fn test_unrecognized_value_degrades_to_unknown() {
        // Given
        let config = decode_config();
        let decoder = PredictionDecoder::new(&config).unwrap();
        let example = first_example(&config);

        // When
        let decoded = decoder
            .decode(&example.prompt, "[states] 0=london [intents] [req_slots]")
            .unwrap();

        // Then
        assert_eq!(
            vec![UNKNOWN_VALUE.to_string()],
            decoded.slot_values["train-departure"]
        );
    }

    #[test]
    fn test_none_and_unknown_ids_are_skipped() {
        // Given
        let config = decode_config();
        let decoder = PredictionDecoder::new(&config).unwrap();
        let example = first_example(&config);

        // When
        let decoded = decoder
            .decode(&example.prompt, "[states] 1=none 99=0a [intents] [req_slots]")
            .unwrap();

        // Then
        assert!(decoded.slot_values.is_empty());
    }

    #[test]
    fn test_malformed_prompt_is_fatal() {
        // Given
        let config = decode_config();
        let decoder = PredictionDecoder::new(&config).unwrap();

        // When: a prompt with no [user]/[system] marker at all.
        let result = decoder.decode("0=train-departure", "[states] 0=0a");

        // Then
        assert!(result.is_err());
    }

    #[test]
    fn test_apply_prediction_mutates_frame_state() {
        // Given
        let config = decode_config();
        let decoder = PredictionDecoder::new(&config).unwrap();
        let example = first_example(&config);
        let mut dialogue = train_dialogue();
        dialogue.turns[0].frames[0].state = None;
        let record = PredictionRecord {
            dialogue_id: example.dialogue_id.clone(),
            turn_id: example.turn_id.clone(),
            frame_id: example.frame_id.clone(),
            prompt: example.prompt.clone(),
            prediction: example.target.clone(),
        };

        // When
        decoder.apply_prediction(&mut dialogue, &record).unwrap();

        // Then: the qualified name was stripped back to the frame's own
        // slot name, and the value is a singleton list.
        let state = dialogue.turns[0].frames[0].state.as_ref().unwrap();
        assert_eq!(vec!["cambridge".to_string()], state.slot_values["departure"]);
        assert_eq!("findtrain", state.active_intent);
    }

    #[test]
    fn test_apply_prediction_checks_dialogue_identity() {
        // Given
        let config = decode_config();
        let decoder = PredictionDecoder::new(&config).unwrap();
        let example = first_example(&config);
        let mut dialogue = train_dialogue();
        let record = PredictionRecord {
            dialogue_id: "other-042".to_string(),
            turn_id: example.turn_id.clone(),
            frame_id: example.frame_id.clone(),
            prompt: example.prompt.clone(),
            prediction: example.target.clone(),
        };

        // When
        let result = decoder.apply_prediction(&mut dialogue, &record);

        // Then
        assert!(result.is_err());
    }
}
