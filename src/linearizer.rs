use std::collections::HashMap;

use failure::format_err;
use indexmap::IndexMap;
use itertools::Itertools;
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::{LinearizerConfig, MultipleChoiceFormat};
use crate::errors::*;
use crate::grammar::{
    ACTIONS_TOK, DONTCARE_VALUE, INTENTS_TOK, OPTION_LETTERS, REQ_SLOTS_TOK, STATES_TOK,
};
use crate::models::{Dialogue, Frame, Speaker};
use crate::schema_index::{in_domain, merge_domain_slot, SchemaIndex};
use crate::state::CumulativeState;

/// Identifier assignments and rendered description pieces shared by the
/// frames of one turn.
///
/// The context is passed by value into each frame's rendering step and
/// returned extended: ids keep accumulating across the frames of a
/// multi-domain turn instead of resetting, so no two items of one turn ever
/// share an id.
#[derive(Debug, Clone, Default)]
pub struct TurnContext {
    slot_descs: Vec<String>,
    intent_descs: Vec<String>,
    slot_ids: HashMap<String, usize>,
}

impl TurnContext {
    /// Prompt prefix for this turn: every slot description rendered so far,
    /// then every intent description.
    pub fn description_prefix(&self) -> String {
        self.slot_descs
            .iter()
            .chain(self.intent_descs.iter())
            .cloned()
            .collect()
    }

    pub fn slot_id(&self, slot: &str) -> Option<usize> {
        self.slot_ids.get(slot).cloned()
    }

    fn is_empty(&self) -> bool {
        self.slot_descs.is_empty() && self.intent_descs.is_empty()
    }
}

/// Target pieces produced by rendering one frame.
#[derive(Debug, Clone)]
struct FrameRender {
    state_str: String,
    intent_str: String,
}

/// Everything collected for one (turn, frame) pair, finalized before it is
/// pushed to the output list and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnRecord {
    /// Item descriptions followed by the running dialogue context.
    pub prompt: String,
    pub state_str: String,
    pub intent_str: String,
    pub act_str: String,
    /// State string of the previous user turn.
    pub prev_state_str: String,
    pub curr_utt: String,
    pub user_turn: bool,
    pub turn_domain: String,
    pub dialogue_id: String,
    pub turn_id: String,
    pub frame_id: String,
}

/// Renders one dialogue at a time into per-frame [`TurnRecord`]s.
///
/// The configuration and random source are threaded explicitly; the
/// linearizer holds no mutable state of its own, so processing different
/// dialogues with separate linearizers is safe.
pub struct TurnLinearizer<'a> {
    index: &'a SchemaIndex,
    config: &'a LinearizerConfig,
}

impl<'a> TurnLinearizer<'a> {
    pub fn new(index: &'a SchemaIndex, config: &'a LinearizerConfig) -> Self {
        Self { index, config }
    }

    pub fn process_dialogue<R: Rng>(
        &self,
        dialogue: &Dialogue,
        rng: &mut R,
    ) -> Result<Vec<TurnRecord>> {
        debug!("Linearizing dialogue '{}'", dialogue.dialogue_id);
        let mut cumulative = CumulativeState::new(self.index);
        let mut records = vec![];
        // Running dialogue context, item description prefix and slot id
        // assignment of the most recent user turn.
        let mut context = String::new();
        let mut prefix = String::new();
        let mut slot_ids: HashMap<String, usize> = HashMap::new();
        let mut last_state_str = String::new();
        let mut last_intent_str = String::new();

        for (turn_id, turn) in dialogue.turns.iter().enumerate() {
            let curr_utt = format!("[{}] {} ", turn.speaker.token(), turn.utterance);
            context.push_str(&curr_utt);
            let prev_state_str = last_state_str.clone();

            match turn.speaker {
                Speaker::User => {
                    let mut ctx = TurnContext::default();
                    for (frame_id, frame) in turn.frames.iter().enumerate() {
                        if self.config.blocked_domains.contains(&frame.service) {
                            debug!(
                                "Skipping blocked domain '{}' in dialogue '{}'",
                                frame.service, dialogue.dialogue_id
                            );
                            continue;
                        }
                        let (next_ctx, render) =
                            self.render_user_frame(ctx, frame, &mut cumulative, rng)?;
                        ctx = next_ctx;
                        records.push(TurnRecord {
                            prompt: format!("{}{}", ctx.description_prefix(), context),
                            state_str: render.state_str.clone(),
                            intent_str: render.intent_str.clone(),
                            act_str: String::new(),
                            prev_state_str: prev_state_str.clone(),
                            curr_utt: curr_utt.clone(),
                            user_turn: true,
                            turn_domain: frame.service.clone(),
                            dialogue_id: dialogue.dialogue_id.clone(),
                            turn_id: turn_id.to_string(),
                            frame_id: frame_id.to_string(),
                        });
                        last_state_str = render.state_str;
                        last_intent_str = render.intent_str;
                    }
                    // A fully blocked turn leaves the previous assignment in
                    // place and contributes nothing.
                    if !ctx.is_empty() {
                        prefix = ctx.description_prefix();
                        slot_ids = ctx.slot_ids;
                    }
                }
                Speaker::System => {
                    for (frame_id, frame) in turn.frames.iter().enumerate() {
                        if self.config.blocked_domains.contains(&frame.service) {
                            continue;
                        }
                        let act_str = self.render_agent_frame(frame, &slot_ids);
                        records.push(TurnRecord {
                            prompt: format!("{}{}", prefix, context),
                            state_str: last_state_str.clone(),
                            intent_str: last_intent_str.clone(),
                            act_str,
                            prev_state_str: prev_state_str.clone(),
                            curr_utt: curr_utt.clone(),
                            user_turn: false,
                            turn_domain: frame.service.clone(),
                            dialogue_id: dialogue.dialogue_id.clone(),
                            turn_id: turn_id.to_string(),
                            frame_id: frame_id.to_string(),
                        });
                    }
                }
            }
        }
        debug!(
            "Dialogue '{}' produced {} records",
            dialogue.dialogue_id,
            records.len()
        );
        Ok(records)
    }

    /// Renders the item descriptions and target pieces for one user frame,
    /// merging the frame's state updates into the cumulative state first.
    fn render_user_frame<R: Rng>(
        &self,
        mut ctx: TurnContext,
        frame: &Frame,
        cumulative: &mut CumulativeState,
        rng: &mut R,
    ) -> Result<(TurnContext, FrameRender)> {
        let domain = &frame.service;
        let state = frame.state.as_ref().ok_or_else(|| {
            format_err!("User frame of service '{}' carries no state", domain)
        })?;

        for (slot, values) in &state.slot_values {
            cumulative.update(&merge_domain_slot(domain, slot), values)?;
        }

        let mut slots: Vec<String> = self.index.slot_names().cloned().collect();
        if self.config.randomize_items {
            slots.shuffle(rng);
        }
        let mut slot_id = ctx.slot_descs.len();
        let mut state_str = STATES_TOK.to_string();
        for slot in &slots {
            if !in_domain(slot, domain) {
                continue;
            }
            let options = self.enumerate_options(slot, rng)?;
            let mut desc = self.index.slot_text(slot, self.config.data_format).to_string();
            if let Some(values) = &options {
                let pieces = values
                    .iter()
                    .enumerate()
                    .map(|(position, value)| match self.config.multiple_choice {
                        MultipleChoiceFormat::OneA => {
                            format!("{}{}) {}", slot_id, OPTION_LETTERS[position], value)
                        }
                        _ => format!("{}) {}", OPTION_LETTERS[position], value),
                    })
                    .join(" ");
                desc = format!("{} {}", desc, pieces);
            }

            let id_prefix = format!(" {}{}", slot_id, self.config.delimiter);
            ctx.slot_ids.insert(slot.clone(), slot_id);
            ctx.slot_descs.push(format!("{}{} ", id_prefix, desc));

            if let Some(value) = cumulative.active_value(slot) {
                let piece = match &options {
                    Some(values) if value != DONTCARE_VALUE => {
                        let position = values
                            .iter()
                            .position(|v| v == value)
                            .ok_or_else(|| {
                                SgdTextError::ValueNotInOptions(slot.clone(), value.to_string())
                            })?;
                        format!("{}{}{}", id_prefix, slot_id, OPTION_LETTERS[position])
                    }
                    _ => format!("{}{}", id_prefix, value),
                };
                state_str.push_str(&piece);
            }
            slot_id += 1;
        }

        let mut intents: Vec<String> = self.index.intent_names().cloned().collect();
        if self.config.randomize_items {
            intents.shuffle(rng);
        }
        let mut intent_id = ctx.intent_descs.len();
        let mut active_intent_pieces: Vec<String> = vec![];
        let active_intent = merge_domain_slot(domain, &state.active_intent);
        for intent in &intents {
            if !in_domain(intent, domain) {
                continue;
            }
            let desc = self.index.intent_text(intent, self.config.data_format);
            if active_intent == *intent {
                active_intent_pieces.push(format!(" i{}", intent_id));
            }
            ctx.intent_descs
                .push(format!(" i{}{}{} ", intent_id, self.config.delimiter, desc));
            intent_id += 1;
        }

        // The order of requested slots is determined by the user's utterance
        // and is preserved verbatim.
        let mut requested_ids: Vec<String> = vec![];
        for requested in &state.requested_slots {
            let qualified = merge_domain_slot(domain, requested);
            let id = ctx.slot_id(&qualified).ok_or_else(|| {
                SgdTextError::UnassignedRequestedSlot(qualified.clone())
            })?;
            requested_ids.push(id.to_string());
        }

        let intent_str = format!(
            "{}{} {} {}",
            INTENTS_TOK,
            active_intent_pieces.concat(),
            REQ_SLOTS_TOK,
            requested_ids.join(" ")
        );
        Ok((ctx, FrameRender { state_str, intent_str }))
    }

    /// Renders one system frame's actions as `act(id;id;)` groups, using the
    /// slot id assignment of the most recent user turn. Action values are
    /// delexicalized: only act types and slot references are kept.
    fn render_agent_frame(&self, frame: &Frame, slot_ids: &HashMap<String, usize>) -> String {
        let mut acts: IndexMap<String, String> = IndexMap::new();
        for action in &frame.actions {
            let params = acts.entry(action.act.clone()).or_insert_with(String::new);
            if action.slot.is_empty() {
                params.push_str("none;");
            } else {
                let qualified = merge_domain_slot(&frame.service, &action.slot);
                if let Some(id) = slot_ids.get(&qualified) {
                    params.push_str(&format!("{};", id));
                }
            }
        }
        format!(
            " {} {}",
            ACTIONS_TOK,
            acts.iter()
                .map(|(act, params)| format!("{}({})", act, params))
                .join(" ")
        )
    }

    /// The display-ordered option list of a categorical slot, when multiple
    /// choice is enabled for it.
    fn enumerate_options<R: Rng>(&self, slot: &str, rng: &mut R) -> Result<Option<Vec<String>>> {
        if !self.config.multiple_choice.enabled() || !self.index.is_categorical(slot) {
            return Ok(None);
        }
        let mut values = self.index.possible_values(slot).to_vec();
        if self.config.randomize_items {
            values.shuffle(rng);
        }
        if values.len() > OPTION_LETTERS.len() {
            return Err(
                SgdTextError::TooManyOptions(slot.to_string(), values.len()).into(),
            );
        }
        Ok(Some(values))
    }
}
