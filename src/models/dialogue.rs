use indexmap::IndexMap;
use serde_derive::{Deserialize, Serialize};

/// One dialogue from a `dialogues_*.json` file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Dialogue {
    pub dialogue_id: String,
    #[serde(default)]
    pub services: Vec<String>,
    pub turns: Vec<Turn>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub utterance: String,
    pub frames: Vec<Frame>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum Speaker {
    #[serde(rename = "USER")]
    User,
    #[serde(rename = "SYSTEM")]
    System,
}

impl Speaker {
    pub fn token(&self) -> &'static str {
        match self {
            Speaker::User => "user",
            Speaker::System => "system",
        }
    }
}

/// One frame of a turn; user frames carry a state, system frames carry
/// actions only.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Frame {
    pub service: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<DialogueState>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub slots: Vec<SlotSpan>,
}

/// Slot values are kept in an `IndexMap`: the turn's value order is part of
/// the data and must survive a serialization round trip.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DialogueState {
    #[serde(default)]
    pub active_intent: String,
    #[serde(default)]
    pub requested_slots: Vec<String>,
    #[serde(default)]
    pub slot_values: IndexMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Action {
    pub act: String,
    #[serde(default)]
    pub slot: String,
    #[serde(default)]
    pub values: Vec<String>,
}

/// Character span of a slot value within the turn utterance. Not used for
/// generation, but preserved so rewritten dialogues stay loss-free.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SlotSpan {
    pub slot: String,
    pub start: usize,
    pub exclusive_end: usize,
}
