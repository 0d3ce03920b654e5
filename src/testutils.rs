use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{DataFormat, LinearizerConfig};
use crate::models::{
    Action, Dialogue, DialogueState, Frame, IntentSchema, Service, SlotSchema, Speaker, Turn,
};
use crate::schema_index::SchemaIndex;

pub fn slot_schema(name: &str, description: &str, possible_values: &[&str]) -> SlotSchema {
    SlotSchema {
        name: name.to_string(),
        description: description.to_string(),
        is_categorical: !possible_values.is_empty(),
        possible_values: possible_values.iter().map(|v| v.to_string()).collect(),
    }
}

pub fn intent_schema(name: &str, description: &str) -> IntentSchema {
    IntentSchema {
        name: name.to_string(),
        description: description.to_string(),
        is_transactional: false,
        required_slots: vec![],
        optional_slots: serde_json::Value::Null,
        result_slots: vec![],
    }
}

pub fn train_services() -> Vec<Service> {
    vec![Service {
        service_name: "train".to_string(),
        description: "train journeys".to_string(),
        slots: vec![
            slot_schema(
                "departure",
                "departure city of the train",
                &["cambridge", "leicester"],
            ),
            slot_schema(
                "destination",
                "destination city of the train",
                &["cambridge", "leicester"],
            ),
            slot_schema("day", "day of the week for the trip", &[]),
            slot_schema("people", "number of seats to book", &["1", "2", "3"]),
        ],
        intents: vec![
            intent_schema("FindTrain", "find a train to take"),
            intent_schema("BookTrain", "book seats on a train"),
        ],
    }]
}

pub fn train_and_hotel_services() -> Vec<Service> {
    let mut services = train_services();
    services.push(Service {
        service_name: "hotel".to_string(),
        description: "hotel reservations".to_string(),
        slots: vec![
            slot_schema("area", "area of the hotel", &[]),
            slot_schema("parking", "whether the hotel has parking", &["yes", "no"]),
        ],
        intents: vec![intent_schema("FindHotel", "search for a hotel")],
    });
    services
}

pub fn train_index() -> SchemaIndex {
    let mut rng = StdRng::seed_from_u64(0);
    SchemaIndex::from_services(&train_services(), DataFormat::FullDesc, &mut rng)
}

/// Deterministic configuration used by most tests: no shuffling, no
/// lowercasing surprises (the fixtures are lowercase already).
pub fn test_config() -> LinearizerConfig {
    LinearizerConfig {
        randomize_items: false,
        ..Default::default()
    }
}

pub fn user_frame(
    service: &str,
    active_intent: &str,
    requested_slots: &[&str],
    slot_values: &[(&str, &[&str])],
) -> Frame {
    let mut values: IndexMap<String, Vec<String>> = IndexMap::new();
    for (slot, slot_vals) in slot_values {
        values.insert(
            slot.to_string(),
            slot_vals.iter().map(|v| v.to_string()).collect(),
        );
    }
    Frame {
        service: service.to_string(),
        state: Some(DialogueState {
            active_intent: active_intent.to_string(),
            requested_slots: requested_slots.iter().map(|s| s.to_string()).collect(),
            slot_values: values,
        }),
        actions: vec![],
        slots: vec![],
    }
}

pub fn system_frame(service: &str, actions: &[(&str, &str)]) -> Frame {
    Frame {
        service: service.to_string(),
        state: None,
        actions: actions
            .iter()
            .map(|(act, slot)| Action {
                act: act.to_string(),
                slot: slot.to_string(),
                values: vec![],
            })
            .collect(),
        slots: vec![],
    }
}

pub fn turn(speaker: Speaker, utterance: &str, frames: Vec<Frame>) -> Turn {
    Turn {
        speaker,
        utterance: utterance.to_string(),
        frames,
    }
}

/// Three-turn single-domain dialogue: the user books a train, the system
/// asks for the destination, the user answers and requests details back.
pub fn train_dialogue() -> Dialogue {
    Dialogue {
        dialogue_id: "train-001".to_string(),
        services: vec!["train".to_string()],
        turns: vec![
            turn(
                Speaker::User,
                "i need a train from cambridge",
                vec![user_frame(
                    "train",
                    "FindTrain",
                    &[],
                    &[("departure", &["cambridge"])],
                )],
            ),
            turn(
                Speaker::System,
                "where are you heading ?",
                vec![system_frame("train", &[("REQUEST", "destination")])],
            ),
            turn(
                Speaker::User,
                "to leicester on tuesday , 2 seats . which day and destination was that ?",
                vec![user_frame(
                    "train",
                    "BookTrain",
                    &["day", "destination"],
                    &[
                        ("departure", &["cambridge"]),
                        ("destination", &["leicester"]),
                        ("day", &["tuesday"]),
                        ("people", &["2"]),
                    ],
                )],
            ),
        ],
    }
}

/// One user turn spanning two domains (two frames).
pub fn multi_domain_dialogue() -> Dialogue {
    Dialogue {
        dialogue_id: "multi-001".to_string(),
        services: vec!["train".to_string(), "hotel".to_string()],
        turns: vec![turn(
            Speaker::User,
            "i need a train to leicester and a hotel in the centre",
            vec![
                user_frame(
                    "train",
                    "FindTrain",
                    &[],
                    &[("destination", &["leicester"])],
                ),
                user_frame("hotel", "FindHotel", &[], &[("area", &["centre"])]),
            ],
        )],
    }
}
