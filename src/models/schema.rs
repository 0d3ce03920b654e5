use serde_derive::{Deserialize, Serialize};

/// One service (domain) of a schema-guided dialogue dataset, as found in
/// `schema.json`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Service {
    pub service_name: String,
    #[serde(default)]
    pub description: String,
    pub slots: Vec<SlotSchema>,
    #[serde(default)]
    pub intents: Vec<IntentSchema>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SlotSchema {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_categorical: bool,
    #[serde(default)]
    pub possible_values: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IntentSchema {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_transactional: bool,
    #[serde(default)]
    pub required_slots: Vec<String>,
    #[serde(default)]
    pub optional_slots: serde_json::Value,
    #[serde(default)]
    pub result_slots: Vec<String>,
}
