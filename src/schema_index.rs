use std::collections::HashMap;

use indexmap::IndexMap;
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::DataFormat;
use crate::models::Service;

/// Qualified item name, `{domain}-{item}`. This is the identity of every
/// schema item throughout the crate.
pub fn merge_domain_slot(domain: &str, name: &str) -> String {
    format!("{}-{}", domain, name)
}

/// True iff `qualified` belongs to `domain`.
pub fn in_domain(qualified: &str, domain: &str) -> bool {
    qualified
        .strip_prefix(domain)
        .map_or(false, |rest| rest.starts_with('-'))
}

/// Normalized view of a schema: slot and intent descriptors in declaration
/// order, with categorical metadata.
///
/// Slot order is preserved from the schema files so that models can learn to
/// generate states in a consistent order.
#[derive(Debug, Clone, Default)]
pub struct SchemaIndex {
    slots: IndexMap<String, String>,
    intents: IndexMap<String, String>,
    is_categorical: HashMap<String, bool>,
    possible_values: HashMap<String, Vec<String>>,
    slot_rand_names: HashMap<String, String>,
    intent_rand_names: HashMap<String, String>,
}

impl SchemaIndex {
    /// Builds the index from raw schema services. The random source is only
    /// drawn from when `data_format` is `RandName`.
    pub fn from_services<R: Rng>(
        services: &[Service],
        data_format: DataFormat,
        rng: &mut R,
    ) -> Self {
        let mut index = SchemaIndex::default();
        for service in services {
            let domain = &service.service_name;
            for slot in &service.slots {
                let name = merge_domain_slot(domain, &slot.name);
                let mut is_cat = slot.is_categorical;
                let mut poss_vals = slot.possible_values.clone();
                // A categorical slot whose possible values are all numeric is
                // not a meaningful multiple-choice item.
                if is_cat && poss_vals.iter().all(|v| is_numeric(v)) {
                    debug!("Reclassifying numeric categorical slot '{}'", name);
                    poss_vals = vec![];
                    is_cat = false;
                }
                index.is_categorical.insert(name.clone(), is_cat);
                index.possible_values.insert(name.clone(), poss_vals);
                if data_format == DataFormat::RandName {
                    index
                        .slot_rand_names
                        .insert(name.clone(), shuffled_name(&slot.name, rng));
                }
                index.slots.insert(name, slot.description.clone());
            }
            for intent in &service.intents {
                let name = merge_domain_slot(domain, &intent.name);
                if data_format == DataFormat::RandName {
                    index
                        .intent_rand_names
                        .insert(name.clone(), shuffled_name(&intent.name, rng));
                }
                index.intents.insert(name, intent.description.clone());
            }
        }
        index
    }

    /// Qualified slot names in schema declaration order.
    pub fn slot_names(&self) -> impl Iterator<Item = &String> {
        self.slots.keys()
    }

    /// Qualified intent names in schema declaration order.
    pub fn intent_names(&self) -> impl Iterator<Item = &String> {
        self.intents.keys()
    }

    pub fn contains_slot(&self, slot: &str) -> bool {
        self.slots.contains_key(slot)
    }

    pub fn is_categorical(&self, slot: &str) -> bool {
        self.is_categorical.get(slot).cloned().unwrap_or(false)
    }

    pub fn possible_values(&self, slot: &str) -> &[String] {
        self.possible_values
            .get(slot)
            .map(|values| values.as_slice())
            .unwrap_or(&[])
    }

    /// The text standing in for a slot in the prompt, per data format.
    pub fn slot_text<'a>(&'a self, slot: &'a str, data_format: DataFormat) -> &'a str {
        match data_format {
            DataFormat::FullDesc => self.slots.get(slot).map(|d| d.as_str()).unwrap_or(slot),
            DataFormat::ItemName => slot,
            DataFormat::RandName => self
                .slot_rand_names
                .get(slot)
                .map(|d| d.as_str())
                .unwrap_or(slot),
        }
    }

    /// The text standing in for an intent in the prompt, per data format.
    pub fn intent_text<'a>(&'a self, intent: &'a str, data_format: DataFormat) -> &'a str {
        match data_format {
            DataFormat::FullDesc => self.intents.get(intent).map(|d| d.as_str()).unwrap_or(intent),
            DataFormat::ItemName => intent,
            DataFormat::RandName => self
                .intent_rand_names
                .get(intent)
                .map(|d| d.as_str())
                .unwrap_or(intent),
        }
    }
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

fn shuffled_name<R: Rng>(name: &str, rng: &mut R) -> String {
    let mut chars: Vec<char> = name.chars().collect();
    chars.shuffle(rng);
    chars.into_iter().collect()
}
