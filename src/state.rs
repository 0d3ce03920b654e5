use indexmap::IndexMap;

use crate::errors::*;
use crate::schema_index::SchemaIndex;

/// Separator for multi-valued slots; the historical value order is kept.
pub const VALUE_SEPARATOR: &str = " | ";

/// Running slot→value map for one dialogue.
///
/// Created with every known slot present and empty, written only on user
/// turns, never reset mid-dialogue. New values for a slot overwrite old ones
/// while the slot order stays fixed.
#[derive(Debug, Clone)]
pub struct CumulativeState {
    slots: IndexMap<String, String>,
}

impl CumulativeState {
    pub fn new(index: &SchemaIndex) -> Self {
        Self {
            slots: index
                .slot_names()
                .map(|name| (name.clone(), String::new()))
                .collect(),
        }
    }

    /// Overwrites the value of a known slot. Referencing a slot absent from
    /// the schema means the schema and dialogue files do not match, which is
    /// fatal.
    pub fn update(&mut self, slot: &str, values: &[String]) -> Result<()> {
        let entry = self
            .slots
            .get_mut(slot)
            .ok_or_else(|| SgdTextError::UnknownSlot(slot.to_string()))?;
        *entry = values.join(VALUE_SEPARATOR);
        Ok(())
    }

    /// The slot's value if it has been set to something non-empty.
    pub fn active_value(&self, slot: &str) -> Option<&str> {
        self.slots
            .get(slot)
            .map(|value| value.as_str())
            .filter(|value| !value.is_empty())
    }
}
