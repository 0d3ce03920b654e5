mod config;
mod decoder;
pub mod errors;
mod formatter;
pub mod grammar;
mod linearizer;
mod loading;
pub mod models;
mod sampling;
mod schema_index;
mod state;
#[cfg(test)]
mod testutils;

pub use crate::config::{DataFormat, GenerationLevel, LinearizerConfig, MultipleChoiceFormat};
pub use crate::decoder::{DecodedFrame, PredictionDecoder, PredictionRecord, PromptItems, SlotItem};
pub use crate::errors::*;
pub use crate::formatter::{
    format_example, write_examples, write_examples_to_path, Example, TSV_HEADER,
};
pub use crate::linearizer::{TurnContext, TurnLinearizer, TurnRecord};
pub use crate::loading::{load_dialogue_file, load_dialogues, load_schema_file};
pub use crate::sampling::filter_examples;
pub use crate::schema_index::{in_domain, merge_domain_slot, SchemaIndex};
pub use crate::state::CumulativeState;
