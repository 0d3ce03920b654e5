use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use failure::ResultExt;
use itertools::Itertools;
use log::info;

use crate::config::{GenerationLevel, LinearizerConfig};
use crate::errors::*;
use crate::grammar::{RESPONSE_TOK, SYSTEM_TOK};
use crate::linearizer::TurnRecord;

/// One finished text-to-text example. Written once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    pub prompt: String,
    pub target: String,
    pub dialogue_id: String,
    pub turn_id: String,
    pub frame_id: String,
    /// Domain of origin; kept for sampling, not written to the output file.
    pub domain: String,
}

/// Assembles the final example for one turn record, or `None` when the
/// configured level produces no target at this kind of turn (`dst` and
/// `dst_intent` emit at user turns, `dst_intent_act` at system turns).
pub fn format_example(config: &LinearizerConfig, record: &TurnRecord) -> Option<Example> {
    let target = match (config.level, record.user_turn) {
        (GenerationLevel::Dst, true) => record.state_str.clone(),
        (GenerationLevel::DstIntent, true) => {
            format!("{} {}", record.state_str, record.intent_str)
        }
        (GenerationLevel::DstIntentAct, false) => {
            // The system utterance doubles as the response to generate.
            let response = record.curr_utt.replace(SYSTEM_TOK, RESPONSE_TOK);
            format!(
                "{} {} {} {}",
                record.state_str, record.intent_str, record.act_str, response
            )
        }
        _ => return None,
    };

    // Occasionally utterances carry newlines or tabs; collapsing whitespace
    // keeps the record on one line of the TSV output.
    let mut prompt = collapse_whitespace(&record.prompt);
    let mut target = collapse_whitespace(&target);
    if config.lowercase {
        prompt = prompt.to_lowercase();
        target = target.to_lowercase();
    }
    Some(Example {
        prompt,
        target,
        dialogue_id: record.dialogue_id.clone(),
        turn_id: record.turn_id.clone(),
        frame_id: record.frame_id.clone(),
        domain: record.turn_domain.clone(),
    })
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().join(" ")
}

pub const TSV_HEADER: &str = "prompt\ttarget\tdialogue_id\tturn_id\tframe_id";

/// Writes examples as tab-separated records, one per line.
pub fn write_examples<W: Write>(
    examples: &[Example],
    writer: &mut W,
    add_header: bool,
) -> Result<()> {
    if add_header {
        writeln!(writer, "{}", TSV_HEADER)?;
    }
    for example in examples {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}",
            example.prompt, example.target, example.dialogue_id, example.turn_id,
            example.frame_id
        )?;
    }
    Ok(())
}

pub fn write_examples_to_path<P: AsRef<Path>>(
    examples: &[Example],
    path: P,
    add_header: bool,
) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        fs::create_dir_all(parent)
            .with_context(|_| format!("Could not create output directory {:?}", parent))?;
    }
    let file = fs::File::create(&path)
        .with_context(|_| format!("Could not create output file {:?}", path.as_ref()))?;
    let mut writer = BufWriter::new(file);
    write_examples(examples, &mut writer, add_header)?;
    info!(
        "Wrote {} examples to {:?}",
        examples.len(),
        path.as_ref()
    );
    Ok(())
}
