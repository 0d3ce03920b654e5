use std::fs::{self, File};
use std::path::{Path, PathBuf};

use failure::{format_err, ResultExt};
use log::info;

use crate::errors::*;
use crate::models::{Dialogue, Service};

/// Loads a `schema.json` file: a list of services.
pub fn load_schema_file<P: AsRef<Path>>(path: P) -> Result<Vec<Service>> {
    let file = File::open(&path)
        .with_context(|_| format!("Could not open schema file {:?}", path.as_ref()))?;
    let services: Vec<Service> = serde_json::from_reader(file)
        .with_context(|_| format!("Invalid schema file {:?}", path.as_ref()))?;
    info!(
        "Loaded {} services from {:?}",
        services.len(),
        path.as_ref()
    );
    Ok(services)
}

/// Loads a single `dialogues_*.json` file: a list of dialogues.
pub fn load_dialogue_file<P: AsRef<Path>>(path: P) -> Result<Vec<Dialogue>> {
    let file = File::open(&path)
        .with_context(|_| format!("Could not open dialogue file {:?}", path.as_ref()))?;
    let dialogues: Vec<Dialogue> = serde_json::from_reader(file)
        .with_context(|_| format!("Invalid dialogue file {:?}", path.as_ref()))?;
    Ok(dialogues)
}

/// Loads every `dialogues*.json` file of a split directory, in lexicographic
/// order so runs are reproducible.
pub fn load_dialogue_dir<P: AsRef<Path>>(path: P) -> Result<Vec<Dialogue>> {
    let mut files: Vec<PathBuf> = fs::read_dir(&path)
        .with_context(|_| format!("Could not read dialogue directory {:?}", path.as_ref()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.file_name()
                .and_then(|name| name.to_str())
                .map_or(false, |name| {
                    name.starts_with("dialogues") && name.ends_with(".json")
                })
        })
        .collect();
    if files.is_empty() {
        return Err(format_err!(
            "No dialogue JSON files found at {:?}",
            path.as_ref()
        ));
    }
    files.sort();

    let mut dialogues = vec![];
    for file in &files {
        dialogues.extend(load_dialogue_file(file)?);
    }
    info!(
        "Loaded {} dialogues from {} files in {:?}",
        dialogues.len(),
        files.len(),
        path.as_ref()
    );
    Ok(dialogues)
}

/// Loads dialogues from a file or a split directory.
pub fn load_dialogues<P: AsRef<Path>>(path: P) -> Result<Vec<Dialogue>> {
    if path.as_ref().is_dir() {
        load_dialogue_dir(path)
    } else {
        load_dialogue_file(path)
    }
}
