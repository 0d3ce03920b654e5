use std::collections::HashSet;
use std::process;

use clap::{App, Arg};
use failure::ResultExt;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use sgd_text::errors::*;
use sgd_text::{
    filter_examples, format_example, load_dialogues, load_schema_file, write_examples_to_path,
    LinearizerConfig, SchemaIndex, TurnLinearizer,
};

fn main() {
    env_logger::Builder::from_default_env()
        .default_format_timestamp_nanos(true)
        .init();

    if let Err(error) = run() {
        eprintln!("Error: {}", error);
        for cause in error.iter_causes() {
            eprintln!("  caused by: {}", cause);
        }
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let matches = App::new("sgd-text-gen")
        .about("Generate text-to-text training examples from schema-guided dialogues")
        .arg(
            Arg::with_name("SCHEMA_FILE")
                .required(true)
                .takes_value(true)
                .index(1)
                .help("path to the schema.json file"),
        )
        .arg(
            Arg::with_name("DIALOGUE_PATH")
                .required(true)
                .takes_value(true)
                .index(2)
                .help("path to a dialogues json file, or a directory of dialogues*.json files"),
        )
        .arg(
            Arg::with_name("OUTPUT_FILE")
                .required(true)
                .takes_value(true)
                .index(3)
                .help("path of the TSV file to write"),
        )
        .arg(
            Arg::with_name("delimiter")
                .long("--delimiter")
                .takes_value(true)
                .default_value("=")
                .help("separator between item ids and descriptions or values"),
        )
        .arg(
            Arg::with_name("level")
                .long("--level")
                .takes_value(true)
                .default_value("dst")
                .help("generation level: dst, dst_intent or dst_intent_act"),
        )
        .arg(
            Arg::with_name("data_format")
                .long("--data-format")
                .takes_value(true)
                .default_value("full_desc")
                .help("item rendering: full_desc, item_name or rand_name"),
        )
        .arg(
            Arg::with_name("multiple_choice")
                .long("--multiple-choice")
                .takes_value(true)
                .default_value("none")
                .help("categorical value enumeration: none, a or 1a"),
        )
        .arg(
            Arg::with_name("keep_case")
                .long("--keep-case")
                .help("do not lowercase the generated examples"),
        )
        .arg(
            Arg::with_name("no_randomize")
                .long("--no-randomize")
                .help("keep schema item and option order instead of shuffling per turn"),
        )
        .arg(
            Arg::with_name("seed")
                .long("--seed")
                .takes_value(true)
                .help("seed for the random source, for reproducible runs"),
        )
        .arg(
            Arg::with_name("data_percent")
                .long("--data-percent")
                .takes_value(true)
                .default_value("0.0")
                .help("if not 0, the fraction of examples to keep"),
        )
        .arg(
            Arg::with_name("uniform_domain_distribution")
                .long("--uniform-domain-distribution")
                .help("with --data-percent, balance the kept examples across domains"),
        )
        .arg(
            Arg::with_name("add_header")
                .long("--add-header")
                .help("write the TSV header row"),
        )
        .arg(
            Arg::with_name("blocked_domains")
                .long("--blocked-domains")
                .takes_value(true)
                .use_delimiter(true)
                .help("comma-separated services to exclude from generation"),
        )
        .get_matches();

    let config = LinearizerConfig {
        delimiter: matches.value_of("delimiter").unwrap_or("=").to_string(),
        level: matches.value_of("level").unwrap_or("dst").parse()?,
        data_format: matches.value_of("data_format").unwrap_or("full_desc").parse()?,
        multiple_choice: matches.value_of("multiple_choice").unwrap_or("none").parse()?,
        lowercase: !matches.is_present("keep_case"),
        randomize_items: !matches.is_present("no_randomize"),
        blocked_domains: matches
            .values_of("blocked_domains")
            .map(|values| values.map(|v| v.to_string()).collect())
            .unwrap_or_else(HashSet::new),
    };
    let data_percent: f64 = matches
        .value_of("data_percent")
        .unwrap_or("0.0")
        .parse::<f64>()
        .with_context(|_| "Invalid --data-percent value")?;

    let mut rng = match matches.value_of("seed") {
        Some(seed) => {
            let seed: u64 = seed.parse::<u64>().with_context(|_| "Invalid --seed value")?;
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    };

    let schema_file = matches.value_of("SCHEMA_FILE").unwrap_or_default();
    let dialogue_path = matches.value_of("DIALOGUE_PATH").unwrap_or_default();
    let output_file = matches.value_of("OUTPUT_FILE").unwrap_or_default();

    let services = load_schema_file(schema_file)?;
    let index = SchemaIndex::from_services(&services, config.data_format, &mut rng);
    let dialogues = load_dialogues(dialogue_path)?;

    let linearizer = TurnLinearizer::new(&index, &config);
    let mut examples = vec![];
    for dialogue in &dialogues {
        let records = linearizer
            .process_dialogue(dialogue, &mut rng)
            .with_context(|_| format!("Failed on dialogue '{}'", dialogue.dialogue_id))?;
        examples.extend(
            records
                .iter()
                .filter_map(|record| format_example(&config, record)),
        );
    }
    info!(
        "Generated {} examples from {} dialogues",
        examples.len(),
        dialogues.len()
    );

    let examples = filter_examples(
        examples,
        data_percent,
        matches.is_present("uniform_domain_distribution"),
        config.randomize_items,
        &mut rng,
    );
    write_examples_to_path(&examples, output_file, matches.is_present("add_header"))?;
    Ok(())
}
