use std::collections::HashMap;

use log::info;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::formatter::Example;

/// Keeps `data_percent` of the examples, optionally balancing domains.
///
/// With `uniform_domain_distribution`, domains are numbered in first-seen
/// order and examples are drawn round-robin: slot `s` goes to domain
/// `s % domain_count`, scanning forward to the next domain that still has
/// unconsumed examples. This yields a close-to-uniform per-domain count
/// without ever dropping below the requested total.
pub fn filter_examples<R: Rng>(
    examples: Vec<Example>,
    data_percent: f64,
    uniform_domain_distribution: bool,
    randomize: bool,
    rng: &mut R,
) -> Vec<Example> {
    if data_percent == 0.0 {
        return examples;
    }
    let sample_count = (examples.len() as f64 * data_percent) as usize;
    info!(
        "Sampling {} of {} examples (uniform domains: {})",
        sample_count,
        examples.len(),
        uniform_domain_distribution
    );

    if !uniform_domain_distribution {
        let mut examples = examples;
        if randomize {
            examples.shuffle(rng);
        }
        examples.truncate(sample_count);
        return examples;
    }

    let mut domain_examples: Vec<Vec<Example>> = vec![];
    let mut domain_ids: HashMap<String, usize> = HashMap::new();
    for example in examples {
        let next_id = domain_examples.len();
        let domain_id = *domain_ids.entry(example.domain.clone()).or_insert(next_id);
        if domain_id == next_id {
            domain_examples.push(vec![]);
        }
        domain_examples[domain_id].push(example);
    }

    let domain_count = domain_examples.len();
    let mut consumed = vec![0usize; domain_count];
    let mut selected = Vec::with_capacity(sample_count);
    for s in 0..sample_count {
        let mut domain_id = s % domain_count;
        for offset in 0..domain_count {
            let candidate = (s % domain_count + offset) % domain_count;
            if domain_examples[candidate].len() > consumed[candidate] {
                domain_id = candidate;
                break;
            }
        }
        selected.push(domain_examples[domain_id][consumed[domain_id]].clone());
        consumed[domain_id] += 1;
    }
    if randomize {
        selected.shuffle(rng);
    }
    selected
}
