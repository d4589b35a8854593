//! Node label transforms.
//!
//! A transform turns a record key into the label shown in an export. The
//! plain transform uses `namespace/name`. The [`Anonymizer`] scrambles both
//! components so a graph can be shared without revealing what the
//! migrations are called, while keeping the graph's shape.

use crate::domain::RecordKey;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, HashSet};

/// Words kept as-is by the anonymizer: they describe the kind of migration,
/// not its content.
const KEPT_WORDS: [&str; 3] = ["auto", "initial", "squashed"];

/// Scramble attempts before falling back to a numeric suffix.
const MAX_SCRAMBLE_ATTEMPTS: usize = 32;

/// Maps record keys to export labels.
///
/// Implementations must be deterministic within one export: the same key
/// always yields the same label, and distinct keys yield distinct labels.
pub trait LabelTransform {
    /// Label for `key`.
    fn label(&mut self, key: &RecordKey) -> String;
}

/// Labels records as `namespace/name`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainLabels;

impl LabelTransform for PlainLabels {
    fn label(&mut self, key: &RecordKey) -> String {
        key.label()
    }
}

/// Replaces label components with random text of the same shape.
///
/// Each component is split on `_`. Words in a small allow-list (`auto`,
/// `initial`, `squashed`) and digits are kept; every other character is
/// replaced by a random lowercase letter, so `0002_add_email` might become
/// `0002_qzr_wkfyt`.
///
/// Scrambled components are cached, so a namespace shared by many records
/// gets one scrambled form. A scramble that collides with an earlier,
/// different component is rejected and retried, which keeps distinct keys
/// distinct. One anonymizer should be used for exactly one export.
#[derive(Debug, Clone)]
pub struct Anonymizer {
    rng: StdRng,
    cache: HashMap<String, String>,
    used: HashSet<String>,
}

impl Anonymizer {
    /// Create an anonymizer. A seed makes the output reproducible.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            cache: HashMap::new(),
            used: HashSet::new(),
        }
    }

    /// Scrambled form of one label component.
    pub fn component(&mut self, text: &str) -> String {
        if let Some(cached) = self.cache.get(text) {
            return cached.clone();
        }

        let mut scrambled = None;
        for _ in 0..MAX_SCRAMBLE_ATTEMPTS {
            let candidate = self.scramble(text);
            if !self.used.contains(&candidate) {
                scrambled = Some(candidate);
                break;
            }
        }
        // Short components have few scrambled forms; disambiguate with a
        // suffix once retries are exhausted.
        let scrambled = match scrambled {
            Some(scrambled) => scrambled,
            None => {
                let base = self.scramble(text);
                let mut suffix = 2;
                while self.used.contains(&format!("{base}{suffix}")) {
                    suffix += 1;
                }
                format!("{base}{suffix}")
            }
        };

        self.used.insert(scrambled.clone());
        self.cache.insert(text.to_string(), scrambled.clone());
        scrambled
    }

    fn scramble(&mut self, text: &str) -> String {
        text.split('_')
            .map(|word| {
                if KEPT_WORDS.contains(&word) {
                    word.to_string()
                } else {
                    word.chars()
                        .map(|c| {
                            if c.is_ascii_digit() {
                                c
                            } else {
                                char::from(self.rng.gen_range(b'a'..=b'z'))
                            }
                        })
                        .collect()
                }
            })
            .collect::<Vec<String>>()
            .join("_")
    }
}

impl LabelTransform for Anonymizer {
    fn label(&mut self, key: &RecordKey) -> String {
        let namespace = self.component(&key.namespace);
        let name = self.component(&key.name);
        format!("{namespace}/{name}")
    }
}
