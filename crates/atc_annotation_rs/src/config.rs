use std::{path::Path, time::Duration};

use serde::Deserialize;

use crate::errors::Error;

/// Session-wide transducer settings, usually loaded from
/// `resources/parser/transducer_config.ron`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct TransducerConfig {
    /// Words that may be skipped inside an open callsign.
    pub callsign_whitelist: Vec<String>,
    /// Tokens that are skipped at no cost, in both search phases.
    pub noise_markers: Vec<String>,
    /// Largest sentence index an airline self-correction may cut at.
    pub airline_correction_cutoff: Option<usize>,
    /// Default for dropping out-of-vocabulary words before the skipping phase.
    pub ignore_fluff_words: bool,
    /// Suppress commands whose vocabulary does not overlap the input.
    pub prune_commands: bool,
}

impl Default for TransducerConfig {
    fn default() -> Self {
        Self {
            callsign_whitelist: ["aeh", "ah", "correction", "ne"]
                .map(String::from)
                .to_vec(),
            noise_markers: ["_sil_", "_spn_", "_nsn_"].map(String::from).to_vec(),
            airline_correction_cutoff: Some(20),
            ignore_fluff_words: false,
            prune_commands: true,
        }
    }
}

impl TransducerConfig {
    /// Load transducer configuration from a RON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        let config: TransducerConfig = ron::from_str(&contents)?;
        Ok(config)
    }

    /// Load transducer configuration from the default location
    pub fn load_default() -> Result<Self, Error> {
        Self::load_from_file(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/resources/parser/transducer_config.ron"
        ))
    }
}

/// Per-call search options.
#[derive(Clone, Debug, PartialEq)]
pub struct ConvertOptions {
    /// Anytime budget per search phase; on expiry the best state so far wins.
    pub timeout: Option<Duration>,
    /// Limit after which a search without a cancel flag fails with
    /// [`Error::Timeout`]. With a cancel flag it behaves like `timeout`.
    pub hard_deadline: Option<Duration>,
    /// Run the skipping phase when the strict phase finds no parse.
    pub allow_skip: bool,
    pub ignore_fluff_words: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            hard_deadline: None,
            allow_skip: true,
            ignore_fluff_words: false,
        }
    }
}

impl ConvertOptions {
    pub fn from_config(config: &TransducerConfig) -> Self {
        Self {
            ignore_fluff_words: config.ignore_fluff_words,
            ..Self::default()
        }
    }
}
