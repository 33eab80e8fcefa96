//! Test fixtures built from the bundled resources
//! Available only when testing feature is enabled
use std::path::PathBuf;

use aviation_helper_rs::clearance::{airlines::Airlines, callsign_context::CallsignContext};

use super::*;

pub fn resource_path(relative: &str) -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/resources")).join(relative)
}

pub fn load_test_grammar() -> Result<GrammarModel, Error> {
    GrammarModel::load_grammar_from_file(resource_path("grammar/atc_grammar.fst.txt"))
}

pub fn load_test_airlines() -> Result<Airlines, Error> {
    Ok(Airlines::load_airlines_from_file(resource_path(
        "known-strings/airlines.txt",
    ))?)
}

pub fn load_test_context() -> Result<CallsignContext, Error> {
    Ok(CallsignContext::load_context_from_file(resource_path(
        "known-strings/callsign_context.txt",
    ))?)
}

/// Transducer over the test grammar with the default configuration.
pub fn test_transducer() -> Result<SkipTransducer, Error> {
    Ok(SkipTransducer::new(
        std::sync::Arc::new(load_test_grammar()?),
        &load_test_airlines()?,
        TransducerConfig::load_default()?,
    ))
}

/// Annotator with grammar and airlines loaded, without callsign context.
pub fn test_annotator() -> Result<Annotator, Error> {
    let mut annotator = Annotator::new(TransducerConfig::load_default()?);
    annotator.set_airlines(load_test_airlines()?);
    annotator.set_grammar(load_test_grammar()?);
    Ok(annotator)
}

/// Splits a sentence into the token list the transducer takes.
pub fn words(sentence: &str) -> Vec<String> {
    sentence.split_whitespace().map(String::from).collect()
}
