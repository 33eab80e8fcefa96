//! Input clean-up applied before the skipping search phase.

use std::collections::HashSet;

use crate::{token::observation, vocabulary::VocabularyIndex};

/// Drops tokens the grammar can never emit.
pub(crate) fn remove_fluff(sentence: Vec<String>, vocabulary: &VocabularyIndex) -> Vec<String> {
    let before = sentence.len();
    let kept: Vec<String> = sentence
        .into_iter()
        .filter(|token| vocabulary.contains(&observation(token)))
        .collect();
    if kept.len() != before {
        log::debug!("Removed {} out of vocabulary words", before - kept.len());
    }
    kept
}

/// A speaker who restarts with a different airline corrected themselves:
/// everything before the last airline mention is dropped, provided that
/// mention starts no later than `cutoff`.
pub(crate) fn trim_airline_restart(
    mut sentence: Vec<String>,
    airlines: &HashSet<String>,
    cutoff: usize,
) -> Vec<String> {
    let observations: Vec<String> = sentence.iter().map(|token| observation(token)).collect();
    let mentioned: HashSet<&str> = observations
        .iter()
        .filter(|word| airlines.contains(*word))
        .map(String::as_str)
        .collect();
    if mentioned.len() < 2 {
        return sentence;
    }
    let Some(last) = observations.iter().rposition(|word| airlines.contains(word)) else {
        return sentence;
    };
    if last > cutoff {
        return sentence;
    }
    log::debug!("Airline self-correction, dropping the first {last} words");
    sentence.split_off(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::GrammarModel;

    fn words(sentence: &str) -> Vec<String> {
        sentence.split_whitespace().map(String::from).collect()
    }

    fn airlines() -> HashSet<String> {
        ["lufthansa", "speedbird"].map(String::from).into()
    }

    #[test]
    fn test_remove_fluff() {
        let grammar =
            GrammarModel::load_grammar("0\t1\tclimb\tclimb\n1\t2\tnow\tnow\n2\n".as_bytes(), "g")
                .unwrap();
        let vocabulary = VocabularyIndex::new(&grammar);
        let kept = remove_fluff(words("Climb:0.9 eh uh now"), &vocabulary);
        assert_eq!(kept, words("Climb:0.9 now"));
    }

    #[test]
    fn test_trim_airline_restart() {
        let trimmed = trim_airline_restart(
            words("lufthansa one two speedbird three four"),
            &airlines(),
            20,
        );
        assert_eq!(trimmed, words("speedbird three four"));
    }

    #[test]
    fn test_repeated_airline_is_not_a_restart() {
        let sentence = words("lufthansa one two lufthansa one two");
        assert_eq!(
            trim_airline_restart(sentence.clone(), &airlines(), 20),
            sentence
        );
    }

    #[test]
    fn test_restart_beyond_cutoff_is_kept() {
        let sentence = words("lufthansa one two three speedbird four");
        assert_eq!(trim_airline_restart(sentence.clone(), &airlines(), 3), sentence);
    }
}
