//! Puts words the search skipped back into its tagged output.

use std::collections::VecDeque;

use crate::markup::{SENTENCE_CLOSE, SENTENCE_OPEN, is_closing, tag_name};

struct Merger<'a> {
    tagged: &'a [String],
    cursor: usize,
    words: VecDeque<&'a str>,
}

impl<'a> Merger<'a> {
    /// Merges up to and including the closing tag of the current span.
    fn merge_span(&mut self) -> Vec<&'a str> {
        if self.cursor >= self.tagged.len() {
            return self.words.drain(..).collect();
        }
        let mut merged = Vec::new();
        while let Some(tagged) = self.tagged.get(self.cursor) {
            let tagged = tagged.as_str();
            self.cursor += 1;

            if tag_name(tagged).is_none() {
                while let Some(word) = self.words.pop_front() {
                    merged.push(word);
                    if word.to_lowercase() == tagged {
                        break;
                    }
                }
                continue;
            }

            if is_closing(tagged) {
                if tagged == SENTENCE_CLOSE {
                    merged.extend(self.words.drain(..));
                }
                merged.push(tagged);
                return merged;
            }

            let first_inside = self.tagged.get(self.cursor).map(String::as_str);
            let inside = self.merge_span();
            // Unmatched words leading a span belong in front of it
            let split = if tagged == SENTENCE_OPEN {
                0
            } else {
                inside
                    .iter()
                    .position(|word| {
                        tag_name(word).is_some()
                            || Some(word.to_lowercase().as_str()) == first_inside
                    })
                    .unwrap_or(inside.len())
            };
            merged.extend_from_slice(&inside[..split]);
            merged.push(tagged);
            merged.extend_from_slice(&inside[split..]);
        }
        merged
    }
}

/// Merges the original `words` into the `tagged` search output. Words keep
/// their original spelling; skipped ones land where they were spoken.
pub fn reinsert_missing_words(words: &[String], tagged: &[String]) -> String {
    if tagged.is_empty() {
        return words.join(" ");
    }
    let mut merger = Merger {
        tagged,
        cursor: 0,
        words: words.iter().map(String::as_str).collect(),
    };
    merger.merge_span().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(sentence: &str) -> Vec<String> {
        sentence.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_skipped_word_stays_in_place() {
        let merged = reinsert_missing_words(
            &words("Descend eh flight level"),
            &words("<s> <command=\"descend\"> descend flight level </command> </s>"),
        );
        assert_eq!(
            merged,
            "<s> <command=\"descend\"> Descend eh flight level </command> </s>"
        );
    }

    #[test]
    fn test_leading_words_move_before_tag() {
        let merged = reinsert_missing_words(
            &words("hello lufthansa one"),
            &words("<s> <callsign> lufthansa one </callsign> </s>"),
        );
        assert_eq!(merged, "<s> hello <callsign> lufthansa one </callsign> </s>");
    }

    #[test]
    fn test_trailing_words_end_up_before_sentence_close() {
        let merged = reinsert_missing_words(
            &words("lufthansa one bye bye"),
            &words("<s> <callsign> lufthansa one </callsign> </s>"),
        );
        assert_eq!(merged, "<s> <callsign> lufthansa one </callsign> bye bye </s>");
    }

    #[test]
    fn test_empty_parse_returns_input() {
        assert_eq!(reinsert_missing_words(&words("a b"), &[]), "a b");
    }
}
