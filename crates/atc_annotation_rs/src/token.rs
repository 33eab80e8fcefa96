//! Confidence-tagged words as produced by a recognizer, e.g. `lufthansa:0.93`.

use std::io::BufRead;

use crate::errors::Error;

pub const CONFIDENCE_SEPARATOR: char = ':';
pub const DEFAULT_CONFIDENCE: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub word: String,
    pub confidence: f64,
}

impl Token {
    pub fn new(word: impl Into<String>, confidence: f64) -> Self {
        Self {
            word: word.into(),
            confidence,
        }
    }

    /// Splits `word:conf` at the last separator. Words without a suffix get
    /// the default confidence.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        match raw.rsplit_once(CONFIDENCE_SEPARATOR) {
            Some((word, value)) => {
                let confidence = value.parse().map_err(|_| Error::InvalidConfidence {
                    token: raw.to_string(),
                    value: value.to_string(),
                })?;
                Ok(Self::new(word, confidence))
            }
            None => Ok(Self::new(raw, DEFAULT_CONFIDENCE)),
        }
    }
}

/// The word a search compares against the grammar: lowercased, with a
/// numeric confidence suffix after the last separator removed.
pub fn observation(raw: &str) -> String {
    let word = match raw.rsplit_once(CONFIDENCE_SEPARATOR) {
        Some((word, value)) if value.parse::<f64>().is_ok() => word,
        _ => raw,
    };
    word.to_lowercase()
}

/// Reads recognizer output with one token per line where the last two columns
/// are word and confidence, producing `word:conf` tokens.
pub fn tokens_from_mbr<R: std::io::Read>(reader: R) -> Result<Vec<String>, Error> {
    let mut tokens = Vec::new();
    for line in std::io::BufReader::new(reader).lines() {
        let line = line?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [.., word, confidence] = fields.as_slice() else {
            continue;
        };
        if confidence.parse::<f64>().is_err() {
            return Err(Error::InvalidConfidence {
                token: word.to_string(),
                value: confidence.to_string(),
            });
        }
        tokens.push(format!(
            "{}{CONFIDENCE_SEPARATOR}{confidence}",
            word.to_lowercase()
        ));
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token() {
        assert_eq!(Token::parse("descend").unwrap(), Token::new("descend", 1.0));
        assert_eq!(
            Token::parse("descend:0.25").unwrap(),
            Token::new("descend", 0.25)
        );
        assert!(matches!(
            Token::parse("descend:high"),
            Err(Error::InvalidConfidence { .. })
        ));
    }

    #[test]
    fn test_observation() {
        assert_eq!(observation("Lufthansa:0.9"), "lufthansa");
        assert_eq!(observation("FOUR"), "four");
        assert_eq!(observation("foo:bar"), "foo:bar");
        assert_eq!(observation("a:b:0.5"), "a:b");
    }

    #[test]
    fn test_parse_and_observation_agree_on_suffix() {
        let token = Token::parse("a:b:0.5").unwrap();
        assert_eq!(token, Token::new("a:b", 0.5));
        assert_eq!(observation("a:b:0.5"), token.word);
        assert!(Token::parse("foo:bar").is_err());
    }

    #[test]
    fn test_tokens_from_mbr() {
        let mbr = "utt 1 0.00 0.31 Lufthansa 0.93\nutt 1 0.31 0.12 four 0.71\n\n";
        let tokens = tokens_from_mbr(mbr.as_bytes()).unwrap();
        assert_eq!(tokens, vec!["lufthansa:0.93", "four:0.71"]);
    }
}
