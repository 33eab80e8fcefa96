//! Tag-balanced token spans
//!
//! A [`TagFrame`] is the tagged output of the transducer (or a hand-written
//! annotation) split into confidence-carrying tokens. Construction repairs
//! the tag structure so every opened tag is closed inside the frame, and the
//! extraction methods cut sub-frames such as `<callsign>` or a single
//! `<command="...">` out of their parent.

use std::{fmt, sync::LazyLock};

use regex::Regex;

use crate::{
    confidence::ConfidenceMode,
    errors::Error,
    markup::{
        COMMAND_CLOSE, COMMANDS_OPEN, SENTENCE_OPEN, CALLSIGN_OPEN, close_tag_name, closing_tag,
        is_command_open, open_any_tag_name, open_tag_name, tag_name,
    },
    token::{DEFAULT_CONFIDENCE, Token},
};

/// Recognizer noise kept for confidence bookkeeping.
pub const NOISE_TOKENS: &[&str] = &["_spn_", "_nsn_"];
pub const NOISE_OPEN: &str = "<noise>";
pub const NOISE_CLOSE: &str = "</noise>";

static CONFIDENCE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":[0-9].[0-9]*").unwrap());

pub type TokenMatcher<'m> = &'m dyn Fn(&str) -> bool;

#[derive(Debug, Clone, PartialEq)]
pub struct TagFrame {
    tokens: Vec<Token>,
    strict: bool,
    /// Closing tags the repair pass found without an opener.
    unmatched_closings: Vec<String>,
}

impl TagFrame {
    /// Wraps already balanced tokens. Strict frames must start and end with
    /// a matching tag pair.
    pub fn new(tokens: Vec<Token>, strict: bool) -> Result<Self, Error> {
        let frame = Self {
            tokens,
            strict,
            unmatched_closings: Vec::new(),
        };
        if strict && !frame.is_bounded() {
            return Err(Error::InvalidFrame {
                kind: "tag",
                frame: frame.to_string(),
            });
        }
        Ok(frame)
    }

    fn from_parts(tokens: Vec<Token>, strict: bool) -> Self {
        Self {
            tokens,
            strict,
            unmatched_closings: Vec::new(),
        }
    }

    /// Parses tagged text such as `<s> <callsign> lufthansa:0.9 ...`.
    /// Missing spaces around tags and after confidence values are tolerated.
    /// Returns `None` for blank text.
    pub fn parse(text: &str, strict: bool) -> Result<Option<Self>, Error> {
        let spaced = text.replace('>', "> ").replace('<', " <");
        let separated: Vec<String> = spaced
            .split_whitespace()
            .map(|word| match CONFIDENCE_SUFFIX.find(word) {
                Some(suffix) => word.replace(suffix.as_str(), &format!(" {} ", suffix.as_str())),
                None => word.to_string(),
            })
            .collect();
        let normalized = separated
            .join(" ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .replace(" :", ":")
            .to_lowercase();
        if normalized.is_empty() {
            return Ok(None);
        }

        let tokens = normalized
            .split_whitespace()
            .map(Token::parse)
            .collect::<Result<Vec<_>, _>>()?;
        let (tokens, unmatched_closings) = repair(tokens);
        let mut frame = Self::new(tokens, strict)?;
        frame.unmatched_closings = unmatched_closings;
        Ok(Some(frame))
    }

    /// Builds a frame from recognizer output, one `... word confidence` per line.
    pub fn parse_mbr<R: std::io::Read>(reader: R, strict: bool) -> Result<Self, Error> {
        let tokens = crate::token::tokens_from_mbr(reader)?
            .iter()
            .map(|raw| Token::parse(raw))
            .collect::<Result<Vec<_>, _>>()?;
        let (tokens, unmatched_closings) = repair(tokens);
        let mut frame = Self::new(tokens, strict)?;
        frame.unmatched_closings = unmatched_closings;
        Ok(frame)
    }

    /// First and last token form a matching tag pair.
    pub fn is_bounded(&self) -> bool {
        let (Some(first), Some(last)) = (self.tokens.first(), self.tokens.last()) else {
            return false;
        };
        if self.tokens.len() < 2 {
            return false;
        }
        if is_command_open(&first.word) {
            return last.word == COMMAND_CLOSE;
        }
        open_tag_name(&first.word).is_some_and(|name| last.word == closing_tag(name))
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn unmatched_closings(&self) -> &[String] {
        &self.unmatched_closings
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Nothing but the boundary tags.
    pub fn is_empty_tag(&self) -> bool {
        self.tokens.len() <= 2
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    fn content(&self, content_only: bool) -> &[Token] {
        if !content_only {
            &self.tokens
        } else if self.tokens.len() >= 2 {
            &self.tokens[1..self.tokens.len() - 1]
        } else {
            &[]
        }
    }

    pub fn words(&self, content_only: bool) -> impl Iterator<Item = &str> {
        self.content(content_only)
            .iter()
            .map(|token| token.word.as_str())
    }

    pub fn confidences(&self, content_only: bool) -> impl Iterator<Item = f64> {
        self.content(content_only)
            .iter()
            .map(|token| token.confidence)
    }

    pub fn first_word(&self) -> Option<&str> {
        self.tokens.first().map(|token| token.word.as_str())
    }

    pub fn last_word(&self) -> Option<&str> {
        self.tokens.last().map(|token| token.word.as_str())
    }

    pub fn contains_any(&self, terms: &[&str]) -> bool {
        self.words(false).any(|word| terms.contains(&word))
    }

    /// Cuts out the span from the first token matching `start` up to the
    /// first token after it matching `end`. A span without an end runs to
    /// the end of the frame.
    fn extract_span(
        &self,
        start: impl Fn(&str) -> bool,
        end: impl Fn(&str, &str) -> bool,
    ) -> (Option<TagFrame>, TagFrame) {
        let Some(first) = self.tokens.iter().position(|token| start(&token.word)) else {
            return (None, self.clone());
        };
        let opener = self.tokens[first].word.as_str();
        let last = self.tokens[first + 1..]
            .iter()
            .position(|token| end(opener, &token.word))
            .map_or(self.tokens.len() - 1, |offset| first + 1 + offset);

        let inner = self.tokens[first..=last].to_vec();
        let mut outer = self.tokens[..first].to_vec();
        outer.extend_from_slice(&self.tokens[last + 1..]);
        (
            Some(Self::from_parts(inner, self.strict)),
            Self::from_parts(outer, self.strict),
        )
    }

    /// Splits off the first `<name>`...`</name>` span. Returns the span and
    /// the remaining frame, or `(None, self)` without a match.
    pub fn extract_tag(&self, name: &str) -> (Option<TagFrame>, TagFrame) {
        let open = format!("<{name}>");
        let close = closing_tag(name);
        self.extract_span(|word| word == open, |_, word| word == close)
    }

    /// Like [`TagFrame::extract_tag`] for the first tag named by any of `names`.
    pub fn extract_any_tag(&self, names: &[&str]) -> (Option<TagFrame>, TagFrame) {
        self.extract_span(
            |word| open_tag_name(word).is_some_and(|name| names.contains(&name)),
            |opener, word| tag_name(opener).is_some_and(|name| word == closing_tag(name)),
        )
    }

    /// Splits off the first `<command="...">` span, whatever its type.
    pub fn extract_command(&self) -> (Option<TagFrame>, TagFrame) {
        self.extract_span(is_command_open, |_, word| word == COMMAND_CLOSE)
    }

    /// Collects the noise tokens after `start` matched (or from the beginning)
    /// and before `end` matches, wrapped in `<noise>` tags.
    pub fn extract_noise(&self, start: Option<TokenMatcher>, end: Option<TokenMatcher>) -> TagFrame {
        let mut noise = vec![Token::new(NOISE_OPEN, DEFAULT_CONFIDENCE)];
        let mut started = start.is_none();
        for token in &self.tokens {
            if !started {
                started = start.is_some_and(|start| start(&token.word));
                continue;
            }
            if end.is_some_and(|end| end(&token.word)) {
                break;
            }
            if NOISE_TOKENS.contains(&token.word.as_str()) {
                noise.push(token.clone());
            }
        }
        noise.push(Token::new(NOISE_CLOSE, DEFAULT_CONFIDENCE));
        Self::from_parts(noise, self.strict)
    }

    /// Noise spoken between the sentence start and the callsign or first command.
    pub fn pre_command_noise(&self) -> TagFrame {
        self.extract_noise(
            Some(&|word: &str| word == SENTENCE_OPEN),
            Some(&|word: &str| word == CALLSIGN_OPEN || is_command_open(word)),
        )
    }

    /// Copy keeping the boundary tags and the content outside nested tags.
    pub fn filter(&self) -> TagFrame {
        if self.tokens.len() < 2 {
            return self.clone();
        }
        let mut filtered = vec![self.tokens[0].clone()];
        let mut depth = 0usize;
        for token in self.content(true) {
            if open_any_tag_name(&token.word).is_some() {
                depth += 1;
            } else if close_tag_name(&token.word).is_some() {
                depth = depth.saturating_sub(1);
            } else if depth == 0 {
                filtered.push(token.clone());
            }
        }
        filtered.extend(self.tokens.last().cloned());
        Self::from_parts(filtered, self.strict)
    }

    pub fn confidence_score(&self, mode: ConfidenceMode, content_only: bool) -> Option<f64> {
        joint_confidence([self], mode, content_only)
    }
}

/// Score over the tokens of all `frames` together.
pub fn joint_confidence<'f, I>(frames: I, mode: ConfidenceMode, content_only: bool) -> Option<f64>
where
    I: IntoIterator<Item = &'f TagFrame>,
{
    let values: Vec<f64> = frames
        .into_iter()
        .flat_map(|frame| frame.confidences(content_only))
        .collect();
    mode.aggregate(&values)
}

/// Balances the tags of a token list. Returns the repaired tokens and the
/// closing tags that had no opener.
pub fn repair(tokens: Vec<Token>) -> (Vec<Token>, Vec<String>) {
    let close = |repaired: &mut Vec<Token>, open: &str| {
        if let Some(name) = open_any_tag_name(open) {
            repaired.push(Token::new(closing_tag(name), DEFAULT_CONFIDENCE));
        }
    };

    let mut repaired = Vec::with_capacity(tokens.len());
    let mut open_tags: Vec<String> = Vec::new();
    let mut unmatched = Vec::new();
    for token in tokens {
        if open_any_tag_name(&token.word).is_some() {
            // Sibling commands never nest
            if is_command_open(&token.word) {
                while let Some(top) = open_tags.last() {
                    if top == SENTENCE_OPEN || top == COMMANDS_OPEN {
                        break;
                    }
                    if let Some(top) = open_tags.pop() {
                        close(&mut repaired, &top);
                    }
                }
            }
            open_tags.push(token.word.clone());
            repaired.push(token);
        } else if close_tag_name(&token.word).is_some() {
            let matching = open_tags.iter().rposition(|open| {
                open_any_tag_name(open).is_some_and(|name| closing_tag(name) == token.word)
            });
            match matching {
                Some(index) => {
                    for open in open_tags.drain(index + 1..).rev() {
                        close(&mut repaired, &open);
                    }
                    open_tags.pop();
                    repaired.push(token);
                }
                None => {
                    log::warn!("Closing tag {} has no opener, inserting one", token.word);
                    repaired.push(Token::new(
                        format!("<{}", &token.word[2..]),
                        DEFAULT_CONFIDENCE,
                    ));
                    unmatched.push(token.word.clone());
                    repaired.push(token);
                }
            }
        } else {
            repaired.push(token);
        }
    }
    while let Some(open) = open_tags.pop() {
        close(&mut repaired, &open);
    }
    (repaired, unmatched)
}

impl fmt::Display for TagFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let words: Vec<&str> = self.words(false).collect();
        write!(f, "{}", words.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(text: &str) -> TagFrame {
        TagFrame::parse(text, false).unwrap().unwrap()
    }

    fn words(frame: &TagFrame) -> String {
        frame.to_string()
    }

    #[test]
    fn test_parse_with_confidences_and_sloppy_spacing() {
        let frame = frame("<s><callsign>Lufthansa:0.9 four:0.5five</callsign></s>");
        assert_eq!(
            words(&frame),
            "<s> <callsign> lufthansa four five </callsign> </s>"
        );
        let confidences: Vec<f64> = frame.confidences(true).collect();
        assert_eq!(confidences, vec![1.0, 0.9, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn test_blank_text_has_no_frame() {
        assert!(TagFrame::parse("  ", false).unwrap().is_none());
    }

    #[test]
    fn test_invalid_confidence() {
        assert!(matches!(
            TagFrame::parse("<s> descend:x </s>", false),
            Err(Error::InvalidConfidence { .. })
        ));
    }

    #[test]
    fn test_repair_closes_open_tags() {
        let frame = frame("<s> <callsign> lufthansa <command=\"descend\"> descend");
        assert_eq!(
            words(&frame),
            "<s> <callsign> lufthansa </callsign> <command=\"descend\"> descend </command> </s>"
        );
    }

    #[test]
    fn test_repair_closes_down_to_match() {
        let frame = frame("<s> <callsign> <airline> lufthansa </callsign> </s>");
        assert_eq!(
            words(&frame),
            "<s> <callsign> <airline> lufthansa </airline> </callsign> </s>"
        );
    }

    #[test]
    fn test_repair_inserts_opener_for_unmatched_close() {
        let frame = frame("<s> descend </flightlevel> </s>");
        assert_eq!(words(&frame), "<s> descend <flightlevel> </flightlevel> </s>");
        assert_eq!(frame.unmatched_closings(), ["</flightlevel>"]);
    }

    #[test]
    fn test_repair_is_idempotent() {
        for text in [
            "<s> <callsign> lufthansa <command=\"descend\"> descend",
            "<s> descend </flightlevel> </s>",
            "<s> <command=\"turn\"> <direction> left </command> </s>",
            "<s> <commands> <command=\"descend\"> descend </flightlevel> </command> </commands> </s>",
            "<s> <callsign> lufthansa <command=\"descend\"> descend </command> </s>",
            "<s> <commands> <callsign> lufthansa <command=\"turn\"> <direction> left <command=\"descend\"> descend </commands>",
        ] {
            let once = frame(text);
            let twice = frame(&once.to_string());
            assert_eq!(once.tokens(), twice.tokens());
            assert!(twice.unmatched_closings().is_empty());
        }
    }

    #[test]
    fn test_repair_inside_commands() {
        let unmatched = frame(
            "<s> <commands> <command=\"descend\"> descend </flightlevel> </command> </commands> </s>",
        );
        assert_eq!(
            words(&unmatched),
            "<s> <commands> <command=\"descend\"> descend <flightlevel> </flightlevel> </command> </commands> </s>"
        );
        assert_eq!(unmatched.unmatched_closings(), ["</flightlevel>"]);

        let nested = frame(
            "<s> <commands> <callsign> lufthansa <command=\"turn\"> <direction> left <command=\"descend\"> descend </commands>",
        );
        assert_eq!(
            words(&nested),
            "<s> <commands> <callsign> lufthansa </callsign> <command=\"turn\"> <direction> left </direction> </command> <command=\"descend\"> descend </command> </commands> </s>"
        );
    }

    #[test]
    fn test_strict_requires_boundary_tags() {
        assert!(TagFrame::parse("<s> hello </s>", true).is_ok());
        assert!(matches!(
            TagFrame::parse("hello <s> world", true),
            Err(Error::InvalidFrame { .. })
        ));
    }

    #[test]
    fn test_extract_tag() {
        let sentence = frame("<s> <callsign> lufthansa </callsign> descend </s>");
        let (callsign, rest) = sentence.extract_tag("callsign");
        assert_eq!(words(&callsign.unwrap()), "<callsign> lufthansa </callsign>");
        assert_eq!(words(&rest), "<s> descend </s>");

        let (missing, rest) = sentence.extract_tag("airline");
        assert!(missing.is_none());
        assert_eq!(rest, sentence);
    }

    #[test]
    fn test_extract_any_tag() {
        let command = frame("<command=\"descend\"> <below> below </below> </command>");
        let (limit, _) = command.extract_any_tag(&["less", "below"]);
        assert_eq!(words(&limit.unwrap()), "<below> below </below>");
        assert!(command.extract_any_tag(&["above"]).0.is_none());
    }

    #[test]
    fn test_extract_commands_in_order() {
        let sentence = frame(
            "<s> <command=\"descend\"> descend </command> <command=\"turn\"> turn </command> </s>",
        );
        let (first, rest) = sentence.extract_command();
        assert_eq!(words(&first.unwrap()), "<command=\"descend\"> descend </command>");
        let (second, rest) = rest.extract_command();
        assert_eq!(words(&second.unwrap()), "<command=\"turn\"> turn </command>");
        assert!(rest.extract_command().0.is_none());
    }

    #[test]
    fn test_pre_command_noise() {
        let sentence = frame("<s> _spn_:0.5 hello _nsn_ <command=\"descend\"> _spn_ </command> </s>");
        let noise = sentence.pre_command_noise();
        assert_eq!(words(&noise), "<noise> _spn_ _nsn_ </noise>");
        assert_eq!(noise.confidence_score(ConfidenceMode::Min, true), Some(0.5));
    }

    #[test]
    fn test_filter_discards_nested_spans() {
        let command = frame(
            "<command=\"descend\"> descend <flightlevel> flight level three </flightlevel> now </command>",
        );
        assert_eq!(
            words(&command.filter()),
            "<command=\"descend\"> descend now </command>"
        );
    }

    #[test]
    fn test_joint_confidence() {
        let a = frame("<airline> lufthansa:0.5 </airline>");
        let b = frame("<flightnumber> four:0.25 </flightnumber>");
        assert_eq!(joint_confidence([&a, &b], ConfidenceMode::Prod, true), Some(0.125));
        assert_eq!(joint_confidence([&a, &b], ConfidenceMode::Off, true), None);
        let empty = frame("<airline> </airline>");
        assert_eq!(empty.confidence_score(ConfidenceMode::AMean, true), Some(-1.0));
    }

    #[test]
    fn test_parse_mbr() {
        let mbr = "utt 1 0.00 0.42 Lufthansa 0.93\nutt 1 0.42 0.10 four 1.00\n";
        let frame = TagFrame::parse_mbr(mbr.as_bytes(), false).unwrap();
        assert_eq!(words(&frame), "lufthansa four");
        assert_eq!(frame.confidences(false).collect::<Vec<_>>(), vec![0.93, 1.0]);
    }
}
