use aviation_helper_rs::{
    conversions::{parse_frequency, parse_runway, parse_waypoint},
    types::spoken_number::parse_spoken_number,
};

use crate::{
    confidence::ConfidenceMode,
    errors::Error,
    markup::{COMMAND_CLOSE, command_type},
    tag_frame::TagFrame,
};

use super::rules::{self, CommandRule, Modifier, RuleLookup, ValueKind, ValueTag};

pub const NO_CONCEPT: &str = "NO_CONCEPT";

/// One command extracted from a `<command="...">` frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    command_type: String,
    concept: String,
    value: Option<String>,
    metric: Option<String>,
    legal: bool,
    /// Command content outside its nested tags.
    concept_frame: Option<TagFrame>,
    value_frame: Option<TagFrame>,
}

impl Command {
    pub fn from_frame(frame: &TagFrame) -> Result<Self, Error> {
        let command_type = frame.first_word().and_then(command_type);
        if frame.is_strict() && (command_type.is_none() || frame.last_word() != Some(COMMAND_CLOSE)) {
            return Err(Error::InvalidFrame {
                kind: "command",
                frame: frame.to_string(),
            });
        }
        let command_type = command_type.unwrap_or_default();

        let command = match rules::lookup(command_type) {
            RuleLookup::Rule(rule) => Self::interpret(rule, frame),
            RuleLookup::Acknowledgement => Self {
                concept_frame: Some(frame.filter()),
                ..Self::without_concept(command_type, true)
            },
            RuleLookup::Unknown => {
                log::debug!("Unknown command type {command_type:?} in {frame}");
                Self {
                    concept_frame: Some(frame.filter()),
                    ..Self::without_concept(command_type, false)
                }
            }
        };
        Ok(command)
    }

    /// The record standing in for an utterance without commands.
    pub fn no_concept() -> Self {
        Self::without_concept("", true)
    }

    fn without_concept(command_type: &str, legal: bool) -> Self {
        Self {
            command_type: command_type.to_string(),
            concept: NO_CONCEPT.to_string(),
            value: None,
            metric: None,
            legal,
            concept_frame: None,
            value_frame: None,
        }
    }

    fn interpret(rule: &CommandRule, frame: &TagFrame) -> Self {
        let mut concept = rule.command_type.to_uppercase();
        let mut concept_frame = frame.clone();
        let mut value_tag: Option<&ValueTag> = None;
        let mut value_frame = None;
        for candidate in rule.values {
            let (found, rest) = frame.extract_tag(candidate.tag);
            if found.is_some() {
                value_tag = Some(candidate);
                value_frame = found;
                concept_frame = rest;
                break;
            }
        }

        let mut command = Self {
            command_type: rule.command_type.to_string(),
            concept: String::new(),
            value: None,
            metric: None,
            legal: rule.value_optional,
            concept_frame: Some(concept_frame.filter()),
            value_frame: value_frame.clone(),
        };

        let (Some(value_tag), Some(value_frame)) = (
            value_tag,
            value_frame.filter(|frame| !frame.is_empty_tag()),
        ) else {
            if let Some(without_value) = rule.without_value {
                concept = without_value.to_string();
                command.legal = true;
            }
            command.concept = concept;
            return command;
        };

        match rule.modifier {
            Modifier::None => {}
            Modifier::Limit(limit) => {
                concept.push_str(limit.parse(&concept_frame).unwrap_or_default());
            }
            Modifier::RenamedLimit(renamed, limit) => {
                concept = format!("{renamed}{}", limit.parse(&concept_frame).unwrap_or_default());
            }
            Modifier::LimitOverride(renamed, limit) => {
                if let Some(suffix) = limit.parse(&concept_frame) {
                    concept = format!("{renamed}{suffix}");
                }
            }
            Modifier::TurnBy => {
                concept = match parse_direction(&concept_frame) {
                    Some(direction) => format!("TURN_{direction}_BY"),
                    None => "TURN_BY".to_string(),
                };
            }
            Modifier::TurnToHeading => match parse_direction(&concept_frame) {
                Some(direction) => concept = format!("TURN_{direction}_HEADING"),
                None => {
                    log::debug!("Turn to heading without a direction in {frame}");
                    command.concept = concept;
                    command.legal = false;
                    return command;
                }
            },
        }

        let words = value_frame.words(true);
        let value = match value_tag.kind {
            ValueKind::Number => strip_leading_zeros(parse_spoken_number(words)),
            ValueKind::Waypoint => parse_waypoint(words),
            ValueKind::Runway => parse_runway(words),
            ValueKind::Contact => words.collect::<Vec<_>>().join("_").to_uppercase(),
            ValueKind::Frequency => parse_frequency(words),
        };
        if let Some(renamed) = value_tag.concept {
            concept = renamed.to_string();
        }

        command.concept = concept;
        command.value = Some(value);
        command.metric = value_tag.metric.map(str::to_string);
        command.legal = true;
        command
    }

    pub fn command_type(&self) -> &str {
        &self.command_type
    }

    pub fn concept(&self) -> &str {
        &self.concept
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn metric(&self) -> Option<&str> {
        self.metric.as_deref()
    }

    /// Enough information was spoken to act on the command.
    pub fn is_legal(&self) -> bool {
        self.legal
    }

    pub fn has_concept(&self) -> bool {
        self.concept != NO_CONCEPT
    }

    pub fn concept_frame(&self) -> Option<&TagFrame> {
        self.concept_frame.as_ref()
    }

    pub fn value_frame(&self) -> Option<&TagFrame> {
        self.value_frame.as_ref()
    }

    pub fn concept_score(&self, mode: ConfidenceMode) -> Option<f64> {
        crate::tag_frame::joint_confidence(self.concept_frame.iter(), mode, true)
    }

    pub fn value_score(&self, mode: ConfidenceMode) -> Option<f64> {
        self.value_frame
            .as_ref()
            .and_then(|frame| frame.confidence_score(mode, true))
    }
}

/// `LEFT`, or the words of a longer direction joined by `_`.
fn parse_direction(command: &TagFrame) -> Option<String> {
    let (direction, _) = command.extract_tag("direction");
    direction
        .filter(|frame| !frame.is_empty_tag())
        .map(|frame| frame.words(true).collect::<Vec<_>>().join("_").to_uppercase())
}

/// `0320` becomes `320`; values that are not plain integers stay as they are.
fn strip_leading_zeros(number: String) -> String {
    if number.is_empty() || !number.bytes().all(|byte| byte.is_ascii_digit()) {
        return number;
    }
    match number.trim_start_matches('0') {
        "" => "0".to_string(),
        stripped => stripped.to_string(),
    }
}
