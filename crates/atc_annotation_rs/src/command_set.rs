//! Callsign and commands of one utterance, and their rendering as
//! `CALLSIGN CONCEPT [VALUE] [METRIC] [scores...]` records.

use std::fmt;

use aviation_helper_rs::clearance::{airlines::Airlines, callsign_context::CallsignContext};
use serde::Serialize;

use crate::{
    confidence::{ConfidenceMode, format_score, round_score},
    errors::Error,
    interpreter::{Callsign, Command, NO_CONCEPT},
    tag_frame::{TagFrame, joint_confidence},
};

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    pub mode: ConfidenceMode,
    /// Reject frames without proper boundary tags.
    pub strict: bool,
    /// Score every rendered field.
    pub sub_confidences: bool,
    /// Close each record with the joint score of all its fields.
    pub total_confidence: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            mode: ConfidenceMode::Off,
            strict: false,
            sub_confidences: true,
            total_confidence: true,
        }
    }
}

/// One rendered command. Scores are rounded and only present when scoring
/// was requested.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandRecord {
    pub callsign: String,
    pub concept: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callsign_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concept_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_score: Option<f64>,
}

impl fmt::Display for CommandRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = [Some(&self.callsign), Some(&self.concept), self.value.as_ref(), self.metric.as_ref()]
            .into_iter()
            .flatten()
            .cloned();
        let scores = [
            self.callsign_score,
            self.concept_score,
            self.value_score,
            self.metric_score,
            self.total_score,
        ]
        .into_iter()
        .flatten()
        .map(format_score);
        let items: Vec<String> = fields.chain(scores).collect();
        write!(f, "{}", items.join(" "))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandSet {
    callsign: Callsign,
    commands: Vec<Command>,
    /// Illegal commands, kept for diagnostics.
    dropped: Vec<Command>,
}

impl CommandSet {
    /// Extracts the callsign and every command of an utterance frame. Without
    /// a legal command the set holds a single `NO_CONCEPT` command.
    pub fn from_frame(
        sentence: Option<&TagFrame>,
        airlines: &Airlines,
        context: &CallsignContext,
    ) -> Result<Self, Error> {
        let Some(sentence) = sentence else {
            return Ok(Self {
                callsign: Callsign::none(),
                commands: Vec::new(),
                dropped: Vec::new(),
            });
        };

        let (callsign_frame, mut rest) = sentence.extract_tag("callsign");
        let mut callsign = match callsign_frame {
            Some(frame) => Callsign::from_frame(&frame, airlines, context)?,
            None => Callsign::none(),
        };
        if !callsign.is_callsign() {
            callsign.set_noise(sentence);
        }

        let mut commands = Vec::new();
        let mut dropped = Vec::new();
        loop {
            let (frame, remaining) = rest.extract_command();
            let Some(frame) = frame else {
                break;
            };
            rest = remaining;
            let command = Command::from_frame(&frame)?;
            if command.is_legal() {
                commands.push(command);
            } else {
                dropped.push(command);
            }
        }
        if !dropped.is_empty() {
            log::debug!("Dropped {} illegal commands", dropped.len());
        }
        if commands.is_empty() {
            commands.push(Command::no_concept());
        }

        Ok(Self {
            callsign,
            commands,
            dropped,
        })
    }

    pub fn callsign(&self) -> &Callsign {
        &self.callsign
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn dropped(&self) -> &[Command] {
        &self.dropped
    }

    /// One record per command with a concept; without any, a single
    /// `NO_CONCEPT` record scored over whatever frames exist.
    pub fn records(&self, options: &ExtractOptions) -> Vec<CommandRecord> {
        let with_concept: Vec<&Command> = self
            .commands
            .iter()
            .filter(|command| command.has_concept())
            .collect();
        if !with_concept.is_empty() {
            return with_concept
                .into_iter()
                .map(|command| self.command_record(command, options))
                .collect();
        }
        if self.commands.is_empty() {
            return Vec::new();
        }
        vec![self.fallback_record(options)]
    }

    pub fn render(&self, options: &ExtractOptions) -> Vec<String> {
        self.records(options)
            .iter()
            .map(CommandRecord::to_string)
            .collect()
    }

    fn command_record(&self, command: &Command, options: &ExtractOptions) -> CommandRecord {
        let mode = options.mode;
        let sub = |score: Option<f64>| {
            (options.sub_confidences && mode.is_active()).then(|| round_score(score.unwrap_or(1.0)))
        };
        let value_score = command.value().and_then(|_| sub(command.value_score(mode)));
        let total = joint_confidence(
            self.callsign
                .frames()
                .into_iter()
                .chain(command.concept_frame())
                .chain(command.value_frame()),
            mode,
            true,
        );

        CommandRecord {
            callsign: self.callsign.code(),
            concept: command.concept().to_string(),
            value: command.value().map(str::to_string),
            metric: command.metric().map(str::to_string),
            callsign_score: sub(self.callsign.confidence_score(mode)),
            concept_score: sub(command.concept_score(mode)),
            value_score,
            metric_score: command.metric().and(value_score),
            total_score: total.filter(|_| options.total_confidence).map(round_score),
        }
    }

    fn fallback_record(&self, options: &ExtractOptions) -> CommandRecord {
        let mode = options.mode;
        let callsign_frames = self.callsign.frames();
        let concept_frames: Vec<&TagFrame> = self
            .commands
            .iter()
            .filter_map(Command::concept_frame)
            .collect();
        let value_frames: Vec<&TagFrame> = self
            .commands
            .iter()
            .filter_map(Command::value_frame)
            .collect();

        let sub = |frames: &[&TagFrame]| {
            joint_confidence(frames.iter().copied(), mode, true)
                .filter(|_| options.sub_confidences)
                .map(round_score)
        };
        let total = joint_confidence(
            callsign_frames
                .iter()
                .chain(&concept_frames)
                .chain(&value_frames)
                .copied(),
            mode,
            true,
        );

        CommandRecord {
            callsign: self.callsign.code(),
            concept: NO_CONCEPT.to_string(),
            value: None,
            metric: None,
            callsign_score: sub(&callsign_frames),
            concept_score: sub(&concept_frames),
            value_score: (!value_frames.is_empty())
                .then(|| sub(&value_frames))
                .flatten(),
            metric_score: None,
            total_score: total.filter(|_| options.total_confidence).map(round_score),
        }
    }
}
