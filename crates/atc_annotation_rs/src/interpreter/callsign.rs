use std::fmt;

use aviation_helper_rs::{
    clearance::{airlines::Airlines, callsign_context::CallsignContext},
    types::{
        alphabet::{letter, letter_words},
        spoken_number::parse_spoken_number,
    },
};

use crate::{
    confidence::ConfidenceMode,
    errors::Error,
    markup::{CALLSIGN_CLOSE, CALLSIGN_OPEN},
    tag_frame::{TagFrame, joint_confidence},
};

pub const NO_CALLSIGN: &str = "NO_CALLSIGN";
pub const NO_AIRLINE: &str = "NO_AIRLINE_";
pub const UNKNOWN_AIRLINE: &str = "UNKNOWN_AIRLINE_";
pub const NO_FLIGHT_NUMBER: &str = "_NO_FLIGHTNUMBER";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AirlinePart {
    Code(String),
    /// Spoken, but not in the airline table.
    Unknown,
    Absent,
}

impl fmt::Display for AirlinePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AirlinePart::Code(code) => write!(f, "{code}"),
            AirlinePart::Unknown => write!(f, "{UNKNOWN_AIRLINE}"),
            AirlinePart::Absent => write!(f, "{NO_AIRLINE}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Callsign {
    airline: AirlinePart,
    flight_number: Option<String>,
    airline_frame: Option<TagFrame>,
    flight_number_frame: Option<TagFrame>,
    /// Noise before the first command, scored in place of a missing callsign.
    noise_frame: Option<TagFrame>,
}

impl Callsign {
    pub fn none() -> Self {
        Self {
            airline: AirlinePart::Absent,
            flight_number: None,
            airline_frame: None,
            flight_number_frame: None,
            noise_frame: None,
        }
    }

    /// Reads airline and flight number from a `<callsign>` frame and
    /// completes missing halves from the context.
    pub fn from_frame(
        frame: &TagFrame,
        airlines: &Airlines,
        context: &CallsignContext,
    ) -> Result<Self, Error> {
        if frame.is_strict()
            && (frame.first_word() != Some(CALLSIGN_OPEN) || frame.last_word() != Some(CALLSIGN_CLOSE))
        {
            return Err(Error::InvalidFrame {
                kind: "callsign",
                frame: frame.to_string(),
            });
        }

        let (airline_frame, rest) = frame.extract_tag("airline");
        let (flight_number_frame, _) = rest.extract_tag("flightnumber");

        let airline_word = spoken(&airline_frame).map(|frame| frame.words(true).collect::<Vec<_>>().join(" "));
        let flight_number = spoken(&flight_number_frame).map(|frame| parse_spoken_number(frame.words(true)));

        let mut callsign = Self {
            airline: AirlinePart::Absent,
            flight_number: None,
            airline_frame,
            flight_number_frame,
            noise_frame: None,
        };
        if airline_word.is_none() && flight_number.is_none() {
            return Ok(callsign);
        }

        let airline = match &airline_word {
            Some(word) => airlines
                .resolve(word)
                .map_or(AirlinePart::Unknown, |code| AirlinePart::Code(code.to_string())),
            None => AirlinePart::Absent,
        };
        let (airline, flight_number, _) = autocomplete(
            airline,
            flight_number,
            airline_word.as_deref(),
            airlines,
            context,
        );
        callsign.airline = airline;
        callsign.flight_number = flight_number;
        Ok(callsign)
    }

    pub fn is_callsign(&self) -> bool {
        self.airline != AirlinePart::Absent || self.flight_number.is_some()
    }

    pub fn airline(&self) -> &AirlinePart {
        &self.airline
    }

    pub fn flight_number(&self) -> Option<&str> {
        self.flight_number.as_deref()
    }

    /// Rendered callsign, e.g. `DLH456` or `NO_AIRLINE_123`.
    pub fn code(&self) -> String {
        if !self.is_callsign() {
            return NO_CALLSIGN.to_string();
        }
        format!(
            "{}{}",
            self.airline,
            self.flight_number.as_deref().unwrap_or(NO_FLIGHT_NUMBER)
        )
    }

    pub fn set_noise(&mut self, sentence: &TagFrame) {
        self.noise_frame = Some(sentence.pre_command_noise());
    }

    /// Frames the callsign score is computed over: airline and flight number,
    /// or the pre-command noise when no callsign was spoken.
    pub fn frames(&self) -> Vec<&TagFrame> {
        if self.is_callsign() {
            [&self.airline_frame, &self.flight_number_frame]
                .into_iter()
                .flatten()
                .collect()
        } else {
            self.noise_frame.iter().collect()
        }
    }

    pub fn confidence_score(&self, mode: ConfidenceMode) -> Option<f64> {
        joint_confidence(self.frames(), mode, true)
    }
}

/// A sub-frame with content between its tags.
fn spoken(frame: &Option<TagFrame>) -> Option<&TagFrame> {
    frame.as_ref().filter(|frame| !frame.is_empty_tag())
}

fn with_leading_zero(number: &str) -> [String; 2] {
    [number.to_string(), format!("0{number}")]
}

/// Fills in a missing airline or flight number from the context, restoring a
/// dropped leading zero, and retries spelled letters mistaken for airlines
/// and vice versa. Returns the input unchanged (and `false`) without a
/// unique match.
fn autocomplete(
    airline: AirlinePart,
    flight_number: Option<String>,
    airline_word: Option<&str>,
    airlines: &Airlines,
    context: &CallsignContext,
) -> (AirlinePart, Option<String>, bool) {
    if context.is_empty() {
        return (airline, flight_number, false);
    }

    match (&airline, flight_number.as_deref()) {
        (AirlinePart::Code(code), Some(number)) => {
            for candidate in with_leading_zero(number) {
                if context
                    .callsigns()
                    .iter()
                    .any(|known| &known.airline == code && known.flight_number == candidate)
                {
                    return (airline, Some(candidate), true);
                }
            }
        }
        (AirlinePart::Absent | AirlinePart::Unknown, Some(number)) => {
            for candidate in with_leading_zero(number) {
                if context.is_ambiguous_flight_number(&candidate) {
                    continue;
                }
                if let Some(known) = context
                    .callsigns()
                    .iter()
                    .find(|known| known.flight_number == candidate)
                {
                    return (AirlinePart::Code(known.airline.clone()), Some(candidate), true);
                }
            }
        }
        (AirlinePart::Code(code), None) => {
            if !context.is_ambiguous_airline(code) {
                if let Some(known) = context.callsigns().iter().find(|known| &known.airline == code) {
                    return (airline, Some(known.flight_number.clone()), true);
                }
            }
        }
        _ => {}
    }

    // A spelled letter heard as the airline belongs to the flight number
    if let Some(spelled) = airline_word.and_then(letter) {
        let number = format!("{spelled}{}", flight_number.as_deref().unwrap_or_default());
        let completed = autocomplete(AirlinePart::Absent, Some(number), None, airlines, context);
        if completed.2 {
            return completed;
        }
    }

    // A leading letter of the flight number may name an airline
    if airline == AirlinePart::Absent {
        if let Some(number) = flight_number.as_deref() {
            if let Some(first) = number.chars().next() {
                let tail = &number[first.len_utf8()..];
                for word in letter_words(first) {
                    let Some(code) = airlines.code_for(word) else {
                        continue;
                    };
                    let completed = autocomplete(
                        AirlinePart::Code(code.to_string()),
                        (!tail.is_empty()).then(|| tail.to_string()),
                        None,
                        airlines,
                        context,
                    );
                    if completed.2 {
                        return completed;
                    }
                }
            }
        }
    }

    (airline, flight_number, false)
}
