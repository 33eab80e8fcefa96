//! Which tags hold the value of each command type, and how its concept is
//! modified.

use super::limit::{EITHER_LIMIT, LimitRule, OR_ABOVE, OR_BELOW};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Number,
    Waypoint,
    Runway,
    Contact,
    Frequency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueTag {
    pub tag: &'static str,
    pub metric: Option<&'static str>,
    pub kind: ValueKind,
    /// Replaces the concept when this tag holds the value.
    pub concept: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    None,
    /// Appends a limit suffix, if any, to the command's own concept.
    Limit(LimitRule),
    /// Always renames the concept, then appends a limit suffix, if any.
    RenamedLimit(&'static str, LimitRule),
    /// Renames the concept only when a limit was spoken.
    LimitOverride(&'static str, LimitRule),
    /// `TURN_BY`, or `TURN_LEFT_BY` with a direction.
    TurnBy,
    /// `TURN_LEFT_HEADING`; illegal without a direction.
    TurnToHeading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandRule {
    pub command_type: &'static str,
    /// Candidate value tags in priority order.
    pub values: &'static [ValueTag],
    pub modifier: Modifier,
    /// Legal even when no value was spoken.
    pub value_optional: bool,
    /// Concept used when no value was spoken.
    pub without_value: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleLookup {
    Rule(&'static CommandRule),
    /// Known type without an actionable concept.
    Acknowledgement,
    Unknown,
}

const fn number(tag: &'static str) -> ValueTag {
    ValueTag {
        tag,
        metric: None,
        kind: ValueKind::Number,
        concept: None,
    }
}

const HEIGHT: &[ValueTag] = &[
    ValueTag {
        metric: Some("FL"),
        ..number("flightlevel")
    },
    ValueTag {
        metric: Some("ALT"),
        ..number("altitude")
    },
];
const FEET_PER_MINUTE: &[ValueTag] = &[number("feet_per_minute")];
const SPEED: &[ValueTag] = &[number("speed")];
const DEGREE_RELATIVE: &[ValueTag] = &[number("degree_relative")];
const DEGREE_ABSOLUTE: &[ValueTag] = &[number("degree_absolute")];
const WAYPOINT: &[ValueTag] = &[
    ValueTag {
        kind: ValueKind::Waypoint,
        ..number("waypoint")
    },
    ValueTag {
        kind: ValueKind::Waypoint,
        ..number("fix")
    },
];
const RUNWAY: &[ValueTag] = &[ValueTag {
    kind: ValueKind::Runway,
    ..number("runway")
}];
const CONTACT: &[ValueTag] = &[
    ValueTag {
        kind: ValueKind::Contact,
        ..number("contact")
    },
    ValueTag {
        kind: ValueKind::Frequency,
        concept: Some("HANDOVER_FREQUENCY"),
        ..number("frequency")
    },
];

const fn rule(command_type: &'static str, values: &'static [ValueTag], modifier: Modifier) -> CommandRule {
    CommandRule {
        command_type,
        values,
        modifier,
        value_optional: false,
        without_value: None,
    }
}

const fn optional(command_type: &'static str, values: &'static [ValueTag], modifier: Modifier) -> CommandRule {
    CommandRule {
        value_optional: true,
        ..rule(command_type, values, modifier)
    }
}

pub const COMMAND_RULES: &[CommandRule] = &[
    rule("descend", HEIGHT, Modifier::Limit(OR_BELOW)),
    rule("climb", HEIGHT, Modifier::Limit(OR_ABOVE)),
    rule("give_altitude", HEIGHT, Modifier::RenamedLimit("ALTITUDE", EITHER_LIMIT)),
    optional(
        "maintain_altitude",
        HEIGHT,
        Modifier::LimitOverride("ALTITUDE", EITHER_LIMIT),
    ),
    rule("rate_of_descent", FEET_PER_MINUTE, Modifier::Limit(OR_ABOVE)),
    rule("rate_of_climb", FEET_PER_MINUTE, Modifier::Limit(OR_BELOW)),
    rule("reduce", SPEED, Modifier::Limit(OR_BELOW)),
    rule("increase", SPEED, Modifier::Limit(OR_ABOVE)),
    rule("give_speed", SPEED, Modifier::RenamedLimit("SPEED", EITHER_LIMIT)),
    optional(
        "maintain_speed",
        SPEED,
        Modifier::LimitOverride("SPEED", EITHER_LIMIT),
    ),
    optional("speed_own", &[], Modifier::None),
    optional("reduce_final_app", &[], Modifier::None),
    optional("reduce_min_clean", &[], Modifier::None),
    rule("turn", DEGREE_RELATIVE, Modifier::TurnBy),
    rule("turn_heading", DEGREE_ABSOLUTE, Modifier::TurnToHeading),
    CommandRule {
        without_value: Some("MAINTAIN_HEADING"),
        ..rule("heading", DEGREE_ABSOLUTE, Modifier::None)
    },
    rule("transition", WAYPOINT, Modifier::None),
    rule("direct_to", WAYPOINT, Modifier::None),
    rule("cleared_ils", RUNWAY, Modifier::None),
    rule("handover", CONTACT, Modifier::None),
];

pub const ACKNOWLEDGEMENT_TYPES: &[&str] = &[
    "init_response",
    "report_speed",
    "expect_ils",
    "vector",
    "information",
    "report_established",
    "touchdown",
];

pub fn lookup(command_type: &str) -> RuleLookup {
    if let Some(rule) = COMMAND_RULES
        .iter()
        .find(|rule| rule.command_type == command_type)
    {
        RuleLookup::Rule(rule)
    } else if ACKNOWLEDGEMENT_TYPES.contains(&command_type) {
        RuleLookup::Acknowledgement
    } else {
        RuleLookup::Unknown
    }
}
