use crate::tag_frame::TagFrame;

pub const LIMIT_POSITIVE: &[&str] = &["above", "more", "greater", "least"];
pub const LIMIT_NEGATIVE: &[&str] = &["below", "less", "most"];
const NEGATION_TAG: &str = "neg";

/// Words that allow the value to move in the command's direction, words
/// that forbid it, and the concept suffix each produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitRule {
    pub direction_terms: &'static [&'static str],
    pub direction_suffix: &'static str,
    pub boundary_terms: &'static [&'static str],
    pub boundary_suffix: &'static str,
}

pub const OR_BELOW: LimitRule = LimitRule {
    direction_terms: LIMIT_NEGATIVE,
    direction_suffix: "_OR_BELOW",
    boundary_terms: LIMIT_POSITIVE,
    boundary_suffix: "_NOT_BELOW",
};

pub const OR_ABOVE: LimitRule = LimitRule {
    direction_terms: LIMIT_POSITIVE,
    direction_suffix: "_OR_ABOVE",
    boundary_terms: LIMIT_NEGATIVE,
    boundary_suffix: "_NOT_ABOVE",
};

pub const EITHER_LIMIT: LimitRule = LimitRule {
    direction_terms: LIMIT_POSITIVE,
    direction_suffix: "_OR_ABOVE",
    boundary_terms: LIMIT_NEGATIVE,
    boundary_suffix: "_OR_BELOW",
};

impl LimitRule {
    /// Suffix for the limit spoken inside `command`, if any. A `<neg>` span
    /// swaps the meaning of the two word sets.
    pub fn parse(&self, command: &TagFrame) -> Option<&'static str> {
        let (negation, rest) = command.extract_tag(NEGATION_TAG);
        let (direction_terms, boundary_terms) = match negation {
            Some(_) => (self.boundary_terms, self.direction_terms),
            None => (self.direction_terms, self.boundary_terms),
        };

        let (direction, rest) = rest.extract_any_tag(direction_terms);
        if direction.is_some_and(|tag| !tag.is_empty_tag()) {
            return Some(self.direction_suffix);
        }
        let (boundary, rest) = rest.extract_any_tag(boundary_terms);
        if boundary.is_some_and(|tag| !tag.is_empty_tag()) {
            return Some(self.boundary_suffix);
        }

        // Untagged limit words inside the command span
        if rest.contains_any(direction_terms) {
            Some(self.direction_suffix)
        } else if rest.contains_any(boundary_terms) {
            Some(self.boundary_suffix)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(text: &str) -> TagFrame {
        TagFrame::parse(text, false).unwrap().unwrap()
    }

    #[test]
    fn test_tagged_limit() {
        let frame = command("<command=\"descend\"> <below> or below </below> </command>");
        assert_eq!(OR_BELOW.parse(&frame), Some("_OR_BELOW"));
        let frame = command("<command=\"descend\"> <above> not above </above> </command>");
        assert_eq!(OR_BELOW.parse(&frame), Some("_NOT_BELOW"));
    }

    #[test]
    fn test_untagged_limit() {
        let frame = command("<command=\"increase\"> increase speed or more </command>");
        assert_eq!(OR_ABOVE.parse(&frame), Some("_OR_ABOVE"));
        let frame = command("<command=\"give_speed\"> speed at most </command>");
        assert_eq!(EITHER_LIMIT.parse(&frame), Some("_OR_BELOW"));
        let frame = command("<command=\"descend\"> descend </command>");
        assert_eq!(OR_BELOW.parse(&frame), None);
    }

    #[test]
    fn test_negation_swaps_terms() {
        let frame = command("<command=\"climb\"> <neg> not </neg> more </command>");
        assert_eq!(OR_ABOVE.parse(&frame), Some("_NOT_ABOVE"));
    }
}
