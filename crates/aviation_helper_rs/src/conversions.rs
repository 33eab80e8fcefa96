//! Spoken designators to their written form.

use crate::types::{
    alphabet::{alphanumeric, is_single_digit},
    spoken_number::parse_spoken_number,
};

pub const RUNWAY_SIDES: &[(&str, char)] = &[("left", 'L'), ("right", 'R')];

/// Named fixes that are spoken as a single word.
pub const WAYPOINTS: &[(&str, &str)] = &[
    ("metma", "METMA"),
    ("regno", "REGNO"),
    ("domux", "DOMUX"),
    ("waypoint", "Waypoint"),
];

/// Runway designators keep every digit as spoken, leading zeros included.
pub fn parse_runway<'a, I>(words: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    words
        .into_iter()
        .filter_map(|word| {
            alphanumeric(word).or_else(|| {
                RUNWAY_SIDES
                    .iter()
                    .find(|(side, _)| *side == word)
                    .map(|(_, letter)| *letter)
            })
        })
        .collect()
}

/// Frequencies without a spoken `decimal` get their point after the third digit.
pub fn parse_frequency<'a, I>(words: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let number = parse_spoken_number(words);
    if !number.contains('.') && number.len() > 3 {
        format!("{}.{}", &number[..3], &number[3..])
    } else {
        number
    }
}

pub fn parse_waypoint<'a, I>(words: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut items: Vec<&str> = words
        .into_iter()
        .filter(|word| *word != "waypoint")
        .collect();
    let mut fix = String::new();
    if let Some(&first) = items.first() {
        if first == "lima" {
            // "lima" alone is short for "lima mike alpha"
            if items.get(1..3) != Some(&["mike", "alpha"][..]) {
                fix.push_str("LMA");
                items.remove(0);
            }
        } else if is_single_digit(first) || matches!(first, "hundred" | "thousand") {
            fix.push_str("DL");
        } else if let Some((_, name)) = WAYPOINTS.iter().find(|(spoken, _)| *spoken == first) {
            fix.push_str(name);
            items.remove(0);
        }
    }
    fix.push_str(&parse_spoken_number(items));
    fix
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(spoken: &str) -> Vec<&str> {
        spoken.split_whitespace().collect()
    }

    #[test]
    fn test_parse_runway() {
        assert_eq!(parse_runway(words("two five left")), "25L");
        assert_eq!(parse_runway(words("zero eight right")), "08R");
        assert_eq!(parse_runway(words("runway two six")), "26");
    }

    #[test]
    fn test_parse_frequency() {
        assert_eq!(parse_frequency(words("one two one eight")), "121.8");
        assert_eq!(parse_frequency(words("one one niner decimal five")), "119.5");
        assert_eq!(parse_frequency(words("one two seven decimal three five")), "127.35");
        assert_eq!(parse_frequency(words("one two")), "12");
    }

    #[test]
    fn test_parse_waypoint() {
        assert_eq!(parse_waypoint(words("metma")), "METMA");
        assert_eq!(parse_waypoint(words("waypoint domux")), "DOMUX");
        assert_eq!(parse_waypoint(words("lima four")), "LMA4");
        assert_eq!(parse_waypoint(words("lima mike alpha four")), "LMA4");
        assert_eq!(parse_waypoint(words("four five")), "DL45");
        assert_eq!(parse_waypoint(words("kilo lima")), "KL");
    }
}
