//! Spoken number grammar
//!
//! Turns spoken digit sequences into their written form, e.g.
//! `two thousand five hundred` into `2500` or `double seven` into `77`.
//! Spelled letters and `decimal` pass through as characters so flight numbers
//! like `four five kilo` become `45K`.

use super::alphabet::{alphanumeric, is_single_digit};

/// 11..19 mapped to their last digit; the leading one is inserted while parsing.
pub const TEEN_DIGITS: &[(&str, &str)] = &[
    ("eleven", "one"),
    ("twelve", "two"),
    ("thirteen", "three"),
    ("fourteen", "four"),
    ("fifteen", "five"),
    ("sixteen", "six"),
    ("seventeen", "seven"),
    ("eighteen", "eight"),
    ("eightteen", "eight"),
    ("nineteen", "nine"),
];

/// 10..90 mapped to their first digit; the trailing zero is inserted while parsing.
pub const TENS_DIGITS: &[(&str, &str)] = &[
    ("ten", "one"),
    ("twenty", "two"),
    ("thirty", "three"),
    ("forty", "four"),
    ("fifty", "five"),
    ("sixty", "six"),
    ("seventy", "seven"),
    ("eighty", "eight"),
    ("ninety", "nine"),
];

pub const MULTIPLIERS: &[(&str, usize)] = &[("double", 2), ("triple", 3)];

const HUNDRED: &str = "hundred";
const THOUSAND: &str = "thousand";
const ZERO: &str = "zero";
const AND: &str = "and";

fn lookup<'a>(table: &[(&str, &'a str)], word: &str) -> Option<&'a str> {
    table
        .iter()
        .find(|(key, _)| *key == word)
        .map(|(_, value)| *value)
}

fn is_tens(word: &str) -> bool {
    lookup(TENS_DIGITS, word).is_some()
}

fn is_teen(word: &str) -> bool {
    lookup(TEEN_DIGITS, word).is_some()
}

/// Whether a word can take part in a spoken number.
pub fn is_number_word(word: &str) -> bool {
    alphanumeric(word).is_some()
        || is_tens(word)
        || is_teen(word)
        || MULTIPLIERS.iter().any(|(multiple, _)| *multiple == word)
        || matches!(word, HUNDRED | THOUSAND | AND)
}

/// Expands the zeros a spoken `hundred`/`thousand` stands for. `width` is the
/// number of zeros the multiplier represents.
fn expand_multiplier(items: &mut Vec<&str>, multiplier: &str, width: usize) {
    let continues_with_hundred = multiplier == THOUSAND;
    while let Some(i) = items.iter().position(|item| *item == multiplier) {
        let next = i + 1;
        if next >= items.len() {
            items.extend(std::iter::repeat_n(ZERO, width));
        } else if continues_with_hundred && items.get(next + 1) == Some(&HUNDRED) {
            // "x thousand y hundred" continues as "x y hundred"
        } else {
            let follower = items[next];
            let mut zeros = width;
            if is_tens(follower) || is_teen(follower) {
                zeros -= 2;
            } else if is_single_digit(follower) {
                zeros -= 1;
            }
            for _ in 0..zeros {
                items.insert(next, ZERO);
            }
        }
        items.remove(i);
    }
}

pub fn parse_spoken_number<'a, I>(words: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut items: Vec<&str> = words
        .into_iter()
        .filter(|word| is_number_word(word) && *word != AND)
        .collect();

    // A dropped digit before thousand/hundred was a one
    if matches!(items.first(), Some(&HUNDRED) | Some(&THOUSAND)) {
        items.insert(0, "one");
    }

    expand_multiplier(&mut items, THOUSAND, 3);
    expand_multiplier(&mut items, HUNDRED, 2);

    for (multiple, count) in MULTIPLIERS {
        while let Some(i) = items.iter().position(|item| item == multiple) {
            if let Some(&repeated) = items.get(i + 1) {
                for _ in 1..*count {
                    items.insert(i + 1, repeated);
                }
            }
            items.remove(i);
        }
    }

    for (tens, digit) in TENS_DIGITS {
        while let Some(i) = items.iter().position(|item| item == tens) {
            items[i] = *digit;
            match items.get(i + 1) {
                None => items.push(ZERO),
                Some(&next) if !is_single_digit(next) || next == ZERO => {
                    items.insert(i + 1, ZERO)
                }
                Some(_) => {}
            }
        }
    }

    for (teen, digit) in TEEN_DIGITS {
        while let Some(i) = items.iter().position(|item| item == teen) {
            items[i] = *digit;
            items.insert(i, "one");
        }
    }

    items.into_iter().filter_map(alphanumeric).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(spoken: &str) -> String {
        parse_spoken_number(spoken.split_whitespace())
    }

    #[test]
    fn test_digit_sequences() {
        assert_eq!(parse("one two three"), "123");
        assert_eq!(parse("zero niner seven"), "097");
        assert_eq!(parse("four five kilo"), "45K");
    }

    #[test]
    fn test_hundreds_and_thousands() {
        assert_eq!(parse("two thousand"), "2000");
        assert_eq!(parse("fifteen hundred"), "1500");
        assert_eq!(parse("hundred"), "100");
        assert_eq!(parse("two thousand five hundred"), "2500");
        assert_eq!(parse("two thousand five"), "2005");
        assert_eq!(parse("two thousand twenty"), "2020");
        assert_eq!(parse("one thousand two hundred and fifty"), "1250");
        assert_eq!(parse("thousand"), "1000");
    }

    #[test]
    fn test_tens_and_teens() {
        assert_eq!(parse("twenty five"), "25");
        assert_eq!(parse("twenty"), "20");
        assert_eq!(parse("ten"), "10");
        assert_eq!(parse("eighteen"), "18");
        assert_eq!(parse("eightteen"), "18");
        assert_eq!(parse("one twenty"), "120");
    }

    #[test]
    fn test_multipliers() {
        assert_eq!(parse("double seven"), "77");
        assert_eq!(parse("triple one"), "111");
        assert_eq!(parse("one double two"), "122");
    }

    #[test]
    fn test_decimal_and_rogue_words() {
        assert_eq!(parse("one two one decimal eight"), "121.8");
        assert_eq!(parse("flight level _aeh_ three two zero"), "320");
        assert_eq!(parse(""), "");
    }
}
