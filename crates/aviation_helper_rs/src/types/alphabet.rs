/// Spelled letters as used on the radio, including the spellings found in
/// transcriptions (`charly`, `whisky`, `zoulou`).
pub const LETTERS: &[(&str, char)] = &[
    ("alpha", 'A'),
    ("bravo", 'B'),
    ("charly", 'C'),
    ("charlie", 'C'),
    ("delta", 'D'),
    ("echo", 'E'),
    ("foxtrot", 'F'),
    ("fox", 'F'),
    ("golf", 'G'),
    ("hotel", 'H'),
    ("india", 'I'),
    ("juliett", 'J'),
    ("juliet", 'J'),
    ("kilo", 'K'),
    ("lima", 'L'),
    ("mike", 'M'),
    ("november", 'N'),
    ("oscar", 'O'),
    ("papa", 'P'),
    ("quebec", 'Q'),
    ("romeo", 'R'),
    ("sierra", 'S'),
    ("tango", 'T'),
    ("uniform", 'U'),
    ("victor", 'V'),
    ("whisky", 'W'),
    ("whiskey", 'W'),
    ("xray", 'X'),
    ("yankee", 'Y'),
    ("zoulou", 'Z'),
    ("zulu", 'Z'),
];

pub const SINGLE_DIGITS: &[(&str, char)] = &[
    ("zero", '0'),
    ("one", '1'),
    ("two", '2'),
    ("three", '3'),
    ("four", '4'),
    ("five", '5'),
    ("six", '6'),
    ("seven", '7'),
    ("eight", '8'),
    ("nine", '9'),
    ("niner", '9'),
];

pub const DECIMAL: (&str, char) = ("decimal", '.');

pub fn letter(word: &str) -> Option<char> {
    LETTERS
        .iter()
        .find(|(spelled, _)| *spelled == word)
        .map(|(_, letter)| *letter)
}

pub fn is_letter(word: &str) -> bool {
    letter(word).is_some()
}

/// All spellings of a letter, e.g. `F` gives `foxtrot` and `fox`.
pub fn letter_words(letter: char) -> impl Iterator<Item = &'static str> {
    LETTERS
        .iter()
        .filter(move |(_, l)| *l == letter)
        .map(|(word, _)| *word)
}

pub fn digit(word: &str) -> Option<char> {
    SINGLE_DIGITS
        .iter()
        .find(|(spelled, _)| *spelled == word)
        .map(|(_, digit)| *digit)
}

pub fn is_single_digit(word: &str) -> bool {
    digit(word).is_some()
}

/// Digits, letters and `decimal`.
pub fn alphanumeric(word: &str) -> Option<char> {
    if word == DECIMAL.0 {
        return Some(DECIMAL.1);
    }
    digit(word).or_else(|| letter(word))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_lookup() {
        assert_eq!(letter("fox"), Some('F'));
        assert_eq!(letter("foxtrot"), Some('F'));
        assert_eq!(letter("zoulou"), Some('Z'));
        assert_eq!(letter("four"), None);
    }

    #[test]
    fn test_letter_words() {
        let words: Vec<_> = letter_words('F').collect();
        assert_eq!(words, vec!["foxtrot", "fox"]);
    }

    #[test]
    fn test_alphanumeric() {
        assert_eq!(alphanumeric("nine"), Some('9'));
        assert_eq!(alphanumeric("decimal"), Some('.'));
        assert_eq!(alphanumeric("kilo"), Some('K'));
        assert_eq!(alphanumeric("hundred"), None);
    }
}
