//! Tag syntax shared by the transducer and the tag frames.

use std::sync::LazyLock;

use regex::Regex;

pub const SENTENCE_OPEN: &str = "<s>";
pub const SENTENCE_CLOSE: &str = "</s>";
pub const CALLSIGN_OPEN: &str = "<callsign>";
pub const CALLSIGN_CLOSE: &str = "</callsign>";
pub const COMMANDS_OPEN: &str = "<commands>";
pub const COMMAND_CLOSE: &str = "</command>";

static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^</?(.+?)>").unwrap());
static OPEN_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^<([a-z_]+)>$").unwrap());
static OPEN_ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^<([a-z_="]+)>$"#).unwrap());
static CLOSE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^</([a-z_]+)>$").unwrap());
static COMMAND_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^<command="([a-z_]+)">"#).unwrap());
static MARKUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Name inside any tag-looking word: `command="descend"` for
/// `<command="descend">`, `callsign` for `</callsign>`.
pub fn tag_name(word: &str) -> Option<&str> {
    ANY_TAG
        .captures(word)
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str())
}

pub fn is_closing(word: &str) -> bool {
    word.starts_with("</")
}

/// Closing tag for a tag name; commands close with a plain `</command>`.
pub fn closing_tag(name: &str) -> String {
    if name.starts_with("command=") {
        COMMAND_CLOSE.to_string()
    } else {
        format!("</{name}>")
    }
}

/// Name used to match an open tag against a closing one.
pub fn base_name(name: &str) -> &str {
    if name.starts_with("command=") {
        "command"
    } else {
        name
    }
}

/// Simple opening tag such as `<speed>`, without attributes.
pub fn open_tag_name(word: &str) -> Option<&str> {
    OPEN_TAG
        .captures(word)
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str())
}

/// Opening tag including the `<command="x">` form.
pub fn open_any_tag_name(word: &str) -> Option<&str> {
    OPEN_ANY_TAG
        .captures(word)
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str())
}

pub fn close_tag_name(word: &str) -> Option<&str> {
    CLOSE_TAG
        .captures(word)
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str())
}

/// Command type of a `<command="type">` tag.
pub fn command_type(word: &str) -> Option<&str> {
    COMMAND_OPEN
        .captures(word)
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str())
}

pub fn is_command_open(word: &str) -> bool {
    COMMAND_OPEN.is_match(word)
}

/// Removes all markup from a tagged string and normalizes whitespace.
pub fn strip_tags(text: &str) -> String {
    MARKUP
        .replace_all(text, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_names() {
        assert_eq!(tag_name("<callsign>"), Some("callsign"));
        assert_eq!(tag_name("</callsign>"), Some("callsign"));
        assert_eq!(tag_name("<command=\"descend\">"), Some("command=\"descend\""));
        assert_eq!(tag_name("descend"), None);
        assert_eq!(open_tag_name("<command=\"descend\">"), None);
        assert_eq!(open_any_tag_name("<command=\"descend\">"), Some("command=\"descend\""));
        assert_eq!(command_type("<command=\"turn_heading\">"), Some("turn_heading"));
        assert_eq!(close_tag_name("</flightlevel>"), Some("flightlevel"));
    }

    #[test]
    fn test_closing_tag() {
        assert_eq!(closing_tag("command=\"descend\""), "</command>");
        assert_eq!(closing_tag("s"), "</s>");
        assert_eq!(base_name("command=\"descend\""), "command");
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(
            strip_tags("<s> <callsign>lufthansa</callsign> descend </s>"),
            "lufthansa descend"
        );
    }
}
