use std::collections::{BTreeMap, HashSet};

use aviation_helper_rs::types::alphabet::{is_letter, is_single_digit};

use crate::{
    grammar::{GrammarModel, NodeId},
    markup::{COMMAND_CLOSE, is_command_open},
};

/// Words the grammar can emit, overall and per command.
#[derive(Debug, Clone, Default)]
pub struct VocabularyIndex {
    words: HashSet<String>,
    commands: BTreeMap<String, HashSet<String>>,
}

impl VocabularyIndex {
    pub fn new(grammar: &GrammarModel) -> Self {
        let mut words = HashSet::new();
        let mut entry_nodes: BTreeMap<String, Vec<NodeId>> = BTreeMap::new();
        for (_, to, arc) in grammar.arcs() {
            words.insert(arc.output.clone());
            if is_command_open(&arc.output) {
                entry_nodes.entry(arc.output.clone()).or_default().push(to);
            }
        }

        let commands = entry_nodes
            .into_iter()
            .map(|(tag, entries)| (tag, collect_until_close(grammar, entries)))
            .collect();

        Self { words, commands }
    }

    pub fn words(&self) -> &HashSet<String> {
        &self.words
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.to_lowercase())
    }

    /// Vocabulary of a command keyed by its opening tag, e.g. `<command="descend">`.
    pub fn command_vocabulary(&self, command_tag: &str) -> Option<&HashSet<String>> {
        self.commands.get(command_tag)
    }

    pub fn command_tags(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// Opening tags of commands that cannot occur in a sentence made of
    /// `observations`. Digits and spelled letters are shared by most
    /// commands and do not count as evidence.
    pub fn irrelevant_commands<'a, I>(&self, observations: I) -> HashSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let evidence: HashSet<&str> = observations
            .into_iter()
            .filter(|word| !is_single_digit(word) && !is_letter(word))
            .collect();
        self.commands
            .iter()
            .filter(|(_, vocabulary)| {
                vocabulary
                    .iter()
                    .all(|word| !evidence.contains(word.as_str()))
            })
            .map(|(tag, _)| tag.clone())
            .collect()
    }
}

/// Output words reachable from `entries` without crossing a command close.
fn collect_until_close(grammar: &GrammarModel, entries: Vec<NodeId>) -> HashSet<String> {
    let mut vocabulary = HashSet::new();
    let mut seen = HashSet::new();
    let mut pending = entries;
    while let Some(node) = pending.pop() {
        seen.insert(node);
        for (target, arc) in grammar.transitions(node) {
            if arc.output == COMMAND_CLOSE {
                continue;
            }
            vocabulary.insert(arc.output.clone());
            if !seen.contains(&target) {
                pending.push(target);
            }
        }
    }
    vocabulary
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAMMAR: &str = "0\t1\t<eps>\t<command=\"descend\">\n\
                           1\t2\tdescend\tdescend\n\
                           2\t2\tone\tone\n\
                           2\t3\t<eps>\t</command>\n\
                           0\t4\t<eps>\t<command=\"turn\">\n\
                           4\t5\tturn\tturn\n\
                           5\t3\t<eps>\t</command>\n\
                           3\t6\tbye\tbye\n\
                           6\n";

    fn index() -> VocabularyIndex {
        let grammar = GrammarModel::load_grammar(GRAMMAR.as_bytes(), "g").unwrap();
        VocabularyIndex::new(&grammar)
    }

    #[test]
    fn test_vocabulary() {
        let index = index();
        assert!(index.contains("descend"));
        assert!(index.contains("BYE"));
        assert!(index.contains("</command>"));
        assert!(!index.contains("climb"));
    }

    #[test]
    fn test_command_vocabulary_stops_at_close() {
        let index = index();
        let descend = index.command_vocabulary("<command=\"descend\">").unwrap();
        let expected: HashSet<String> = ["descend", "one"].map(String::from).into();
        assert_eq!(descend, &expected);
        let turn = index.command_vocabulary("<command=\"turn\">").unwrap();
        assert!(!turn.contains("bye"));
    }

    #[test]
    fn test_irrelevant_commands() {
        let index = index();
        let irrelevant = index.irrelevant_commands(["descend", "one", "bye"]);
        assert_eq!(irrelevant.len(), 1);
        assert!(irrelevant.contains("<command=\"turn\">"));

        // Digits alone are no evidence for a command
        let irrelevant = index.irrelevant_commands(["one"]);
        assert_eq!(irrelevant.len(), 2);
    }
}
