//! Compiled recognition grammar
//!
//! The grammar is the text export of the recognizer's finite state
//! transducer: one arc per row, `inNode \t outNode \t inWord \t outWord
//! [\t weight]`, plus rows holding only a node id (optionally followed by a
//! final weight) that mark terminal nodes. Output words are either spoken
//! words, `<eps>`, or markup such as `<callsign>`, `</callsign>` and
//! `<command="descend">`.

use std::{
    collections::{BTreeMap, HashMap},
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::errors::Error;

pub type NodeId = u32;

pub const START_NODE: NodeId = 0;
pub const EPSILON: &str = "<eps>";

#[derive(Debug, Clone, PartialEq)]
pub struct GrammarArc {
    pub input: String,
    /// Lowercased output word.
    pub output: String,
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GrammarNode {
    Terminal,
    Branching(BTreeMap<NodeId, Vec<GrammarArc>>),
}

#[derive(Debug, Clone, Default)]
pub struct GrammarModel {
    name: String,
    nodes: HashMap<NodeId, GrammarNode>,
}

fn parse_field<T: std::str::FromStr>(row: usize, what: &str, field: &str) -> Result<T, Error> {
    field.trim().parse().map_err(|_| Error::MalformedGrammarRow {
        row,
        reason: format!("invalid {what} {field:?}"),
    })
}

impl GrammarModel {
    pub fn load_grammar<R>(reader: R, name: impl Into<String>) -> Result<Self, Error>
    where
        R: std::io::Read,
    {
        let mut grammar = GrammarModel {
            name: name.into(),
            nodes: HashMap::new(),
        };
        for (index, line) in BufReader::new(reader).lines().enumerate() {
            let row = index + 1;
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            match fields.as_slice() {
                [node] => grammar.mark_terminal(parse_field(row, "node id", node)?),
                [node, weight] => {
                    parse_field::<f64>(row, "final weight", weight)?;
                    grammar.mark_terminal(parse_field(row, "node id", node)?);
                }
                [from, to, input, output, rest @ ..] if rest.len() <= 1 => {
                    let weight = match rest.first() {
                        Some(weight) => Some(parse_field(row, "weight", weight)?),
                        None => None,
                    };
                    let arc = GrammarArc {
                        input: input.to_string(),
                        output: output.to_lowercase(),
                        weight,
                    };
                    grammar.add_arc(
                        parse_field(row, "node id", from)?,
                        parse_field(row, "node id", to)?,
                        arc,
                    );
                }
                _ => {
                    return Err(Error::MalformedGrammarRow {
                        row,
                        reason: format!("expected 1, 2, 4 or 5 fields, found {}", fields.len()),
                    });
                }
            }
        }
        log::debug!(
            "Loaded grammar {:?} with {} nodes",
            grammar.name,
            grammar.nodes.len()
        );
        Ok(grammar)
    }

    pub fn load_grammar_from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::GrammarUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::load_grammar(file, name)
    }

    fn mark_terminal(&mut self, node: NodeId) {
        if let Some(GrammarNode::Branching(branches)) = self.nodes.get(&node) {
            if !branches.is_empty() {
                log::warn!("Terminal node {node} drops its outgoing arcs");
            }
        }
        self.nodes.insert(node, GrammarNode::Terminal);
    }

    fn add_arc(&mut self, from: NodeId, to: NodeId, arc: GrammarArc) {
        match self
            .nodes
            .entry(from)
            .or_insert_with(|| GrammarNode::Branching(BTreeMap::new()))
        {
            GrammarNode::Terminal => {
                log::warn!("Ignoring arc {from} -> {to} leaving terminal node {from}");
            }
            GrammarNode::Branching(branches) => branches.entry(to).or_default().push(arc),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, node: NodeId) -> Option<&GrammarNode> {
        self.nodes.get(&node)
    }

    pub fn is_terminal(&self, node: NodeId) -> bool {
        matches!(self.nodes.get(&node), Some(GrammarNode::Terminal))
    }

    /// Outgoing arcs with their target node. Terminal and unknown nodes have none.
    pub fn transitions(&self, node: NodeId) -> impl Iterator<Item = (NodeId, &GrammarArc)> {
        let branches = match self.nodes.get(&node) {
            Some(GrammarNode::Branching(branches)) => Some(branches),
            _ => None,
        };
        branches
            .into_iter()
            .flat_map(|branches| branches.iter())
            .flat_map(|(target, arcs)| arcs.iter().map(move |arc| (*target, arc)))
    }

    /// All arcs of the grammar as `(from, to, arc)`.
    pub fn arcs(&self) -> impl Iterator<Item = (NodeId, NodeId, &GrammarArc)> {
        self.nodes
            .keys()
            .flat_map(move |&from| self.transitions(from).map(move |(to, arc)| (from, to, arc)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAMMAR: &str = "0\t1\t<eps>\t<s>\n\
                           1\t2\thello\tHello\t0.5\n\
                           1\t2\thi\thi\n\
                           2\t3\t<eps>\t</s>\n\
                           3\n";

    #[test]
    fn test_load_grammar() {
        let grammar = GrammarModel::load_grammar(GRAMMAR.as_bytes(), "greeting").unwrap();
        assert_eq!(grammar.name(), "greeting");
        assert!(grammar.is_terminal(3));
        assert!(!grammar.is_terminal(1));

        let arcs: Vec<_> = grammar.transitions(1).collect();
        assert_eq!(arcs.len(), 2);
        assert_eq!(arcs[0].0, 2);
        assert_eq!(arcs[0].1.output, "hello");
        assert_eq!(arcs[0].1.weight, Some(0.5));
        assert_eq!(grammar.transitions(3).count(), 0);
        assert_eq!(grammar.transitions(42).count(), 0);
    }

    #[test]
    fn test_final_weight_row_marks_terminal() {
        let grammar = GrammarModel::load_grammar("0\t1\ta\ta\n1\t0.0\n".as_bytes(), "g").unwrap();
        assert!(grammar.is_terminal(1));
    }

    #[test]
    fn test_malformed_rows() {
        let result = GrammarModel::load_grammar("0\t1\ta\ta\nx\t2\tb\tb\n".as_bytes(), "g");
        assert!(matches!(
            result,
            Err(Error::MalformedGrammarRow { row: 2, .. })
        ));

        let result = GrammarModel::load_grammar("0\t1\ta\n".as_bytes(), "g");
        assert!(matches!(
            result,
            Err(Error::MalformedGrammarRow { row: 1, .. })
        ));

        let result = GrammarModel::load_grammar("0\t1\ta\ta\theavy\n".as_bytes(), "g");
        assert!(matches!(
            result,
            Err(Error::MalformedGrammarRow { row: 1, .. })
        ));
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let result = GrammarModel::load_grammar_from_file("/nonexistent/grammar.fst.txt");
        assert!(matches!(result, Err(Error::GrammarUnavailable { .. })));
    }
}
