//! Cost-bounded search over the grammar, one work queue per input position.

use std::{
    collections::{HashSet, VecDeque},
    sync::atomic::{AtomicBool, Ordering},
    time::{Duration, Instant},
};

use crate::{
    errors::Error,
    grammar::{EPSILON, GrammarModel, NodeId, START_NODE},
    markup::{CALLSIGN_CLOSE, CALLSIGN_OPEN, base_name, closing_tag, is_closing, tag_name},
};

use super::{Parse, ParseCost, SearchHooks, SearchPhase, SearchProgress};

const SENTENCE_TAG: &str = "s";
/// States expanded between two wall clock checks.
const CLOCK_CHECK_INTERVAL: usize = 256;

#[derive(Debug, Clone)]
struct SearchState {
    output: Vec<String>,
    /// Index of the next unread token.
    position: usize,
    skips: usize,
    tag_cost: usize,
    open_tags: Vec<String>,
    node: NodeId,
    skipped: Vec<String>,
    in_callsign: bool,
}

/// Which tokens may be skipped and at what cost.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SkipPolicy<'a> {
    pub allow_skip: bool,
    pub noise_markers: &'a HashSet<String>,
    pub callsign_whitelist: &'a HashSet<String>,
    /// Airline names that are not spelled letters; never skipped.
    pub airlines: &'a HashSet<String>,
}

impl SkipPolicy<'_> {
    fn skip_cost(&self, observation: &str, in_callsign: bool) -> Option<usize> {
        let is_noise = self.noise_markers.contains(observation);
        let marked_out_of_grammar = !is_noise
            && observation.len() >= 2
            && observation.starts_with('_')
            && observation.ends_with('_');
        if !(self.allow_skip || is_noise) || self.airlines.contains(observation) {
            return None;
        }
        if in_callsign
            && !is_noise
            && !marked_out_of_grammar
            && !self.callsign_whitelist.contains(observation)
        {
            return None;
        }
        Some(if is_noise { 0 } else { 1 })
    }
}

/// Wall clock limits of a single search phase.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SearchBudget {
    soft_deadline: Option<Instant>,
    hard_deadline: Option<(Instant, Duration)>,
}

impl SearchBudget {
    pub fn new(timeout: Option<Duration>, hard_deadline: Option<Duration>) -> Self {
        let start = Instant::now();
        Self {
            soft_deadline: timeout.map(|timeout| start + timeout),
            hard_deadline: hard_deadline.map(|limit| (start + limit, limit)),
        }
    }

    fn is_exhausted(&self, cancel: Option<&AtomicBool>) -> Result<bool, Error> {
        let now = Instant::now();
        if let Some((deadline, limit)) = self.hard_deadline {
            if now >= deadline {
                return match cancel {
                    Some(_) => Ok(true),
                    None => Err(Error::Timeout(limit)),
                };
            }
        }
        Ok(self.soft_deadline.is_some_and(|deadline| now >= deadline))
    }
}

/// Per-call search bookkeeping: work queues, seen parses and best distance.
pub(crate) struct SearchContext<'a> {
    grammar: &'a GrammarModel,
    /// Lowercased tokens, confidence suffixes included.
    sentence: &'a [String],
    /// Tokens as compared against the grammar.
    observations: &'a [String],
    irrelevant_commands: &'a HashSet<String>,
    policy: SkipPolicy<'a>,
    phase: SearchPhase,
    levels: Vec<VecDeque<SearchState>>,
    seen: HashSet<(NodeId, String, String)>,
    best_distance: usize,
    complete: Vec<Parse>,
    expanded: usize,
}

impl<'a> SearchContext<'a> {
    pub fn new(
        grammar: &'a GrammarModel,
        sentence: &'a [String],
        observations: &'a [String],
        irrelevant_commands: &'a HashSet<String>,
        policy: SkipPolicy<'a>,
        phase: SearchPhase,
    ) -> Self {
        let mut levels = vec![VecDeque::new(); sentence.len() + 2];
        levels[0].push_back(SearchState {
            output: Vec::new(),
            position: 0,
            skips: 0,
            tag_cost: 0,
            open_tags: Vec::new(),
            node: START_NODE,
            skipped: Vec::new(),
            in_callsign: false,
        });
        Self {
            grammar,
            sentence,
            observations,
            irrelevant_commands,
            policy,
            phase,
            levels,
            seen: HashSet::new(),
            best_distance: usize::MAX,
            complete: Vec::new(),
            expanded: 0,
        }
    }

    /// Runs the search to completion, or until the budget runs out or the
    /// caller cancels, and returns the parses sorted best first.
    pub fn run(
        mut self,
        budget: &SearchBudget,
        hooks: &mut SearchHooks<'_>,
    ) -> Result<Vec<Parse>, Error> {
        let length = self.sentence.len();
        let mut position = 0;
        while position <= length {
            let cancelled = hooks
                .cancel
                .is_some_and(|cancel| cancel.load(Ordering::Relaxed));
            if cancelled || budget.is_exhausted(hooks.cancel)? {
                return Ok(self.finish_interrupted(position));
            }

            while let Some(state) = self.levels[position].pop_front() {
                self.expand(state);
                if self.expanded % CLOCK_CHECK_INTERVAL == 0 && budget.is_exhausted(hooks.cancel)? {
                    return Ok(self.finish_interrupted(position));
                }
            }
            position += 1;

            if let Some(progress) = hooks.progress.as_deref_mut() {
                let best = sort_parses(
                    self.complete.clone(),
                    Some(self.force_close(self.levels[position].iter())),
                )
                .into_iter()
                .next();
                progress(&SearchProgress {
                    phase: self.phase,
                    position,
                    length,
                    percent: (position * 100 / length + 1).min(100) as u8,
                    best: best.as_ref(),
                });
            }
        }
        log::debug!(
            "{:?} search expanded {} states, {} complete parses",
            self.phase,
            self.expanded,
            self.complete.len()
        );
        Ok(sort_parses(self.complete, None))
    }

    fn finish_interrupted(mut self, position: usize) -> Vec<Parse> {
        log::debug!(
            "{:?} search interrupted at position {position} of {}",
            self.phase,
            self.sentence.len()
        );
        let pending: Vec<SearchState> = self
            .levels
            .iter_mut()
            .skip(position)
            .take(2)
            .flat_map(|level| level.drain(..))
            .collect();
        let forced = self.force_close(pending.iter());
        sort_parses(self.complete, Some(forced))
    }

    fn push_same_level(&mut self, state: SearchState) {
        let position = state.position;
        self.levels[position].push_back(state);
    }

    fn push_next_level(&mut self, mut state: SearchState) {
        state.position += 1;
        let position = state.position;
        self.levels[position].push_back(state);
    }

    fn expand(&mut self, state: SearchState) {
        self.expanded += 1;
        if state.skips > self.best_distance {
            return;
        }
        let key = (
            state.node,
            state.skipped.join(" "),
            state.output.join(" "),
        );
        if !self.seen.insert(key) {
            return;
        }

        let grammar = self.grammar;
        let sentence = self.sentence;
        let observations = self.observations;
        let remaining = sentence.len() - state.position;

        if grammar.is_terminal(state.node) {
            self.best_distance = self.best_distance.min(state.skips + remaining);
            if self.policy.allow_skip {
                let mut output = state.output;
                output.extend(state.open_tags.iter().rev().map(|tag| closing_tag(tag)));
                let mut skipped = state.skipped;
                skipped.extend_from_slice(&sentence[state.position..]);
                self.complete.push(Parse {
                    tokens: output,
                    cost: ParseCost {
                        skips: state.skips + remaining,
                        tags: state.tag_cost + remaining,
                    },
                    skipped,
                });
            } else if remaining == 0 {
                self.complete.push(Parse {
                    tokens: state.output,
                    cost: ParseCost {
                        skips: state.skips,
                        tags: state.tag_cost,
                    },
                    skipped: state.skipped,
                });
            }
            return;
        }

        let token = sentence.get(state.position);
        let observation = observations.get(state.position).map(String::as_str);
        let mut considered_word = false;

        for (target, arc) in grammar.transitions(state.node) {
            let word = arc.output.as_str();
            if word == EPSILON {
                self.push_same_level(SearchState {
                    node: target,
                    ..state.clone()
                });
            } else if let Some(name) = tag_name(word) {
                if is_closing(word) {
                    let (open_tags, closed) = close_tags(name, &state.open_tags);
                    let mut output = state.output.clone();
                    output.extend(closed.iter().cloned());
                    self.push_same_level(SearchState {
                        output,
                        tag_cost: state.tag_cost.saturating_sub(closed.len()),
                        open_tags,
                        node: target,
                        in_callsign: word != CALLSIGN_CLOSE && state.in_callsign,
                        ..state.clone()
                    });
                } else if !self.irrelevant_commands.contains(word) {
                    let mut output = state.output.clone();
                    output.push(word.to_string());
                    let mut open_tags = state.open_tags.clone();
                    open_tags.push(name.to_string());
                    self.push_same_level(SearchState {
                        output,
                        tag_cost: state.tag_cost + 1,
                        open_tags,
                        node: target,
                        in_callsign: word == CALLSIGN_OPEN || state.in_callsign,
                        ..state.clone()
                    });
                }
            } else if let (Some(token), Some(observation)) = (token, observation) {
                considered_word = true;
                if word == observation {
                    let mut output = state.output.clone();
                    output.push(token.clone());
                    self.push_next_level(SearchState {
                        output,
                        node: target,
                        ..state.clone()
                    });
                }
            }
        }

        if let (Some(token), Some(observation)) = (token, observation) {
            if !considered_word {
                return;
            }
            if let Some(cost) = self.policy.skip_cost(observation, state.in_callsign) {
                let mut skipped = state.skipped.clone();
                skipped.push(token.clone());
                self.push_next_level(SearchState {
                    skips: state.skips + cost,
                    skipped,
                    ..state
                });
            }
        }
    }

    /// Closes every open tag of the given states. An open sentence tag first
    /// takes the unread input verbatim, counted as skipped.
    fn force_close<'s, I>(&self, states: I) -> Vec<Parse>
    where
        I: Iterator<Item = &'s SearchState>,
    {
        states
            .map(|state| {
                let mut tokens = state.output.clone();
                let mut position = state.position;
                let mut skips = state.skips;
                for tag in state.open_tags.iter().rev() {
                    if tag == SENTENCE_TAG {
                        tokens.extend_from_slice(&self.sentence[position..]);
                        skips += self.sentence.len() - position;
                        position = self.sentence.len();
                    }
                    tokens.push(closing_tag(tag));
                }
                Parse {
                    tokens,
                    cost: ParseCost {
                        skips: skips + self.sentence.len() - position,
                        tags: 0,
                    },
                    skipped: state.skipped.clone(),
                }
            })
            .collect()
    }
}

/// Closes open tags down to and including the one named by a closing arc.
/// A closing arc for a tag that is not open closes the innermost open tag.
fn close_tags(name: &str, open_tags: &[String]) -> (Vec<String>, Vec<String>) {
    let name = base_name(name);
    let split = open_tags
        .iter()
        .rposition(|open| base_name(open) == name)
        .unwrap_or(open_tags.len().saturating_sub(1));
    let closed = open_tags[split..]
        .iter()
        .rev()
        .map(|tag| closing_tag(tag))
        .collect();
    (open_tags[..split].to_vec(), closed)
}

/// Orders parses by skip count, then tag cost, then rendered output, and
/// drops duplicate renderings. Forced parses win over complete ones only
/// when they skip fewer words.
pub(crate) fn sort_parses(mut complete: Vec<Parse>, forced: Option<Vec<Parse>>) -> Vec<Parse> {
    // Comparing token vectors orders like comparing the space-joined strings.
    let order = |a: &Parse, b: &Parse| a.cost.cmp(&b.cost).then_with(|| a.tokens.cmp(&b.tokens));
    complete.sort_by(order);
    let complete_cost = complete.first().map_or(usize::MAX, |parse| parse.cost.skips);

    let mut best = complete;
    if let Some(mut forced) = forced.filter(|forced| !forced.is_empty()) {
        forced.sort_by(order);
        if forced[0].cost.skips < complete_cost {
            best = forced;
        }
    }

    let mut rendered = HashSet::new();
    best.retain(|parse| rendered.insert(parse.tokens.clone()));
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(tags: &[&str]) -> Vec<String> {
        tags.iter().map(|tag| tag.to_string()).collect()
    }

    #[test]
    fn test_close_tags() {
        let open = tags(&["s", "command=\"descend\"", "flightlevel"]);
        let (remaining, closed) = close_tags("command", &open);
        assert_eq!(remaining, tags(&["s"]));
        assert_eq!(closed, tags(&["</flightlevel>", "</command>"]));

        let (remaining, closed) = close_tags("altitude", &open);
        assert_eq!(remaining, tags(&["s", "command=\"descend\""]));
        assert_eq!(closed, tags(&["</flightlevel>"]));

        let (remaining, closed) = close_tags("s", &[]);
        assert!(remaining.is_empty());
        assert!(closed.is_empty());
    }

    #[test]
    fn test_skip_policy() {
        let noise: HashSet<String> = ["_spn_".to_string()].into();
        let whitelist: HashSet<String> = ["aeh".to_string()].into();
        let airlines: HashSet<String> = ["lufthansa".to_string()].into();
        let policy = SkipPolicy {
            allow_skip: true,
            noise_markers: &noise,
            callsign_whitelist: &whitelist,
            airlines: &airlines,
        };
        assert_eq!(policy.skip_cost("hello", false), Some(1));
        assert_eq!(policy.skip_cost("hello", true), None);
        assert_eq!(policy.skip_cost("aeh", true), Some(1));
        assert_eq!(policy.skip_cost("_hello_", true), Some(1));
        assert_eq!(policy.skip_cost("_spn_", true), Some(0));
        assert_eq!(policy.skip_cost("lufthansa", false), None);

        let strict = SkipPolicy {
            allow_skip: false,
            ..policy
        };
        assert_eq!(strict.skip_cost("hello", false), None);
        assert_eq!(strict.skip_cost("_spn_", false), Some(0));
    }

    #[test]
    fn test_skip_count_never_decreases_along_a_path() {
        let grammar = crate::test_utils::load_test_grammar().unwrap();
        let sentence: Vec<String> =
            "lufthansa four aeh five six _spn_ descend flight level three two zero"
                .split_whitespace()
                .map(String::from)
                .collect();
        let observations = sentence.clone();
        let irrelevant = HashSet::new();
        let noise: HashSet<String> = ["_spn_".to_string()].into();
        let whitelist: HashSet<String> = ["aeh".to_string()].into();
        let airlines: HashSet<String> = ["lufthansa".to_string(), "speedbird".to_string()].into();
        let policy = SkipPolicy {
            allow_skip: true,
            noise_markers: &noise,
            callsign_whitelist: &whitelist,
            airlines: &airlines,
        };
        let mut context = SearchContext::new(
            &grammar,
            &sentence,
            &observations,
            &irrelevant,
            policy,
            SearchPhase::Skipping,
        );

        let mut skip_steps = 0;
        for position in 0..=sentence.len() {
            while let Some(parent) = context.levels[position].pop_front() {
                let same_before = context.levels[position].len();
                let next_before = context.levels[position + 1].len();
                context.expand(parent.clone());

                let children = context.levels[position]
                    .range(same_before..)
                    .chain(context.levels[position + 1].range(next_before..));
                for child in children {
                    assert!(child.skips >= parent.skips);
                    let delta = child.skips - parent.skips;
                    if child.skipped.len() > parent.skipped.len() {
                        skip_steps += 1;
                        let cost = policy
                            .skip_cost(&observations[parent.position], parent.in_callsign)
                            .unwrap();
                        assert_eq!(delta, cost);
                    } else {
                        assert_eq!(delta, 0);
                    }
                }
            }
        }

        assert!(skip_steps > 0);
        let best = sort_parses(context.complete, None);
        assert_eq!(best[0].cost.skips, 1);
        assert_eq!(best[0].skipped, vec!["aeh", "_spn_"]);
    }

    #[test]
    fn test_sort_parses_prefers_fewer_skips() {
        let parse = |tokens: &[&str], skips, tags_cost| Parse {
            tokens: tags(tokens),
            cost: ParseCost {
                skips,
                tags: tags_cost,
            },
            skipped: Vec::new(),
        };
        let complete = vec![parse(&["b"], 1, 0), parse(&["a"], 1, 0), parse(&["c"], 0, 2)];
        let sorted = sort_parses(complete.clone(), None);
        let rendered: Vec<_> = sorted.iter().map(Parse::render).collect();
        assert_eq!(rendered, vec!["c", "a", "b"]);

        let forced = vec![parse(&["d"], 0, 0)];
        let sorted = sort_parses(complete.clone(), Some(forced.clone()));
        assert_eq!(sorted[0].render(), "c");

        let sorted = sort_parses(vec![parse(&["e"], 3, 0)], Some(forced));
        assert_eq!(sorted[0].render(), "d");
    }
}
