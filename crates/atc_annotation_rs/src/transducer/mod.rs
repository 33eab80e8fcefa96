//! Grammar-guided skip transducer
//!
//! Finds the cheapest path through the grammar that explains a recognized
//! word sequence. A strict phase first tries to explain every word; if that
//! fails, a skipping phase may leave words unexplained at a cost of one per
//! word (noise markers are free). The tagged output of the best path is then
//! merged with the original words so nothing spoken is lost.

mod prefilter;
mod reinsert;
mod search;

use std::{
    collections::HashSet,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use aviation_helper_rs::{clearance::airlines::Airlines, types::alphabet::is_letter};

use crate::{
    config::{ConvertOptions, TransducerConfig},
    errors::Error,
    grammar::GrammarModel,
    token::observation,
    vocabulary::VocabularyIndex,
};

pub use reinsert::reinsert_missing_words;
use search::{SearchBudget, SearchContext, SkipPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct ParseCost {
    /// Words left unexplained; noise markers count zero.
    pub skips: usize,
    /// Tags opened along the path, plus words left unread at a terminal.
    pub tags: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parse {
    /// Tagged output, lowercased.
    pub tokens: Vec<String>,
    pub cost: ParseCost,
    pub skipped: Vec<String>,
}

impl Parse {
    pub fn render(&self) -> String {
        self.tokens.join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    /// Every word must be explained by the grammar.
    Strict,
    Skipping,
}

#[derive(Debug)]
pub struct SearchProgress<'a> {
    pub phase: SearchPhase,
    /// Input positions processed so far.
    pub position: usize,
    pub length: usize,
    pub percent: u8,
    pub best: Option<&'a Parse>,
}

pub type ProgressCallback<'a> = dyn FnMut(&SearchProgress<'_>) + 'a;

/// Caller hooks into a running search. The cancel flag is polled once per
/// input position; a cancelled search returns its best partial result.
#[derive(Default)]
pub struct SearchHooks<'a> {
    pub progress: Option<&'a mut ProgressCallback<'a>>,
    pub cancel: Option<&'a AtomicBool>,
}

impl SearchHooks<'_> {
    fn is_cancelled(&self) -> bool {
        self.cancel
            .is_some_and(|cancel| cancel.load(Ordering::Relaxed))
    }
}

/// Immutable after construction; share it between threads behind an [`Arc`].
#[derive(Debug, Clone)]
pub struct SkipTransducer {
    grammar: Arc<GrammarModel>,
    vocabulary: Arc<VocabularyIndex>,
    /// Spoken airline names that are not spelled letters.
    airlines: HashSet<String>,
    noise_markers: HashSet<String>,
    callsign_whitelist: HashSet<String>,
    config: TransducerConfig,
}

impl SkipTransducer {
    pub fn new(grammar: Arc<GrammarModel>, airlines: &Airlines, config: TransducerConfig) -> Self {
        let vocabulary = Arc::new(VocabularyIndex::new(&grammar));
        Self::with_vocabulary(grammar, vocabulary, airlines, config)
    }

    pub fn with_vocabulary(
        grammar: Arc<GrammarModel>,
        vocabulary: Arc<VocabularyIndex>,
        airlines: &Airlines,
        config: TransducerConfig,
    ) -> Self {
        let lowercase = |words: &[String]| -> HashSet<String> {
            words.iter().map(|word| word.to_lowercase()).collect()
        };
        Self {
            airlines: airlines
                .names()
                .map(str::to_lowercase)
                .filter(|name| !is_letter(name))
                .collect(),
            noise_markers: lowercase(&config.noise_markers),
            callsign_whitelist: lowercase(&config.callsign_whitelist),
            grammar,
            vocabulary,
            config,
        }
    }

    /// Same grammar and vocabulary, different airline table.
    pub fn with_airlines(&self, airlines: &Airlines) -> Self {
        Self::with_vocabulary(
            Arc::clone(&self.grammar),
            Arc::clone(&self.vocabulary),
            airlines,
            self.config.clone(),
        )
    }

    pub fn grammar(&self) -> &GrammarModel {
        &self.grammar
    }

    pub fn vocabulary(&self) -> &VocabularyIndex {
        &self.vocabulary
    }

    pub fn config(&self) -> &TransducerConfig {
        &self.config
    }

    /// Runs one search phase over `tokens` and returns all parses found,
    /// best first.
    pub fn transduce(
        &self,
        tokens: &[String],
        phase: SearchPhase,
        options: &ConvertOptions,
        hooks: &mut SearchHooks<'_>,
    ) -> Result<Vec<Parse>, Error> {
        if tokens.is_empty() || self.grammar.is_empty() {
            return Ok(Vec::new());
        }
        let mut sentence: Vec<String> = tokens.iter().map(|token| token.to_lowercase()).collect();

        let irrelevant_commands = if self.config.prune_commands {
            let observations: Vec<String> =
                sentence.iter().map(|token| observation(token)).collect();
            self.vocabulary
                .irrelevant_commands(observations.iter().map(String::as_str))
        } else {
            HashSet::new()
        };
        log::debug!("Pruned {} irrelevant commands", irrelevant_commands.len());

        if phase == SearchPhase::Skipping {
            if options.ignore_fluff_words {
                sentence = prefilter::remove_fluff(sentence, &self.vocabulary);
            }
            if let Some(cutoff) = self.config.airline_correction_cutoff {
                sentence = prefilter::trim_airline_restart(sentence, &self.airlines, cutoff);
            }
            if sentence.is_empty() {
                return Ok(Vec::new());
            }
        }
        let observations: Vec<String> = sentence.iter().map(|token| observation(token)).collect();

        let policy = SkipPolicy {
            allow_skip: phase == SearchPhase::Skipping,
            noise_markers: &self.noise_markers,
            callsign_whitelist: &self.callsign_whitelist,
            airlines: &self.airlines,
        };
        let budget = SearchBudget::new(options.timeout, options.hard_deadline);
        SearchContext::new(
            &self.grammar,
            &sentence,
            &observations,
            &irrelevant_commands,
            policy,
            phase,
        )
        .run(&budget, hooks)
    }

    /// Strict phase first, skipping phase only if that found nothing.
    pub fn best_parse(
        &self,
        tokens: &[String],
        options: &ConvertOptions,
        hooks: &mut SearchHooks<'_>,
    ) -> Result<Option<Parse>, Error> {
        let parses = self.transduce(tokens, SearchPhase::Strict, options, hooks)?;
        if let Some(best) = parses.into_iter().next() {
            return Ok(Some(best));
        }
        if !options.allow_skip || hooks.is_cancelled() {
            return Ok(None);
        }
        let parses = self.transduce(tokens, SearchPhase::Skipping, options, hooks)?;
        Ok(parses.into_iter().next())
    }

    /// Annotates a whitespace separated sentence. Returns `None` when no
    /// parse was found.
    pub fn convert(
        &self,
        sentence: &str,
        options: &ConvertOptions,
        hooks: &mut SearchHooks<'_>,
    ) -> Result<Option<String>, Error> {
        let words: Vec<String> = sentence.split_whitespace().map(String::from).collect();
        let Some(parse) = self.best_parse(&words, options, hooks)? else {
            log::debug!("No parse for {sentence:?}");
            return Ok(None);
        };
        let annotated = reinsert_missing_words(&words, &parse.tokens);
        Ok((!annotated.trim().is_empty()).then_some(annotated))
    }

    /// Annotates every line and joins the results with newlines. Lines
    /// without a parse are left out.
    pub fn convert_lines<'l, I>(&self, lines: I, options: &ConvertOptions) -> Result<Option<String>, Error>
    where
        I: IntoIterator<Item = &'l str>,
    {
        let mut annotated = Vec::new();
        for line in lines {
            if let Some(result) = self.convert(line, options, &mut SearchHooks::default())? {
                annotated.push(result);
            }
        }
        Ok((!annotated.is_empty()).then(|| annotated.join("\n")))
    }
}
