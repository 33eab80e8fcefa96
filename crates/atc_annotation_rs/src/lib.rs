//! ATC Annotation Library
//!
//! Turns recognized ATC utterances into tagged annotations with a
//! grammar-guided skip transducer, and interprets those annotations as
//! callsigns and canonical commands such as `DLH456 DESCEND 320 FL`.

use std::{path::Path, sync::Arc};

use aviation_helper_rs::clearance::{airlines::Airlines, callsign_context::CallsignContext};

pub mod command_set;
pub mod confidence;
pub mod config;
pub mod errors;
pub mod grammar;
pub mod interpreter;
pub mod markup;
pub mod tag_frame;
pub mod token;
pub mod transducer;
pub mod vocabulary;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use command_set::{CommandRecord, CommandSet, ExtractOptions};
pub use confidence::ConfidenceMode;
pub use config::{ConvertOptions, TransducerConfig};
pub use errors::Error;
pub use grammar::GrammarModel;
pub use interpreter::{Callsign, Command};
pub use tag_frame::TagFrame;
pub use transducer::{Parse, ParseCost, SearchHooks, SearchPhase, SearchProgress, SkipTransducer};
pub use vocabulary::VocabularyIndex;

/// Everything an annotation session needs: the transducer, the airline table
/// and the callsigns already seen in the session.
///
/// Without a grammar the annotator still interprets tagged text, but
/// [`Annotator::convert`] finds no parses.
#[derive(Debug, Clone, Default)]
pub struct Annotator {
    transducer: Option<SkipTransducer>,
    airlines: Airlines,
    context: CallsignContext,
    config: TransducerConfig,
}

impl Annotator {
    pub fn new(config: TransducerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Loads the grammar and rebuilds the transducer. A missing grammar file
    /// leaves the annotator without one; the error is still returned.
    pub fn load_grammar<P: AsRef<Path>>(&mut self, path: P) -> Result<(), Error> {
        match GrammarModel::load_grammar_from_file(path) {
            Ok(grammar) => {
                self.set_grammar(grammar);
                Ok(())
            }
            Err(error @ Error::GrammarUnavailable { .. }) => {
                log::warn!("{error}, annotations will be empty");
                self.transducer = None;
                Err(error)
            }
            Err(error) => Err(error),
        }
    }

    pub fn set_grammar(&mut self, grammar: GrammarModel) {
        self.transducer = Some(SkipTransducer::new(
            Arc::new(grammar),
            &self.airlines,
            self.config.clone(),
        ));
    }

    pub fn load_airlines<P: AsRef<Path>>(&mut self, path: P) -> Result<(), Error> {
        let airlines = Airlines::load_airlines_from_file(path)?;
        self.set_airlines(airlines);
        Ok(())
    }

    /// Replaces the airline table. The transducer keeps its grammar and
    /// vocabulary but learns the new airline names.
    pub fn set_airlines(&mut self, airlines: Airlines) {
        self.airlines = airlines;
        self.transducer = self
            .transducer
            .as_ref()
            .map(|transducer| transducer.with_airlines(&self.airlines));
    }

    pub fn load_callsign_context<P: AsRef<Path>>(&mut self, path: P) -> Result<(), Error> {
        self.context = CallsignContext::load_context_from_file(path)?;
        Ok(())
    }

    pub fn transducer(&self) -> Option<&SkipTransducer> {
        self.transducer.as_ref()
    }

    pub fn airlines(&self) -> &Airlines {
        &self.airlines
    }

    pub fn context(&self) -> &CallsignContext {
        &self.context
    }

    /// Callsigns heard during a session feed later completions.
    pub fn context_mut(&mut self) -> &mut CallsignContext {
        &mut self.context
    }

    pub fn config(&self) -> &TransducerConfig {
        &self.config
    }

    /// Tags a recognized sentence. `None` without a grammar or a parse.
    pub fn convert(
        &self,
        sentence: &str,
        options: &ConvertOptions,
        hooks: &mut SearchHooks<'_>,
    ) -> Result<Option<String>, Error> {
        match &self.transducer {
            Some(transducer) => transducer.convert(sentence, options, hooks),
            None => Ok(None),
        }
    }

    pub fn convert_lines<'l, I>(&self, lines: I, options: &ConvertOptions) -> Result<Option<String>, Error>
    where
        I: IntoIterator<Item = &'l str>,
    {
        match &self.transducer {
            Some(transducer) => transducer.convert_lines(lines, options),
            None => Ok(None),
        }
    }

    /// Interprets tagged text such as the output of [`Annotator::convert`].
    pub fn extract(&self, tagged: &str, options: &ExtractOptions) -> Result<CommandSet, Error> {
        let frame = TagFrame::parse(tagged, options.strict)?;
        CommandSet::from_frame(frame.as_ref(), &self.airlines, &self.context)
    }

    /// Convert followed by extract. An utterance without a parse yields no
    /// records.
    pub fn annotate(
        &self,
        sentence: &str,
        convert_options: &ConvertOptions,
        extract_options: &ExtractOptions,
        hooks: &mut SearchHooks<'_>,
    ) -> Result<Vec<CommandRecord>, Error> {
        let Some(tagged) = self.convert(sentence, convert_options, hooks)? else {
            return Ok(Vec::new());
        };
        Ok(self.extract(&tagged, extract_options)?.records(extract_options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotator_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Annotator>();
    }

    #[test]
    fn test_missing_grammar_keeps_annotator_usable() {
        let mut annotator = Annotator::default();
        let result = annotator.load_grammar("/nonexistent/atc_grammar.fst.txt");
        assert!(matches!(result, Err(Error::GrammarUnavailable { .. })));
        assert_eq!(
            annotator
                .convert("lufthansa four five six", &ConvertOptions::default(), &mut SearchHooks::default())
                .unwrap(),
            None
        );
        let set = annotator
            .extract("<s> <command=\"climb\"> climb </command> </s>", &ExtractOptions::default())
            .unwrap();
        assert_eq!(set.render(&ExtractOptions::default()), vec!["NO_CALLSIGN NO_CONCEPT"]);
    }
}
