use std::{
    io::{BufRead, Write},
    path::PathBuf,
    time::Duration,
};

use anyhow::Context;
use atc_annotation_rs::{
    Annotator, CommandRecord, ConfidenceMode, ConvertOptions, Error, ExtractOptions, SearchHooks,
    SearchProgress, TransducerConfig, interpreter::AirlinePart, token::tokens_from_mbr,
};
use aviation_helper_rs::clearance::callsign_context::ContextCallsign;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(version, about = "Annotates recognized ATC utterances")]
pub struct Cli {
    /// Grammar exported as tab separated arcs
    #[arg(long, env = "ATC_GRAMMAR")]
    grammar: Option<PathBuf>,
    /// `CODE name` airline table
    #[arg(long, env = "ATC_AIRLINES")]
    airlines: Option<PathBuf>,
    /// Callsigns known to be on frequency
    #[arg(long, env = "ATC_CALLSIGN_CONTEXT")]
    callsign_context: Option<PathBuf>,
    /// Transducer settings in RON
    #[arg(long, env = "ATC_TRANSDUCER_CONFIG")]
    transducer_config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Tag each line of stdin
    Convert(ConvertArgs),
    /// Interpret each tagged line of stdin
    Extract(ExtractArgs),
    /// Tag and interpret each line of stdin
    Annotate {
        #[command(flatten)]
        convert: ConvertArgs,
        #[command(flatten)]
        extract: ExtractArgs,
        /// Add every complete callsign heard to the callsign context
        #[arg(long)]
        learn_callsigns: bool,
    },
}

#[derive(Debug, Args)]
struct ConvertArgs {
    /// Search budget per phase; the best parse so far wins on expiry
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Fail searches that run longer than this
    #[arg(long)]
    hard_deadline_ms: Option<u64>,
    /// Only accept parses that explain every word
    #[arg(long)]
    no_skip: bool,
    /// Drop out-of-vocabulary words before the skipping phase
    #[arg(long)]
    ignore_fluff_words: bool,
    /// Read stdin as one recognizer output, `... word confidence` per line
    #[arg(long)]
    mbr: bool,
}

#[derive(Debug, Args)]
struct ExtractArgs {
    #[arg(long, default_value_t = ConfidenceMode::Off)]
    confidence: ConfidenceMode,
    /// Reject tagged text without proper boundary tags
    #[arg(long)]
    strict: bool,
    #[arg(long)]
    no_sub_confidences: bool,
    #[arg(long)]
    no_total_confidence: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    /// One JSON array of records per input line
    Json,
}

impl ConvertArgs {
    fn options(&self, config: &TransducerConfig) -> ConvertOptions {
        ConvertOptions {
            timeout: self.timeout_ms.map(Duration::from_millis),
            hard_deadline: self.hard_deadline_ms.map(Duration::from_millis),
            allow_skip: !self.no_skip,
            ignore_fluff_words: self.ignore_fluff_words || config.ignore_fluff_words,
        }
    }

    /// Calls `f` for every non-blank stdin line, or once for the whole input
    /// when it is recognizer output.
    fn for_each_sentence<F>(&self, input: impl BufRead, mut f: F) -> anyhow::Result<()>
    where
        F: FnMut(&str) -> anyhow::Result<()>,
    {
        if self.mbr {
            return f(&tokens_from_mbr(input)?.join(" "));
        }
        for line in input.lines() {
            let line = line?;
            if !line.trim().is_empty() {
                f(&line)?;
            }
        }
        Ok(())
    }
}

impl ExtractArgs {
    fn options(&self) -> ExtractOptions {
        ExtractOptions {
            mode: self.confidence,
            strict: self.strict,
            sub_confidences: !self.no_sub_confidences,
            total_confidence: !self.no_total_confidence,
        }
    }
}

fn log_progress(progress: &SearchProgress<'_>) {
    log::trace!(
        "{:?} search at {}/{} ({}%), best {:?}",
        progress.phase,
        progress.position,
        progress.length,
        progress.percent,
        progress.best.map(|parse| parse.cost)
    );
}

fn convert(
    annotator: &Annotator,
    sentence: &str,
    options: &ConvertOptions,
) -> anyhow::Result<Option<String>> {
    let mut on_progress = log_progress;
    let mut hooks = SearchHooks {
        progress: Some(&mut on_progress),
        cancel: None,
    };
    let tagged = annotator.convert(sentence, options, &mut hooks)?;
    if tagged.is_none() {
        log::warn!("No parse for {sentence:?}");
    }
    Ok(tagged)
}

fn write_records(out: &mut impl Write, records: &[CommandRecord], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            for record in records {
                writeln!(out, "{record}")?;
            }
        }
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(records)?)?,
    }
    Ok(())
}

impl Cli {
    fn annotator(&self) -> anyhow::Result<Annotator> {
        let config = match &self.transducer_config {
            Some(path) => TransducerConfig::load_from_file(path)
                .with_context(|| format!("Failed to load transducer config {path:?}"))?,
            None => TransducerConfig::default(),
        };
        let mut annotator = Annotator::new(config);
        if let Some(path) = &self.airlines {
            annotator
                .load_airlines(path)
                .with_context(|| format!("Failed to load airlines {path:?}"))?;
        }
        if let Some(path) = &self.callsign_context {
            annotator
                .load_callsign_context(path)
                .with_context(|| format!("Failed to load callsign context {path:?}"))?;
        }
        match &self.grammar {
            Some(path) => match annotator.load_grammar(path) {
                // Already reported; interpretation still works without a grammar
                Ok(()) | Err(Error::GrammarUnavailable { .. }) => {}
                Err(error) => {
                    return Err(error).with_context(|| format!("Failed to load grammar {path:?}"));
                }
            },
            None => log::warn!("No grammar configured, conversions will be empty"),
        }
        Ok(annotator)
    }

    pub fn run(&self) -> anyhow::Result<()> {
        let mut annotator = self.annotator()?;
        let stdin = std::io::stdin().lock();
        let mut out = std::io::stdout().lock();

        match &self.command {
            Command::Convert(args) => {
                let options = args.options(annotator.config());
                args.for_each_sentence(stdin, |sentence| {
                    if let Some(tagged) = convert(&annotator, sentence, &options)? {
                        writeln!(out, "{tagged}")?;
                    }
                    Ok(())
                })
            }
            Command::Extract(args) => {
                let options = args.options();
                for line in stdin.lines() {
                    let line = line?;
                    if line.trim().is_empty() {
                        continue;
                    }
                    let set = annotator.extract(&line, &options)?;
                    write_records(&mut out, &set.records(&options), args.format)?;
                }
                Ok(())
            }
            Command::Annotate {
                convert: convert_args,
                extract,
                learn_callsigns,
            } => {
                let convert_options = convert_args.options(annotator.config());
                let extract_options = extract.options();
                convert_args.for_each_sentence(stdin, |sentence| {
                    let Some(tagged) = convert(&annotator, sentence, &convert_options)? else {
                        return write_records(&mut out, &[], extract.format);
                    };
                    let set = annotator.extract(&tagged, &extract_options)?;
                    write_records(&mut out, &set.records(&extract_options), extract.format)?;

                    let callsign = set.callsign();
                    if let (true, AirlinePart::Code(airline), Some(flight_number)) =
                        (*learn_callsigns, callsign.airline(), callsign.flight_number())
                    {
                        annotator.context_mut().push(ContextCallsign {
                            airline: airline.clone(),
                            flight_number: flight_number.to_string(),
                        });
                    }
                    Ok(())
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert_args(mbr: bool) -> ConvertArgs {
        ConvertArgs {
            timeout_ms: None,
            hard_deadline_ms: None,
            no_skip: false,
            ignore_fluff_words: false,
            mbr,
        }
    }

    fn sentences(args: &ConvertArgs, input: &str) -> Vec<String> {
        let mut sentences = Vec::new();
        args.for_each_sentence(input.as_bytes(), |sentence| {
            sentences.push(sentence.to_string());
            Ok(())
        })
        .unwrap();
        sentences
    }

    #[test]
    fn test_sentences_per_line() {
        let input = "lufthansa four\n\n  \ndescend flight level\n";
        assert_eq!(
            sentences(&convert_args(false), input),
            vec!["lufthansa four", "descend flight level"]
        );
    }

    #[test]
    fn test_mbr_input_is_one_sentence() {
        let input = "utt 1 0.00 0.42 Lufthansa 0.93\nutt 1 0.42 0.10 four 1.00\n";
        assert_eq!(
            sentences(&convert_args(true), input),
            vec!["lufthansa:0.93 four:1.00"]
        );
    }

    #[test]
    fn test_annotate_accepts_mbr_input() {
        let cli = Cli::try_parse_from(["atc-annotator", "annotate", "--mbr", "--learn-callsigns"])
            .unwrap();
        let Command::Annotate {
            convert,
            learn_callsigns,
            ..
        } = cli.command
        else {
            panic!("expected annotate");
        };
        assert!(convert.mbr);
        assert!(learn_callsigns);
    }
}
