use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use verbatim::{
    load_glossary, load_metadata, normalize_bytes, output_path_in, read_input, write_text,
    Glossary, NormalizationReport, NormalizerConfig,
};

#[derive(Parser)]
#[command(name = "verbatim")]
#[command(author, version, about = "Glossary-driven transcript normalization", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Correct proper nouns and add paragraph breaks to transcripts
    Process {
        /// Input transcript files (plain text or WebVTT)
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Output file (single input only; defaults to stdout)
        #[arg(short, long, conflicts_with = "output_dir")]
        output: Option<PathBuf>,

        /// Directory for outputs, one `<stem>.txt` per input
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// JSON report path (a directory when several inputs are given)
        #[arg(long)]
        report: Option<PathBuf>,

        #[command(flatten)]
        options: NormalizeArgs,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print statistics for a transcript without writing anything
    Analyze {
        /// Input transcript file (plain text or WebVTT)
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        options: NormalizeArgs,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Args, Clone)]
struct NormalizeArgs {
    /// Glossary JSON file
    #[arg(short, long)]
    glossary: Option<PathBuf>,

    /// yt-dlp video.info.json whose names seed the glossary
    #[arg(long)]
    metadata: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Treat inputs as WebVTT captions regardless of extension
    #[arg(long)]
    captions: bool,

    /// Fuzzy match threshold (0-1)
    #[arg(long)]
    threshold: Option<f64>,

    /// Maximum sentences per paragraph
    #[arg(long)]
    max_sentences: Option<usize>,

    /// Target maximum characters per paragraph
    #[arg(long)]
    max_chars: Option<usize>,

    /// Speaker label regex, matched at line starts (repeatable)
    #[arg(long = "speaker-pattern")]
    speaker_patterns: Vec<String>,

    /// Join single line breaks inside paragraphs
    #[arg(long)]
    reflow: bool,
}

impl NormalizeArgs {
    fn build_config(&self) -> Result<NormalizerConfig> {
        let mut config = match &self.config {
            Some(path) => NormalizerConfig::load(path)?,
            None => NormalizerConfig::default(),
        };

        if let Some(threshold) = self.threshold {
            config.fuzzy_match_threshold = threshold;
        }
        if let Some(max_sentences) = self.max_sentences {
            config.max_sentences_per_paragraph = max_sentences;
        }
        if let Some(max_chars) = self.max_chars {
            config.max_chars_per_paragraph = max_chars;
        }
        config
            .speaker_marker_patterns
            .extend(self.speaker_patterns.iter().cloned());
        if self.reflow {
            config.reflow_line_breaks = true;
        }

        config.validate()?;
        Ok(config)
    }

    fn build_glossary(&self) -> Result<Glossary> {
        let mut glossary = match &self.glossary {
            Some(path) => load_glossary(path)?,
            None => Glossary::default(),
        };
        if let Some(path) = &self.metadata {
            let metadata = load_metadata(path)?;
            glossary.merge(metadata.glossary_seed());
        }
        Ok(glossary)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            output,
            output_dir,
            report,
            options,
            verbose,
        } => {
            setup_logging(verbose);
            process_transcripts(input, output, output_dir, report, options).await
        }
        Commands::Analyze {
            input,
            options,
            verbose,
        } => {
            setup_logging(verbose);
            analyze_transcript(input, options)
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

/// Where one input's text and report go
struct Destination {
    output: Option<PathBuf>,
    report: Option<PathBuf>,
}

async fn process_transcripts(
    inputs: Vec<PathBuf>,
    output: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    report: Option<PathBuf>,
    options: NormalizeArgs,
) -> Result<()> {
    let several = inputs.len() > 1;
    if several && output_dir.is_none() {
        bail!("--output-dir is required when processing several inputs");
    }

    let config = Arc::new(options.build_config()?);
    let glossary = Arc::new(options.build_glossary()?);
    info!(
        "Processing {} transcript(s) with {} glossary entries",
        inputs.len(),
        glossary.len()
    );

    let mut handles = Vec::with_capacity(inputs.len());
    for input in inputs {
        let destination = Destination {
            output: match &output_dir {
                Some(dir) => Some(output_path_in(dir, &input)),
                None => output.clone(),
            },
            report: report.as_ref().map(|r| {
                if several {
                    report_path_in(r, &input)
                } else {
                    r.clone()
                }
            }),
        };
        let config = Arc::clone(&config);
        let glossary = Arc::clone(&glossary);
        let captions = options.captions;

        let handle = tokio::task::spawn_blocking(move || {
            let result = process_one(&input, &destination, &glossary, &config, captions);
            (input, result)
        });
        handles.push(handle);
    }

    let mut failures = 0;
    for handle in handles {
        let (input, result) = handle.await.context("Worker task panicked")?;
        if let Err(e) = result {
            error!("{:?}: {:#}", input, e);
            failures += 1;
        }
    }

    if failures > 0 {
        bail!("{} input(s) failed", failures);
    }
    info!("Processing complete!");
    Ok(())
}

fn process_one(
    input: &Path,
    destination: &Destination,
    glossary: &Glossary,
    config: &NormalizerConfig,
    captions: bool,
) -> Result<()> {
    info!("Loading transcript from {:?}", input);
    let bytes = read_input(input, captions)?;
    let outcome = normalize_bytes(&bytes, glossary, config)
        .with_context(|| format!("Failed to normalize {:?}", input))?;

    match &destination.output {
        Some(path) => {
            write_text(path, &outcome.text)?;
            info!("Wrote normalized transcript to {:?}", path);
        }
        None => println!("{}", outcome.text),
    }

    if let Some(path) = &destination.report {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
        NormalizationReport::from_outcome(&outcome, input, glossary.len(), config)
            .write_json(path)?;
        info!("Wrote report to {:?}", path);
    }

    Ok(())
}

/// Report path for `input` inside `dir`: `<stem>.report.json`
fn report_path_in(dir: &Path, input: &Path) -> PathBuf {
    output_path_in(dir, input).with_extension("report.json")
}

fn analyze_transcript(input: PathBuf, options: NormalizeArgs) -> Result<()> {
    info!("Analyzing transcript from {:?}", input);
    let config = options.build_config()?;
    let glossary = options.build_glossary()?;
    let bytes = read_input(&input, options.captions)?;
    let outcome = normalize_bytes(&bytes, &glossary, &config)
        .with_context(|| format!("Failed to analyze {:?}", input))?;
    let stats = &outcome.stats;

    println!("Transcript Analysis");
    println!("==================");
    println!("Total tokens: {}", stats.tokens);
    println!("Words: {}", stats.words);
    println!("Speaker markers: {}", stats.speaker_markers);
    println!("Sentences: {}", stats.sentences);
    println!();

    println!("Glossary Matches");
    println!("----------------");
    println!("Glossary entries: {}", glossary.len());
    println!("Corrections: {}", stats.corrections);
    println!("Already canonical: {}", stats.already_canonical);
    println!("Ambiguous spans: {}", stats.ambiguous_spans);
    for correction in &outcome.corrections {
        println!(
            "  {:?} -> {:?} ({:?}, confidence {:.2})",
            correction.original_text,
            correction.replacement_text,
            correction.match_kind,
            correction.confidence
        );
    }
    for warning in &outcome.warnings {
        println!("  {}", warning);
    }
    println!();

    println!("Paragraphs");
    println!("----------");
    println!("Paragraphs: {}", stats.paragraphs);
    let forced = outcome
        .boundaries
        .iter()
        .filter(|b| b.reason.is_forced())
        .count();
    println!("Forced breaks: {}", forced);
    let longest = outcome
        .paragraphs
        .iter()
        .map(|p| p.text.chars().count())
        .max()
        .unwrap_or(0);
    println!("Longest paragraph: {} chars", longest);
    println!("Words verified: {}", outcome.fidelity.words_compared);

    Ok(())
}
