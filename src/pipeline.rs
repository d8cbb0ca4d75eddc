use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::NormalizerConfig;
use crate::error::NormalizeError;
use crate::heuristics::count_sentences;
use crate::models::{
    AmbiguousEntityWarning, CorrectionSpan, Glossary, Paragraph, ParagraphBoundary,
    TokenizedTranscript,
};
use crate::stages::{
    compile_speaker_patterns, execute_stage1, execute_stage2, execute_stage3, tokenize,
    tokenize_bytes, verify_fidelity, FidelityReport,
};

/// Counters describing one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationStats {
    pub tokens: usize,
    pub words: usize,
    pub speaker_markers: usize,
    pub sentences: usize,
    pub corrections: usize,
    pub ambiguous_spans: usize,
    pub already_canonical: usize,
    pub paragraphs: usize,
}

/// Everything a successful run produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationOutcome {
    /// The normalized transcript
    pub text: String,
    pub paragraphs: Vec<Paragraph>,
    pub corrections: Vec<CorrectionSpan>,
    pub boundaries: Vec<ParagraphBoundary>,
    pub warnings: Vec<AmbiguousEntityWarning>,
    pub fidelity: FidelityReport,
    pub stats: NormalizationStats,
}

/// Normalize raw transcript bytes; invalid UTF-8 fails before any matching
pub fn normalize_bytes(
    bytes: &[u8],
    glossary: &Glossary,
    config: &NormalizerConfig,
) -> Result<NormalizationOutcome, NormalizeError> {
    config.validate()?;
    let patterns = compile_speaker_patterns(&config.speaker_marker_patterns)?;
    let transcript = tokenize_bytes(bytes, &patterns)?;
    run_stages(transcript, glossary, config)
}

/// Normalize a transcript: correct glossary names, add paragraph breaks, and
/// verify the result keeps every input word in order
pub fn normalize_transcript(
    text: &str,
    glossary: &Glossary,
    config: &NormalizerConfig,
) -> Result<NormalizationOutcome, NormalizeError> {
    config.validate()?;
    let patterns = compile_speaker_patterns(&config.speaker_marker_patterns)?;
    let transcript = tokenize(text, &patterns);
    run_stages(transcript, glossary, config)
}

fn run_stages(
    transcript: TokenizedTranscript,
    glossary: &Glossary,
    config: &NormalizerConfig,
) -> Result<NormalizationOutcome, NormalizeError> {
    let matched = execute_stage1(&transcript, glossary, &config.matcher_config());

    let segmenter_config = config.segmenter_config();
    let segmented = execute_stage2(&transcript, &matched.spans, &segmenter_config);

    let rendered = execute_stage3(
        &transcript,
        &matched.spans,
        &segmented.boundaries,
        &config.render_config(),
    );

    let fidelity = verify_fidelity(&transcript.source, &rendered.text, &matched.spans)?;

    let stats = NormalizationStats {
        tokens: transcript.len(),
        words: transcript.word_count(),
        speaker_markers: transcript
            .tokens
            .iter()
            .filter(|t| t.is_speaker_marker())
            .count(),
        sentences: count_sentences(&transcript, &segmenter_config.sentence_rules),
        corrections: matched.spans.len(),
        ambiguous_spans: matched.warnings.len(),
        already_canonical: matched.already_canonical,
        paragraphs: rendered.paragraphs.len(),
    };

    info!(
        "Normalized {} words into {} paragraphs with {} corrections",
        stats.words, stats.paragraphs, stats.corrections
    );

    Ok(NormalizationOutcome {
        text: rendered.text,
        paragraphs: rendered.paragraphs,
        corrections: matched.spans,
        boundaries: segmented.boundaries,
        warnings: matched.warnings,
        fidelity,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{boundaries_are_valid, GlossaryEntry};

    fn walsh_glossary() -> Glossary {
        Glossary::new(vec![GlossaryEntry::with_variants(
            "Siobhan Walsh",
            ["Shavon Walsh", "Shevon Walsh"],
        )])
    }

    #[test]
    fn test_variant_is_corrected_in_place() {
        let outcome = normalize_transcript(
            "Last week we interviewed Shavon Walsh about the launch.",
            &walsh_glossary(),
            &NormalizerConfig::default(),
        )
        .unwrap();

        assert_eq!(
            outcome.text,
            "Last week we interviewed Siobhan Walsh about the launch."
        );
        assert_eq!(outcome.corrections.len(), 1);
        assert_eq!(outcome.stats.corrections, 1);
    }

    #[test]
    fn test_long_run_splits_near_character_limit() {
        let text = (1..=15)
            .map(|i| format!("Sentence {:02} is here and it keeps going on and on for a while.", i))
            .collect::<Vec<_>>()
            .join(" ");
        assert!(text.len() > 900);
        let config = NormalizerConfig {
            max_sentences_per_paragraph: 100,
            max_chars_per_paragraph: 600,
            ..Default::default()
        };

        let outcome = normalize_transcript(&text, &Glossary::default(), &config).unwrap();

        assert_eq!(outcome.paragraphs.len(), 2);
        assert!(outcome.paragraphs[0]
            .text
            .ends_with("Sentence 10 is here and it keeps going on and on for a while."));
        assert!(outcome.paragraphs[1].text.starts_with("Sentence 11"));
        assert_eq!(outcome.text.matches("\n\n").count(), 1);
    }

    #[test]
    fn test_abbreviation_does_not_end_paragraph() {
        let config = NormalizerConfig {
            max_sentences_per_paragraph: 1,
            ..Default::default()
        };
        let outcome = normalize_transcript(
            "Dr. Smith arrived. He sat down.",
            &Glossary::default(),
            &config,
        )
        .unwrap();

        assert_eq!(outcome.text, "Dr. Smith arrived.\n\nHe sat down.");
    }

    #[test]
    fn test_ambiguous_name_is_left_alone() {
        let glossary = Glossary::new(vec![
            GlossaryEntry::new("Mark Hale"),
            GlossaryEntry::new("Mark Hall"),
        ]);
        let text = "Then Mark Hal joined the call.";
        let outcome = normalize_transcript(text, &glossary, &NormalizerConfig::default()).unwrap();

        assert_eq!(outcome.text, text);
        assert!(outcome.corrections.is_empty());
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[test]
    fn test_second_run_makes_no_corrections() {
        let glossary = walsh_glossary();
        let config = NormalizerConfig {
            max_sentences_per_paragraph: 2,
            ..Default::default()
        };
        let text = "I met Shavon Walsh. Then Shevon Walsh called. Later we spoke again.";

        let first = normalize_transcript(text, &glossary, &config).unwrap();
        assert_eq!(first.corrections.len(), 2);

        let second = normalize_transcript(&first.text, &glossary, &config).unwrap();
        assert!(second.corrections.is_empty());
        assert_eq!(second.stats.already_canonical, 2);
        assert_eq!(second.text, first.text);
    }

    #[test]
    fn test_output_keeps_every_word() {
        let text = "so um we we started late\nand then  the the demo broke. Anyway!";
        let outcome =
            normalize_transcript(text, &Glossary::default(), &NormalizerConfig::default()).unwrap();

        let words = |s: &str| -> Vec<String> {
            tokenize(s, &[])
                .tokens
                .into_iter()
                .filter(|t| !t.is_whitespace())
                .map(|t| t.text)
                .collect()
        };
        assert_eq!(words(&outcome.text), words(text));
        assert_eq!(outcome.fidelity.words_compared, words(text).len());
    }

    #[test]
    fn test_speaker_turns_become_paragraphs() {
        let config = NormalizerConfig {
            speaker_marker_patterns: vec!["^[A-Z][a-z]+:".to_string()],
            ..Default::default()
        };
        let outcome = normalize_transcript(
            "Host: Welcome back.\nGuest: Thanks for having me.",
            &Glossary::default(),
            &config,
        )
        .unwrap();

        assert_eq!(
            outcome.text,
            "Host: Welcome back.\n\nGuest: Thanks for having me."
        );
        assert_eq!(outcome.stats.speaker_markers, 2);
        assert!(boundaries_are_valid(&outcome.boundaries, &outcome.corrections));
    }

    #[test]
    fn test_marker_text_inside_a_word_is_not_a_marker() {
        let config = NormalizerConfig {
            speaker_marker_patterns: vec!["Q:".to_string()],
            ..Default::default()
        };
        let text = "Read the FAQ: it helps. Q: why?";
        let outcome = normalize_transcript(text, &Glossary::default(), &config).unwrap();

        assert!(outcome.text.contains("FAQ: it helps."));
        assert_eq!(outcome.stats.speaker_markers, 1);
        assert_eq!(outcome.fidelity.words_compared, 11);
    }

    #[test]
    fn test_corrections_next_to_sentence_ends_keep_boundaries_valid() {
        let config = NormalizerConfig {
            max_sentences_per_paragraph: 1,
            ..Default::default()
        };
        let text = "I met Shavon Walsh. Shevon Walsh called back. We spoke to Shavon Walsh.";
        let outcome = normalize_transcript(text, &walsh_glossary(), &config).unwrap();

        assert_eq!(outcome.corrections.len(), 3);
        assert_eq!(
            outcome.text,
            "I met Siobhan Walsh.\n\nSiobhan Walsh called back.\n\nWe spoke to Siobhan Walsh."
        );
        assert!(boundaries_are_valid(&outcome.boundaries, &outcome.corrections));
    }

    #[test]
    fn test_input_errors_stop_the_run() {
        let err = normalize_bytes(b"ok \xc3", &walsh_glossary(), &NormalizerConfig::default())
            .unwrap_err();
        assert!(matches!(err, NormalizeError::MalformedInput { offset: 3, .. }));

        let config = NormalizerConfig {
            fuzzy_match_threshold: -0.1,
            ..Default::default()
        };
        let err = normalize_transcript("text", &Glossary::default(), &config).unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidConfig { .. }));
    }
}
