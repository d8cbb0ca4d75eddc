use tracing::{debug, info};

use crate::heuristics::sentences::{is_sentence_end, SentenceRules};
use crate::models::{BoundaryReason, CorrectionSpan, ParagraphBoundary, TokenizedTranscript};

/// Configuration for Stage 2 paragraph segmentation
#[derive(Debug, Clone)]
pub struct SegmenterConfig {
    /// Break after this many sentences
    pub max_sentences_per_paragraph: usize,
    /// Break at the sentence end nearest this many characters
    pub max_chars_per_paragraph: usize,
    /// Sentence-end heuristics
    pub sentence_rules: SentenceRules,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            max_sentences_per_paragraph: 5,
            max_chars_per_paragraph: 600,
            sentence_rules: SentenceRules::default(),
        }
    }
}

/// Result of Stage 2 segmentation
#[derive(Debug, Clone, Default)]
pub struct SegmentationResult {
    /// Cut points, strictly increasing
    pub boundaries: Vec<ParagraphBoundary>,
    /// Sentence ends seen
    pub sentences: usize,
}

impl SegmentationResult {
    /// Boundaries placed at speaker changes or source blank lines
    pub fn forced_count(&self) -> usize {
        self.boundaries.iter().filter(|b| b.reason.is_forced()).count()
    }
}

/// Running state of the paragraph being built
#[derive(Debug, Default)]
struct Running {
    chars: usize,
    sentences: usize,
    has_content: bool,
    /// Boundary index after the previous sentence end and the char count there
    pending: Option<(usize, usize)>,
}

/// Execute Stage 2: Paragraph segmentation
///
/// Policy in priority order:
/// 1. Forced boundaries at speaker markers and at blank lines already in the source
/// 2. Length boundaries at sentence ends once the sentence or character limit is reached
/// 3. Never inside a sentence or a correction span
pub fn execute_stage2(
    transcript: &TokenizedTranscript,
    spans: &[CorrectionSpan],
    config: &SegmenterConfig,
) -> SegmentationResult {
    let mut result = SegmentationResult::default();
    let mut running = Running::default();
    let max_chars = config.max_chars_per_paragraph.max(1);
    let max_sentences = config.max_sentences_per_paragraph.max(1);

    for (i, token) in transcript.tokens.iter().enumerate() {
        if token.is_speaker_marker() {
            if running.has_content {
                push_boundary(&mut result, spans, i, BoundaryReason::SpeakerChange);
            }
            running = Running {
                chars: token.char_len(),
                has_content: true,
                ..Default::default()
            };
            continue;
        }

        if token.is_paragraph_gap() {
            if running.has_content {
                if let Some(next) = transcript.next_non_whitespace(i) {
                    let reason = if transcript.tokens[next].is_speaker_marker() {
                        BoundaryReason::SpeakerChange
                    } else {
                        BoundaryReason::SourceBreak
                    };
                    push_boundary(&mut result, spans, next, reason);
                }
            }
            running = Running::default();
            continue;
        }

        running.chars += token.char_len();
        if !token.is_whitespace() {
            running.has_content = true;
        }

        // Spans cover only words and whitespace, so a sentence end is never inside one
        if !is_sentence_end(transcript, i, &config.sentence_rules) {
            continue;
        }
        result.sentences += 1;
        running.sentences += 1;

        // A forced boundary (or the end of input) follows; it resets the paragraph itself
        let next = match transcript.next_non_whitespace(i) {
            Some(next) if !forced_between(transcript, i, next) => next,
            _ => continue,
        };

        if running.sentences >= max_sentences {
            push_boundary(&mut result, spans, next, BoundaryReason::Length);
            running = Running::default();
        } else if running.chars >= max_chars {
            match running.pending {
                Some((previous, chars_then)) if max_chars - chars_then < running.chars - max_chars => {
                    push_boundary(&mut result, spans, previous, BoundaryReason::Length);
                    let remainder = running.chars - chars_then;
                    if remainder >= max_chars {
                        push_boundary(&mut result, spans, next, BoundaryReason::Length);
                        running = Running::default();
                    } else {
                        running = Running {
                            chars: remainder,
                            sentences: 1,
                            has_content: true,
                            pending: Some((next, remainder)),
                        };
                    }
                }
                _ => {
                    push_boundary(&mut result, spans, next, BoundaryReason::Length);
                    running = Running::default();
                }
            }
        } else {
            running.pending = Some((next, running.chars));
        }
    }

    info!(
        "Stage 2: {} sentences, {} paragraph boundaries ({} forced)",
        result.sentences,
        result.boundaries.len(),
        result.forced_count()
    );

    result
}

/// Whether a speaker marker or blank line sits between a sentence end and the next token
fn forced_between(transcript: &TokenizedTranscript, end: usize, next: usize) -> bool {
    transcript.tokens[next].is_speaker_marker()
        || transcript.tokens[end + 1..next]
            .iter()
            .any(|t| t.is_paragraph_gap())
}

fn push_boundary(
    result: &mut SegmentationResult,
    spans: &[CorrectionSpan],
    token_index: usize,
    reason: BoundaryReason,
) {
    if token_index == 0
        || result
            .boundaries
            .last()
            .is_some_and(|b| b.token_index >= token_index)
        || span_split_at(spans, token_index)
    {
        return;
    }
    debug!("Paragraph boundary before token {} ({:?})", token_index, reason);
    result.boundaries.push(ParagraphBoundary {
        token_index,
        reason,
    });
}

/// Whether a boundary at `token_index` would cut a span; `spans` are sorted
fn span_split_at(spans: &[CorrectionSpan], token_index: usize) -> bool {
    let first_ending_after = spans.partition_point(|s| s.token_range.end <= token_index);
    spans
        .get(first_ending_after)
        .is_some_and(|s| s.splits_at(token_index))
}
