use std::ops::Range;

use rphonetic::DoubleMetaphone;
use tracing::{debug, info, warn};

use crate::heuristics::similarity::{
    common_prefix_len, length_lower_bound, normalize_phrase, normalized_edit_distance,
    phonetically_compatible, phrase_keys, phrase_word_count, PhoneticKey,
};
use crate::models::{
    AmbiguousEntityWarning, CorrectionSpan, Glossary, MatchKind, TokenizedTranscript,
};

/// Distances closer than this are considered equal
const TIE_EPSILON: f64 = 1e-9;

/// Configuration for Stage 1 entity matching
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Spans whose normalized edit distance to a canonical form is below this are corrected
    pub fuzzy_match_threshold: f64,
    /// Require word-by-word Double Metaphone agreement before computing edit distance
    pub phonetic_prefilter: bool,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            fuzzy_match_threshold: 0.2,
            phonetic_prefilter: true,
        }
    }
}

/// Result of Stage 1 entity matching
#[derive(Debug, Clone, Default)]
pub struct MatchResult {
    /// Accepted corrections, sorted and non-overlapping
    pub spans: Vec<CorrectionSpan>,
    /// Spans left uncorrected because several entries tied
    pub warnings: Vec<AmbiguousEntityWarning>,
    /// Spans already spelled canonically
    pub already_canonical: usize,
}

/// Glossary entry with its comparison forms computed once per run
struct PreparedEntry<'a> {
    canonical: &'a str,
    normalized: String,
    words: usize,
    keys: Vec<PhoneticKey>,
    variants: Vec<String>,
}

impl<'a> PreparedEntry<'a> {
    fn prepare(glossary: &'a Glossary, encoder: &DoubleMetaphone) -> Vec<Self> {
        glossary
            .entries()
            .iter()
            .map(|entry| {
                let words = phrase_word_count(&entry.canonical);
                let variants = entry
                    .variants
                    .iter()
                    .filter(|v| {
                        let usable = phrase_word_count(v) == words;
                        if !usable {
                            debug!(
                                "Ignoring variant {:?} of {:?}: word count differs",
                                v, entry.canonical
                            );
                        }
                        usable
                    })
                    .map(|v| normalize_phrase(v))
                    .collect();
                PreparedEntry {
                    canonical: &entry.canonical,
                    normalized: normalize_phrase(&entry.canonical),
                    words,
                    keys: phrase_keys(encoder, &entry.canonical),
                    variants,
                }
            })
            .collect()
    }
}

/// What a candidate span resolves to
#[derive(Debug, Clone)]
enum Verdict {
    Correct { replacement: String, kind: MatchKind },
    /// Already the canonical spelling; holds its tokens but changes nothing
    Anchor,
    Ambiguous { candidates: Vec<String> },
}

#[derive(Debug, Clone)]
struct Candidate {
    token_range: Range<usize>,
    word_len: usize,
    confidence: f64,
    verdict: Verdict,
}

/// Execute Stage 1: Entity matching
///
/// For every word n-gram inside a run of words (runs end at punctuation,
/// speaker markers and blank lines):
/// 1. An exact canonical spelling becomes an anchor
/// 2. An exact variant hit is a correction with confidence 1.0
/// 3. Otherwise a same-length canonical under the fuzzy threshold is a correction
/// 4. Overlapping candidates resolve to the longest, then most confident
///
/// The token sequence is never modified.
pub fn execute_stage1(
    transcript: &TokenizedTranscript,
    glossary: &Glossary,
    config: &MatcherConfig,
) -> MatchResult {
    let max_words = glossary.max_words();
    if glossary.is_empty() || max_words == 0 {
        info!("Stage 1: empty glossary, nothing to match");
        return MatchResult::default();
    }

    let encoder = DoubleMetaphone::default();
    let entries = PreparedEntry::prepare(glossary, &encoder);

    let mut candidates = Vec::new();
    for run in word_runs(transcript) {
        for n in 1..=max_words.min(run.len()) {
            for window in run.windows(n) {
                let words: Vec<&str> = window
                    .iter()
                    .map(|&i| transcript.tokens[i].text.as_str())
                    .collect();
                let token_range = window[0]..window[n - 1] + 1;
                if let Some((confidence, verdict)) =
                    evaluate_span(&words, &entries, &encoder, config)
                {
                    candidates.push(Candidate {
                        token_range,
                        word_len: n,
                        confidence,
                        verdict,
                    });
                }
            }
        }
    }

    let result = resolve_overlaps(transcript, candidates);

    for warning in &result.warnings {
        warn!("Stage 1: {}", warning);
    }
    info!(
        "Stage 1: {} corrections, {} ambiguous spans, {} already canonical",
        result.spans.len(),
        result.warnings.len(),
        result.already_canonical
    );

    result
}

/// Word token indices grouped into runs separated only by plain whitespace
fn word_runs(transcript: &TokenizedTranscript) -> Vec<Vec<usize>> {
    let mut runs = Vec::new();
    let mut current: Vec<usize> = Vec::new();

    for (i, token) in transcript.tokens.iter().enumerate() {
        if token.is_word() {
            current.push(i);
        } else if token.is_whitespace() && !token.is_paragraph_gap() {
            continue;
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }

    runs
}

/// Score one span against every entry
fn evaluate_span(
    words: &[&str],
    entries: &[PreparedEntry],
    encoder: &DoubleMetaphone,
    config: &MatcherConfig,
) -> Option<(f64, Verdict)> {
    let exact = words.join(" ");
    if entries.iter().any(|e| e.canonical == exact) {
        return Some((1.0, Verdict::Anchor));
    }

    let normalized = exact.to_lowercase();

    // 1. Known variants
    let variant_hits: Vec<&PreparedEntry> = entries
        .iter()
        .filter(|e| e.variants.iter().any(|v| *v == normalized))
        .collect();
    if !variant_hits.is_empty() {
        return Some((1.0, break_tie(&normalized, &variant_hits, MatchKind::Variant)));
    }

    // 2. Fuzzy match against same-length canonicals
    let threshold = config.fuzzy_match_threshold;
    let mut span_keys: Option<Vec<PhoneticKey>> = None;
    let mut scored: Vec<(&PreparedEntry, f64)> = Vec::new();

    for entry in entries.iter().filter(|e| e.words == words.len()) {
        if length_lower_bound(&normalized, &entry.normalized) >= threshold {
            continue;
        }
        if config.phonetic_prefilter {
            let keys = span_keys.get_or_insert_with(|| phrase_keys(encoder, &exact));
            if !phonetically_compatible(keys, &entry.keys) {
                continue;
            }
        }
        let distance = normalized_edit_distance(&normalized, &entry.normalized);
        if distance < threshold {
            scored.push((entry, distance));
        }
    }

    let best = scored
        .iter()
        .map(|(_, d)| *d)
        .min_by(|a, b| a.total_cmp(b))?;
    let closest: Vec<&PreparedEntry> = scored
        .iter()
        .filter(|(_, d)| (*d - best).abs() < TIE_EPSILON)
        .map(|(e, _)| *e)
        .collect();

    Some((1.0 - best, break_tie(&normalized, &closest, MatchKind::Fuzzy)))
}

/// Pick among equally close entries by longest common prefix, else report ambiguity
fn break_tie(normalized: &str, tied: &[&PreparedEntry], kind: MatchKind) -> Verdict {
    if let [only] = tied {
        return Verdict::Correct {
            replacement: only.canonical.to_string(),
            kind,
        };
    }

    let prefixes: Vec<usize> = tied
        .iter()
        .map(|e| common_prefix_len(normalized, &e.normalized))
        .collect();
    let longest = prefixes.iter().copied().max().unwrap_or(0);
    let leaders: Vec<&PreparedEntry> = tied
        .iter()
        .zip(&prefixes)
        .filter(|(_, p)| **p == longest)
        .map(|(e, _)| *e)
        .collect();

    match leaders.as_slice() {
        [winner] => Verdict::Correct {
            replacement: winner.canonical.to_string(),
            kind,
        },
        _ => Verdict::Ambiguous {
            candidates: leaders.iter().map(|e| e.canonical.to_string()).collect(),
        },
    }
}

/// Keep the longest, then most confident, then earliest candidates that do not overlap
fn resolve_overlaps(transcript: &TokenizedTranscript, mut candidates: Vec<Candidate>) -> MatchResult {
    candidates.sort_by(|a, b| {
        b.word_len
            .cmp(&a.word_len)
            .then(b.confidence.total_cmp(&a.confidence))
            .then(a.token_range.start.cmp(&b.token_range.start))
    });

    let mut occupied = vec![false; transcript.len()];
    let mut accepted: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        if occupied[candidate.token_range.clone()].iter().any(|&o| o) {
            continue;
        }
        occupied[candidate.token_range.clone()].fill(true);
        accepted.push(candidate);
    }
    accepted.sort_by_key(|c| c.token_range.start);

    let mut result = MatchResult::default();
    for candidate in accepted {
        let original_text = transcript.source_slice(candidate.token_range.clone()).to_string();
        match candidate.verdict {
            Verdict::Correct { replacement, kind } => {
                debug!(
                    "Correcting {:?} -> {:?} ({:?}, confidence {:.3})",
                    original_text, replacement, kind, candidate.confidence
                );
                let first = &transcript.tokens[candidate.token_range.start];
                let last = &transcript.tokens[candidate.token_range.end - 1];
                result.spans.push(CorrectionSpan {
                    start_offset: first.start_offset,
                    end_offset: last.end_offset,
                    token_range: candidate.token_range,
                    original_text,
                    replacement_text: replacement,
                    confidence: candidate.confidence,
                    match_kind: kind,
                });
            }
            Verdict::Anchor => result.already_canonical += 1,
            Verdict::Ambiguous { candidates } => {
                result.warnings.push(AmbiguousEntityWarning {
                    token_range: candidate.token_range,
                    original_text,
                    candidates,
                });
            }
        }
    }

    result
}
