use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::NormalizeError;
use crate::models::{spans_are_ordered, CorrectionSpan};
use crate::stages::stage0_tokenize::scan;

/// Summary of a passed fidelity check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FidelityReport {
    /// Length of the whitespace-free comparison sequence
    pub words_compared: usize,
    pub corrections_checked: usize,
}

/// Execute Stage 4: Fidelity verification
///
/// Confirms that `rendered` equals `original` word for word once whitespace
/// is ignored and each span's original text is swapped for its replacement.
/// Any difference is a hard failure.
pub fn verify_fidelity(
    original: &str,
    rendered: &str,
    spans: &[CorrectionSpan],
) -> Result<FidelityReport, NormalizeError> {
    check_spans(original, spans)?;

    let expected_text = apply_corrections(original, spans);
    let expected = comparison_sequence(&expected_text);
    let found = comparison_sequence(rendered);

    for index in 0..expected.len().max(found.len()) {
        let (e, f) = (expected.get(index), found.get(index));
        if e != f {
            return Err(NormalizeError::fidelity(
                index,
                e.map(String::as_str),
                f.map(String::as_str),
            ));
        }
    }

    info!(
        "Stage 4: fidelity verified ({} words, {} corrections)",
        expected.len(),
        spans.len()
    );

    Ok(FidelityReport {
        words_compared: expected.len(),
        corrections_checked: spans.len(),
    })
}

/// Every span must quote the original exactly and keep its word count.
/// The word index is only computed for the span that fails.
fn check_spans(original: &str, spans: &[CorrectionSpan]) -> Result<(), NormalizeError> {
    if !spans_are_ordered(spans) {
        let index = spans.first().map_or(0, |s| words_before(original, s.start_offset));
        return Err(NormalizeError::fidelity(index, None, None));
    }

    for span in spans {
        let quoted = original.get(span.start_offset..span.end_offset);
        if quoted != Some(span.original_text.as_str()) {
            return Err(NormalizeError::fidelity(
                words_before(original, span.start_offset),
                Some(span.original_text.as_str()),
                quoted,
            ));
        }

        let (before, after) = (
            span.original_text.split_whitespace().count(),
            span.replacement_text.split_whitespace().count(),
        );
        if before != after {
            debug!(
                "Correction {:?} -> {:?} changes word count {} -> {}",
                span.original_text, span.replacement_text, before, after
            );
            return Err(NormalizeError::fidelity(
                words_before(original, span.start_offset),
                Some(span.original_text.as_str()),
                Some(span.replacement_text.as_str()),
            ));
        }
    }
    Ok(())
}

/// The original text with every span's offsets replaced by its canonical text
fn apply_corrections(original: &str, spans: &[CorrectionSpan]) -> String {
    let mut out = String::with_capacity(original.len());
    let mut cursor = 0;
    for span in spans {
        out.push_str(&original[cursor..span.start_offset]);
        out.push_str(&span.replacement_text);
        cursor = span.end_offset;
    }
    out.push_str(&original[cursor..]);
    out
}

/// Words and punctuation in order, whitespace dropped
fn comparison_sequence(text: &str) -> Vec<String> {
    scan(text, &[])
        .tokens
        .into_iter()
        .filter(|t| !t.is_whitespace())
        .map(|t| t.text)
        .collect()
}

/// Position in the comparison sequence of the first token at or after `offset`
fn words_before(text: &str, offset: usize) -> usize {
    scan(text, &[])
        .tokens
        .iter()
        .filter(|t| !t.is_whitespace() && t.end_offset <= offset)
        .count()
}
