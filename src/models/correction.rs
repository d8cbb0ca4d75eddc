use std::ops::Range;

use serde::{Deserialize, Serialize};

/// How a correction span was matched to its glossary entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Exact (case-insensitive) hit on a known variant
    Variant,
    /// Normalized edit distance to the canonical form under the threshold
    Fuzzy,
}

/// A token range whose text is replaced by a canonical glossary spelling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionSpan {
    /// Token indices [start, end) in the tokenized transcript
    pub token_range: Range<usize>,
    /// Byte offset of the span in the original input
    pub start_offset: usize,
    /// Byte offset one past the span in the original input
    pub end_offset: usize,
    /// Source text covered by the span
    pub original_text: String,
    /// Canonical spelling rendered in its place
    pub replacement_text: String,
    /// Match confidence (0-1)
    pub confidence: f64,
    pub match_kind: MatchKind,
}

impl CorrectionSpan {
    /// Whether a token index falls strictly inside the span (a cut there would split it)
    pub fn splits_at(&self, token_index: usize) -> bool {
        self.token_range.start < token_index && token_index < self.token_range.end
    }
}

/// Soft diagnostic: a span matched several glossary entries equally well and was left alone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmbiguousEntityWarning {
    /// Token indices [start, end) of the uncorrected span
    pub token_range: Range<usize>,
    /// Source text of the span
    pub original_text: String,
    /// Canonical spellings that tied
    pub candidates: Vec<String>,
}

impl std::fmt::Display for AmbiguousEntityWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ambiguous entity {:?} at tokens {}..{} (candidates: {})",
            self.original_text,
            self.token_range.start,
            self.token_range.end,
            self.candidates.join(", ")
        )
    }
}

/// Check the span list invariant: sorted by start and non-overlapping
pub fn spans_are_ordered(spans: &[CorrectionSpan]) -> bool {
    spans.windows(2).all(|pair| {
        pair[0].token_range.start < pair[1].token_range.start
            && pair[0].token_range.end <= pair[1].token_range.start
            && pair[0].end_offset <= pair[1].start_offset
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(range: Range<usize>) -> CorrectionSpan {
        CorrectionSpan {
            token_range: range,
            start_offset: 0,
            end_offset: 0,
            original_text: String::new(),
            replacement_text: String::new(),
            confidence: 1.0,
            match_kind: MatchKind::Variant,
        }
    }

    #[test]
    fn test_splits_at_is_strict() {
        let s = span(4..7);
        assert!(!s.splits_at(4));
        assert!(s.splits_at(5));
        assert!(s.splits_at(6));
        assert!(!s.splits_at(7));
    }

    #[test]
    fn test_spans_are_ordered() {
        assert!(spans_are_ordered(&[span(0..3), span(3..5), span(8..9)]));
        assert!(!spans_are_ordered(&[span(0..3), span(2..5)]));
        assert!(!spans_are_ordered(&[span(4..5), span(0..3)]));
    }

    #[test]
    fn test_warning_display() {
        let warning = AmbiguousEntityWarning {
            token_range: 2..5,
            original_text: "Mark Hal".to_string(),
            candidates: vec!["Mark Hale".to_string(), "Mark Hall".to_string()],
        };
        assert_eq!(
            warning.to_string(),
            "ambiguous entity \"Mark Hal\" at tokens 2..5 (candidates: Mark Hale, Mark Hall)"
        );
    }
}
