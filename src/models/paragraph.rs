use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::CorrectionSpan;

/// Why a paragraph boundary was placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryReason {
    /// Forced: a speaker marker starts here
    SpeakerChange,
    /// Forced: the source already had a blank line here
    SourceBreak,
    /// The running paragraph hit its sentence or character limit
    Length,
}

impl BoundaryReason {
    /// Forced boundaries may fall inside a sentence
    pub fn is_forced(&self) -> bool {
        matches!(self, Self::SpeakerChange | Self::SourceBreak)
    }
}

/// A cut point before the token at `token_index`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphBoundary {
    pub token_index: usize,
    pub reason: BoundaryReason,
}

/// One rendered paragraph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Token indices [start, end) the paragraph was rendered from
    pub token_range: Range<usize>,
    /// Rendered text, without the surrounding paragraph breaks
    pub text: String,
}

/// Final renderer output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedTranscript {
    /// The complete document
    pub text: String,
    pub paragraphs: Vec<Paragraph>,
}

/// Check the boundary invariant: strictly increasing and never splitting a span
pub fn boundaries_are_valid(boundaries: &[ParagraphBoundary], spans: &[CorrectionSpan]) -> bool {
    let increasing = boundaries
        .windows(2)
        .all(|pair| pair[0].token_index < pair[1].token_index);
    let clear_of_spans = boundaries
        .iter()
        .all(|b| !spans.iter().any(|s| s.splits_at(b.token_index)));
    increasing && clear_of_spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchKind;

    #[test]
    fn test_boundaries_are_valid() {
        let span = CorrectionSpan {
            token_range: 4..7,
            start_offset: 0,
            end_offset: 0,
            original_text: String::new(),
            replacement_text: String::new(),
            confidence: 1.0,
            match_kind: MatchKind::Variant,
        };
        let at = |token_index| ParagraphBoundary {
            token_index,
            reason: BoundaryReason::Length,
        };

        assert!(boundaries_are_valid(&[at(2), at(4), at(7)], std::slice::from_ref(&span)));
        assert!(!boundaries_are_valid(&[at(5)], std::slice::from_ref(&span)));
        assert!(!boundaries_are_valid(&[at(7), at(7)], &[]));
    }
}
