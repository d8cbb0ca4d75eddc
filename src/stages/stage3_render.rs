use std::collections::{HashMap, HashSet};

use tracing::info;

use crate::models::{
    CorrectionSpan, Paragraph, ParagraphBoundary, RenderedTranscript, TokenizedTranscript,
};

/// Configuration for Stage 3 rendering
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Text emitted at every paragraph boundary
    pub paragraph_break: String,
    /// Render single line breaks inside a paragraph as a space
    pub reflow_line_breaks: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            paragraph_break: "\n\n".to_string(),
            reflow_line_breaks: false,
        }
    }
}

/// Execute Stage 3: Rendering
///
/// Emits every token verbatim except that:
/// 1. Each correction span's tokens are replaced by its canonical text
/// 2. The whitespace before each boundary becomes a paragraph break
///    (inserted when no whitespace precedes the boundary)
/// 3. With reflow on, single line breaks inside a paragraph become spaces
pub fn execute_stage3(
    transcript: &TokenizedTranscript,
    spans: &[CorrectionSpan],
    boundaries: &[ParagraphBoundary],
    config: &RenderConfig,
) -> RenderedTranscript {
    let spans_by_start: HashMap<usize, &CorrectionSpan> =
        spans.iter().map(|s| (s.token_range.start, s)).collect();
    let cuts: HashSet<usize> = boundaries
        .iter()
        .map(|b| b.token_index)
        .filter(|&i| i > 0 && i < transcript.len())
        .collect();

    let mut text = String::with_capacity(transcript.source.len());
    let mut paragraphs = Vec::new();
    let mut paragraph_start = 0usize;
    let mut paragraph_text_start = 0usize;

    let mut i = 0;
    while i < transcript.len() {
        if cuts.contains(&i) {
            paragraphs.push(Paragraph {
                token_range: paragraph_start..i,
                text: text[paragraph_text_start..].trim().to_string(),
            });
            text.push_str(&config.paragraph_break);
            paragraph_start = i;
            paragraph_text_start = text.len();
        }

        if let Some(span) = spans_by_start.get(&i) {
            text.push_str(&span.replacement_text);
            i = span.token_range.end;
            continue;
        }

        let token = &transcript.tokens[i];
        if token.is_whitespace() && cuts.contains(&(i + 1)) {
            // Replaced by the paragraph break
        } else if token.is_whitespace() && config.reflow_line_breaks && token.newlines == 1 {
            text.push(' ');
        } else {
            text.push_str(&token.text);
        }
        i += 1;
    }

    if !transcript.is_empty() {
        paragraphs.push(Paragraph {
            token_range: paragraph_start..transcript.len(),
            text: text[paragraph_text_start..].trim().to_string(),
        });
    }

    info!(
        "Stage 3: rendered {} paragraphs ({} bytes)",
        paragraphs.len(),
        text.len()
    );

    RenderedTranscript { text, paragraphs }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BoundaryReason, MatchKind};
    use crate::stages::tokenize;

    fn cut(token_index: usize) -> ParagraphBoundary {
        ParagraphBoundary {
            token_index,
            reason: BoundaryReason::Length,
        }
    }

    #[test]
    fn test_render_without_edits_is_verbatim() {
        let text = "  So, um, we started.\nThen  it rained!  ";
        let transcript = tokenize(text, &[]);
        let rendered = execute_stage3(&transcript, &[], &[], &RenderConfig::default());

        assert_eq!(rendered.text, text);
        assert_eq!(rendered.paragraphs.len(), 1);
    }

    #[test]
    fn test_render_applies_corrections() {
        let transcript = tokenize("met Shavon Walsh today", &[]);
        let span = CorrectionSpan {
            token_range: 2..5,
            start_offset: 4,
            end_offset: 16,
            original_text: "Shavon Walsh".to_string(),
            replacement_text: "Siobhan Walsh".to_string(),
            confidence: 1.0,
            match_kind: MatchKind::Variant,
        };
        let rendered = execute_stage3(&transcript, &[span], &[], &RenderConfig::default());

        assert_eq!(rendered.text, "met Siobhan Walsh today");
    }

    #[test]
    fn test_render_paragraph_breaks() {
        let transcript = tokenize("One. Two.Three.", &[]);
        // Tokens: One . ␠ Two . Three .
        let rendered = execute_stage3(
            &transcript,
            &[],
            &[cut(3), cut(5)],
            &RenderConfig::default(),
        );

        assert_eq!(rendered.text, "One.\n\nTwo.\n\nThree.");
        let texts: Vec<_> = rendered.paragraphs.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["One.", "Two.", "Three."]);
        assert_eq!(rendered.paragraphs[1].token_range, 3..5);
    }

    #[test]
    fn test_render_reflow_and_custom_break() {
        let transcript = tokenize("caption one\ncaption two.\n\nNext", &[]);
        let config = RenderConfig {
            paragraph_break: "\n\n\n".to_string(),
            reflow_line_breaks: true,
        };
        // Tokens: caption ␠ one ⏎ caption ␠ two . ⏎⏎ Next
        let rendered = execute_stage3(&transcript, &[], &[cut(9)], &config);

        assert_eq!(rendered.text, "caption one caption two.\n\n\nNext");
    }

    #[test]
    fn test_render_is_deterministic() {
        let transcript = tokenize("A. B. C. D.", &[]);
        let boundaries = [cut(3), cut(6)];
        let first = execute_stage3(&transcript, &[], &boundaries, &RenderConfig::default());
        let second = execute_stage3(&transcript, &[], &boundaries, &RenderConfig::default());
        assert_eq!(first, second);
    }
}
