use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Kind of a transcript token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Alphanumeric run, including internal apostrophes, hyphens and digit separators
    Word,
    /// Any other non-whitespace character (terminal runs like "..." stay together)
    Punctuation,
    /// A collapsed whitespace run
    Whitespace,
    /// A speaker label matched by a caller-supplied pattern, e.g. "Jane Doe:"
    SpeakerMarker,
}

/// A slice of the original input. The text is never changed by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Exact source text covered by this token
    pub text: String,
    pub kind: TokenKind,
    /// Byte offset of the first byte in the original input
    pub start_offset: usize,
    /// Byte offset one past the last byte in the original input
    pub end_offset: usize,
    /// Number of newlines in a whitespace run (0 for other kinds)
    pub newlines: usize,
}

impl Token {
    pub fn new(text: &str, kind: TokenKind, start_offset: usize) -> Self {
        let newlines = if kind == TokenKind::Whitespace {
            text.matches('\n').count()
        } else {
            0
        };
        Self {
            text: text.to_string(),
            kind,
            start_offset,
            end_offset: start_offset + text.len(),
            newlines,
        }
    }

    pub fn is_word(&self) -> bool {
        self.kind == TokenKind::Word
    }

    pub fn is_whitespace(&self) -> bool {
        self.kind == TokenKind::Whitespace
    }

    pub fn is_speaker_marker(&self) -> bool {
        self.kind == TokenKind::SpeakerMarker
    }

    /// Whether this whitespace run already separates paragraphs (a blank line)
    pub fn is_paragraph_gap(&self) -> bool {
        self.is_whitespace() && self.newlines >= 2
    }

    /// Length in characters, used for paragraph sizing
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// The source text together with its full token cover
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenizedTranscript {
    /// The text the tokens were produced from
    pub source: String,
    /// All tokens in order, covering `source` without gaps
    pub tokens: Vec<Token>,
}

impl TokenizedTranscript {
    /// Get a token by its index
    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Number of word tokens
    pub fn word_count(&self) -> usize {
        self.tokens.iter().filter(|t| t.is_word()).count()
    }

    /// Source text covered by a token range
    pub fn source_slice(&self, range: Range<usize>) -> &str {
        match (self.tokens.get(range.start), range.end.checked_sub(1).and_then(|i| self.tokens.get(i))) {
            (Some(first), Some(last)) if range.start < range.end => {
                &self.source[first.start_offset..last.end_offset]
            }
            _ => "",
        }
    }

    /// Index of the first non-whitespace token strictly after `index`
    pub fn next_non_whitespace(&self, index: usize) -> Option<usize> {
        (index + 1..self.tokens.len()).find(|&i| !self.tokens[i].is_whitespace())
    }

    /// Index of the last non-whitespace token strictly before `index`
    pub fn prev_non_whitespace(&self, index: usize) -> Option<usize> {
        (0..index.min(self.tokens.len()))
            .rev()
            .find(|&i| !self.tokens[i].is_whitespace())
    }
}
