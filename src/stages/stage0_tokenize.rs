use std::ops::Range;

use regex::Regex;
use tracing::info;

use crate::error::NormalizeError;
use crate::heuristics::sentences::TERMINAL_PUNCTUATION;
use crate::models::{Token, TokenKind, TokenizedTranscript};

/// Compile caller-supplied speaker-marker patterns.
///
/// Patterns are compiled in multi-line mode so `^` anchors at the start of
/// every line, e.g. `^[A-Z][A-Za-z .'-]{0,40}:`.
pub fn compile_speaker_patterns(patterns: &[String]) -> Result<Vec<Regex>, NormalizeError> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(&format!("(?m){}", p)).map_err(|e| {
                NormalizeError::invalid_config(format!("speaker marker pattern {:?}: {}", p, e))
            })
        })
        .collect()
}

/// Perform Stage 0: tokenization of raw bytes.
///
/// Fails only when the bytes are not valid UTF-8.
pub fn tokenize_bytes(
    bytes: &[u8],
    speaker_patterns: &[Regex],
) -> Result<TokenizedTranscript, NormalizeError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| NormalizeError::malformed(e.valid_up_to(), e.to_string()))?;
    Ok(tokenize(text, speaker_patterns))
}

/// Perform Stage 0: tokenization.
///
/// Every byte of `text` lands in exactly one token:
/// 1. Speaker-marker matches become single marker tokens
/// 2. Whitespace runs collapse into one token keeping their newline count
/// 3. Alphanumeric runs (with inner apostrophes, hyphens, digit separators) become words
/// 4. Everything else is punctuation, with terminal runs like "..." kept together
pub fn tokenize(text: &str, speaker_patterns: &[Regex]) -> TokenizedTranscript {
    let transcript = scan(text, speaker_patterns);

    info!(
        "Stage 0: {} tokens ({} words, {} speaker markers)",
        transcript.len(),
        transcript.word_count(),
        transcript
            .tokens
            .iter()
            .filter(|t| t.is_speaker_marker())
            .count()
    );

    transcript
}

/// Tokenize without the stage summary, for internal re-scans
pub(crate) fn scan(text: &str, speaker_patterns: &[Regex]) -> TokenizedTranscript {
    let mut tokens = Vec::new();
    let mut cursor = 0;

    for marker in find_speaker_markers(text, speaker_patterns) {
        scan_plain(text, cursor, marker.start, &mut tokens);
        tokens.push(Token::new(
            &text[marker.clone()],
            TokenKind::SpeakerMarker,
            marker.start,
        ));
        cursor = marker.end;
    }
    scan_plain(text, cursor, text.len(), &mut tokens);

    TokenizedTranscript {
        source: text.to_string(),
        tokens,
    }
}

/// Non-empty, non-overlapping marker matches, leftmost first, longest on ties.
/// A match must not start in the middle of a word ("Q:" inside "FAQ:").
fn find_speaker_markers(text: &str, patterns: &[Regex]) -> Vec<Range<usize>> {
    let mut matches: Vec<Range<usize>> = patterns
        .iter()
        .flat_map(|re| re.find_iter(text))
        .filter(|m| !m.is_empty())
        .filter(|m| {
            text[..m.start()]
                .chars()
                .next_back()
                .is_none_or(|c| !c.is_alphanumeric())
        })
        .map(|m| m.range())
        .collect();
    matches.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut accepted: Vec<Range<usize>> = Vec::new();
    for m in matches {
        if accepted.last().is_none_or(|last| m.start >= last.end) {
            accepted.push(m);
        }
    }
    accepted
}

/// Tokenize `text[start..end]`, which contains no speaker markers
fn scan_plain(text: &str, start: usize, end: usize, tokens: &mut Vec<Token>) {
    if start >= end {
        return;
    }

    let chars: Vec<(usize, char)> = text[start..end]
        .char_indices()
        .map(|(i, c)| (i + start, c))
        .collect();
    let n = chars.len();
    let offset_at = |j: usize| if j < n { chars[j].0 } else { end };

    let mut i = 0;
    while i < n {
        let c = chars[i].1;
        let mut j = i + 1;

        let kind = if c.is_whitespace() {
            while j < n && chars[j].1.is_whitespace() {
                j += 1;
            }
            TokenKind::Whitespace
        } else if c.is_alphanumeric() {
            loop {
                if j < n && chars[j].1.is_alphanumeric() {
                    j += 1;
                } else if j + 1 < n && joins_word(chars[j - 1].1, chars[j].1, chars[j + 1].1) {
                    j += 2;
                } else {
                    break;
                }
            }
            TokenKind::Word
        } else if TERMINAL_PUNCTUATION.contains(&c) {
            while j < n && TERMINAL_PUNCTUATION.contains(&chars[j].1) {
                j += 1;
            }
            TokenKind::Punctuation
        } else {
            TokenKind::Punctuation
        };

        let (from, to) = (chars[i].0, offset_at(j));
        tokens.push(Token::new(&text[from..to], kind, from));
        i = j;
    }
}

/// Whether `joiner` between `prev` and `next` keeps a word together
fn joins_word(prev: char, joiner: char, next: char) -> bool {
    match joiner {
        '\'' | '’' | '-' => prev.is_alphanumeric() && next.is_alphanumeric(),
        '.' | ',' => prev.is_ascii_digit() && next.is_ascii_digit(),
        _ => false,
    }
}
