use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::error::NormalizeError;
use crate::heuristics::sentences::TERMINAL_PUNCTUATION;

/// Inline cue markup: `<c>`, `</c>`, `<v Speaker>`, `<00:00:01.500>`
static INLINE_TAG_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>\n]*>").unwrap());

/// Audio descriptions such as `(music)` or `[Applause]`
static AUDIO_DESCRIPTION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\([^)\n]*\)|\[[^\]\n]*\]").unwrap());

static MULTI_SPACE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]{2,}").unwrap());

/// Header-like blocks that carry no caption text
const SKIPPED_BLOCKS: &[&str] = &["WEBVTT", "NOTE", "STYLE", "REGION"];

/// Read a WebVTT file and reduce it to plain transcript text
pub fn load_captions(path: &Path) -> Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read captions: {:?}", path))?;
    let content = std::str::from_utf8(&bytes)
        .map_err(|e| NormalizeError::malformed(e.valid_up_to(), e.to_string()))
        .with_context(|| format!("Captions are not UTF-8: {:?}", path))?;

    let text = clean_vtt(content);
    info!(
        "Converted captions {:?} to {} bytes of transcript text",
        path,
        text.len()
    );
    Ok(text)
}

/// Strip WebVTT structure, keeping only caption text.
///
/// Caption lines that end in terminal punctuation keep their line break;
/// all others are joined to the next line with a space.
pub fn clean_vtt(content: &str) -> String {
    let content = content.replace("\r\n", "\n");
    let mut lines: Vec<String> = Vec::new();

    for block in content.split("\n\n") {
        let block_lines: Vec<&str> = block.lines().filter(|l| !l.trim().is_empty()).collect();
        let Some(first) = block_lines.first() else {
            continue;
        };
        if SKIPPED_BLOCKS
            .iter()
            .any(|kw| first.trim_start().starts_with(kw))
        {
            debug!("Skipping caption block starting {:?}", first);
            continue;
        }

        // Cue identifier and timing line come before the text
        let text_start = block_lines
            .iter()
            .position(|l| l.contains("-->"))
            .map_or(0, |i| i + 1);

        for line in &block_lines[text_start..] {
            let line = INLINE_TAG_PATTERN.replace_all(line, "");
            let line = AUDIO_DESCRIPTION_PATTERN.replace_all(&line, "");
            let line = MULTI_SPACE_PATTERN.replace_all(&line, " ");
            let line = line.trim();
            if !line.is_empty() {
                lines.push(line.to_string());
            }
        }
    }

    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            let previous = &lines[i - 1];
            let ends_sentence = previous
                .trim_end_matches(['"', '\'', '”', '’', ')'])
                .ends_with(TERMINAL_PUNCTUATION);
            out.push(if ends_sentence { '\n' } else { ' ' });
        }
        out.push_str(line);
    }
    out
}
