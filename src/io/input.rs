use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::io::captions::load_captions;
use crate::models::Glossary;

/// Read a transcript file as raw bytes; decoding happens in the tokenizer
pub fn read_transcript(path: &Path) -> Result<Vec<u8>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read file: {:?}", path))?;
    info!("Loaded {} bytes from {:?}", bytes.len(), path);
    Ok(bytes)
}

/// Read a transcript, converting WebVTT captions to plain text when asked
/// or when the file has a `.vtt` extension
pub fn read_input(path: &Path, captions: bool) -> Result<Vec<u8>> {
    let is_vtt = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("vtt"));
    if captions || is_vtt {
        Ok(load_captions(path)?.into_bytes())
    } else {
        read_transcript(path)
    }
}

/// Load a glossary JSON file
pub fn load_glossary(path: &Path) -> Result<Glossary> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read glossary: {:?}", path))?;
    let glossary = Glossary::from_json(&content)
        .with_context(|| format!("Failed to parse glossary JSON: {:?}", path))?;
    info!("Loaded {} glossary entries from {:?}", glossary.len(), path);
    Ok(glossary)
}
