use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::{Glossary, GlossaryEntry};

/// Fields of a yt-dlp `video.info.json` sidecar that name people or outlets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoMetadata {
    pub channel: Option<String>,
    pub uploader: Option<String>,
    pub creator: Option<String>,
    /// May list several names separated by commas
    pub artist: Option<String>,
    pub fulltitle: Option<String>,
    pub upload_date: Option<String>,
    pub webpage_url_domain: Option<String>,
}

impl VideoMetadata {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Canonical spellings for every name the metadata carries
    pub fn glossary_seed(&self) -> Glossary {
        let names = [&self.channel, &self.uploader, &self.creator]
            .into_iter()
            .flatten()
            .map(|s| s.trim().to_string())
            .chain(
                self.artist
                    .iter()
                    .flat_map(|a| a.split(','))
                    .map(|s| s.trim().to_string()),
            )
            .filter(|s| !s.is_empty());

        let glossary = Glossary::new(names.map(GlossaryEntry::new));
        debug!("Metadata seeded {} glossary entries", glossary.len());
        glossary
    }
}

/// Load a `video.info.json` file
pub fn load_metadata(path: &Path) -> Result<VideoMetadata> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read metadata: {:?}", path))?;
    let metadata = VideoMetadata::from_json(&content)
        .with_context(|| format!("Failed to parse metadata JSON: {:?}", path))?;

    info!(
        "Loaded metadata for {:?} from {:?}",
        metadata.fulltitle.as_deref().unwrap_or("untitled video"),
        path
    );
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const INFO_JSON: &str = r#"{
        "id": "abc123",
        "fulltitle": "AWS re:Invent 2025 - Keynote with CEO Matt Garman",
        "channel": "Amazon Web Services",
        "uploader": "Amazon Web Services",
        "artist": "Matt Garman, Swami Sivasubramanian",
        "duration": 7342,
        "upload_date": "20251202"
    }"#;

    #[test]
    fn test_glossary_seed_merges_duplicate_names() {
        let metadata = VideoMetadata::from_json(INFO_JSON).unwrap();
        let glossary = metadata.glossary_seed();

        let canonicals: Vec<_> = glossary
            .entries()
            .iter()
            .map(|e| e.canonical.as_str())
            .collect();
        assert_eq!(
            canonicals,
            vec!["Amazon Web Services", "Matt Garman", "Swami Sivasubramanian"]
        );
    }

    #[test]
    fn test_missing_fields_seed_nothing() {
        let metadata = VideoMetadata::from_json(r#"{"id": "x"}"#).unwrap();
        assert!(metadata.glossary_seed().is_empty());
    }

    #[test]
    fn test_load_metadata() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", INFO_JSON).unwrap();

        let metadata = load_metadata(file.path()).unwrap();
        assert_eq!(metadata.upload_date.as_deref(), Some("20251202"));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(load_metadata(file.path()).is_err());
    }
}
