use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::config::NormalizerConfig;
use crate::models::{AmbiguousEntityWarning, CorrectionSpan, ParagraphBoundary};
use crate::pipeline::{NormalizationOutcome, NormalizationStats};
use crate::stages::FidelityReport;

/// Machine-readable record of one normalization run
#[derive(Debug, Clone, Serialize)]
pub struct NormalizationReport {
    pub metadata: RunMetadata,
    pub stats: NormalizationStats,
    pub fidelity: FidelityReport,
    /// Accepted corrections in document order
    pub corrections: Vec<CorrectionSpan>,
    pub boundaries: Vec<ParagraphBoundary>,
    pub warnings: Vec<ReportWarning>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunMetadata {
    pub run_id: Uuid,
    pub processed_at: DateTime<Utc>,
    pub input: PathBuf,
    pub glossary_entries: usize,
    pub config: NormalizerConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportWarning {
    pub message: String,
    #[serde(flatten)]
    pub warning: AmbiguousEntityWarning,
}

impl NormalizationReport {
    pub fn from_outcome(
        outcome: &NormalizationOutcome,
        input: &Path,
        glossary_entries: usize,
        config: &NormalizerConfig,
    ) -> Self {
        Self {
            metadata: RunMetadata {
                run_id: Uuid::new_v4(),
                processed_at: Utc::now(),
                input: input.to_path_buf(),
                glossary_entries,
                config: config.clone(),
            },
            stats: outcome.stats.clone(),
            fidelity: outcome.fidelity,
            corrections: outcome.corrections.clone(),
            boundaries: outcome.boundaries.clone(),
            warnings: outcome
                .warnings
                .iter()
                .map(|w| ReportWarning {
                    message: w.to_string(),
                    warning: w.clone(),
                })
                .collect(),
        }
    }

    /// Write to a JSON file
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create file: {:?}", path))?;
        serde_json::to_writer_pretty(file, self).context("Failed to write JSON")?;
        Ok(())
    }
}

/// Write the normalized transcript, ending it with a newline
pub fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create file: {:?}", path))?;
    write!(file, "{}", text)?;
    if !text.ends_with('\n') {
        writeln!(file)?;
    }
    Ok(())
}

/// Output path for `input` inside `dir`: same file stem, `.txt` extension
pub fn output_path_in(dir: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "transcript".into(), |s| s.to_os_string());
    let mut name = stem;
    name.push(".txt");
    dir.join(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Glossary, GlossaryEntry};
    use crate::pipeline::normalize_transcript;

    #[test]
    fn test_write_text_adds_final_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.txt");

        write_text(&path, "One.\n\nTwo.").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "One.\n\nTwo.\n");
    }

    #[test]
    fn test_output_path_in() {
        let path = output_path_in(Path::new("/tmp/out"), Path::new("talks/keynote.vtt"));
        assert_eq!(path, PathBuf::from("/tmp/out/keynote.txt"));
    }

    #[test]
    fn test_report_json() {
        let glossary = Glossary::new(vec![
            GlossaryEntry::with_variants("Siobhan Walsh", ["Shavon Walsh"]),
            GlossaryEntry::new("Mark Hale"),
            GlossaryEntry::new("Mark Hall"),
        ]);
        let config = NormalizerConfig::default();
        let outcome =
            normalize_transcript("Shavon Walsh met Mark Hal.", &glossary, &config).unwrap();
        let report =
            NormalizationReport::from_outcome(&outcome, Path::new("talk.txt"), glossary.len(), &config);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        report.write_json(&path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["metadata"]["glossary_entries"], 3);
        assert_eq!(json["corrections"][0]["replacement_text"], "Siobhan Walsh");
        assert_eq!(json["corrections"][0]["match_kind"], "variant");
        assert_eq!(json["warnings"][0]["original_text"], "Mark Hal");
        assert!(json["warnings"][0]["message"]
            .as_str()
            .unwrap()
            .starts_with("ambiguous entity"));
        assert!(json["metadata"]["run_id"].is_string());
    }
}
