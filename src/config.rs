use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::NormalizeError;
use crate::heuristics::sentences::{default_abbreviations, SentenceRules};
use crate::stages::{MatcherConfig, RenderConfig, SegmenterConfig};

/// All tunables of a normalization run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Spans closer than this normalized edit distance to a canonical form are corrected
    pub fuzzy_match_threshold: f64,
    pub phonetic_prefilter: bool,
    pub max_sentences_per_paragraph: usize,
    pub max_chars_per_paragraph: usize,
    /// Regexes for speaker labels, matched at line starts with `^`
    pub speaker_marker_patterns: Vec<String>,
    pub abbreviations: Vec<String>,
    pub abbreviation_max_len: usize,
    pub lowercase_continues_sentence: bool,
    pub paragraph_break: String,
    pub reflow_line_breaks: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            fuzzy_match_threshold: 0.2,
            phonetic_prefilter: true,
            max_sentences_per_paragraph: 5,
            max_chars_per_paragraph: 600,
            speaker_marker_patterns: Vec::new(),
            abbreviations: default_abbreviations(),
            abbreviation_max_len: 3,
            lowercase_continues_sentence: true,
            paragraph_break: "\n\n".to_string(),
            reflow_line_breaks: false,
        }
    }
}

impl NormalizerConfig {
    /// Load a TOML config file; missing keys take their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, NormalizeError> {
        let config: Self =
            toml::from_str(content).map_err(|e| NormalizeError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no stage can work with
    pub fn validate(&self) -> Result<(), NormalizeError> {
        if !(0.0..=1.0).contains(&self.fuzzy_match_threshold) {
            return Err(NormalizeError::invalid_config(format!(
                "fuzzy_match_threshold must be in [0, 1], got {}",
                self.fuzzy_match_threshold
            )));
        }
        if self.max_sentences_per_paragraph == 0 {
            return Err(NormalizeError::invalid_config(
                "max_sentences_per_paragraph must be at least 1",
            ));
        }
        if self.max_chars_per_paragraph == 0 {
            return Err(NormalizeError::invalid_config(
                "max_chars_per_paragraph must be at least 1",
            ));
        }
        // Anything but whitespace would add words the verifier rejects
        if self.paragraph_break.is_empty() || !self.paragraph_break.trim().is_empty() {
            return Err(NormalizeError::invalid_config(
                "paragraph_break must be non-empty whitespace",
            ));
        }
        Ok(())
    }

    pub fn matcher_config(&self) -> MatcherConfig {
        MatcherConfig {
            fuzzy_match_threshold: self.fuzzy_match_threshold,
            phonetic_prefilter: self.phonetic_prefilter,
        }
    }

    pub fn segmenter_config(&self) -> SegmenterConfig {
        SegmenterConfig {
            max_sentences_per_paragraph: self.max_sentences_per_paragraph,
            max_chars_per_paragraph: self.max_chars_per_paragraph,
            sentence_rules: SentenceRules {
                abbreviations: self.abbreviations.iter().map(|a| a.to_lowercase()).collect(),
                abbreviation_max_len: self.abbreviation_max_len,
                lowercase_continues_sentence: self.lowercase_continues_sentence,
            },
        }
    }

    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            paragraph_break: self.paragraph_break.clone(),
            reflow_line_breaks: self.reflow_line_breaks,
        }
    }
}
