use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::heuristics::similarity::{normalize_phrase, phrase_word_count};

/// A canonical proper-noun spelling and the mis-transcriptions known to map to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryEntry {
    /// The single correct spelling
    pub canonical: String,
    /// Known variant forms (matched case-insensitively)
    #[serde(default)]
    pub variants: Vec<String>,
}

impl GlossaryEntry {
    pub fn new(canonical: impl Into<String>) -> Self {
        Self {
            canonical: canonical.into(),
            variants: vec![],
        }
    }

    pub fn with_variants<I, S>(canonical: impl Into<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            canonical: canonical.into(),
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }

    /// Number of whitespace-separated words in the canonical form
    pub fn word_count(&self) -> usize {
        phrase_word_count(&self.canonical)
    }
}

/// Accepted on-disk glossary layouts
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GlossaryFile {
    List(Vec<GlossaryEntry>),
    Wrapped { entries: Vec<GlossaryEntry> },
    Map(BTreeMap<String, Vec<String>>),
}

/// Immutable set of glossary entries for one run
#[derive(Debug, Clone, Default, Serialize)]
pub struct Glossary {
    entries: Vec<GlossaryEntry>,
}

impl Glossary {
    /// Build a glossary, trimming whitespace, dropping empty canonicals and
    /// merging entries that share a canonical spelling
    pub fn new(entries: impl IntoIterator<Item = GlossaryEntry>) -> Self {
        let mut glossary = Self::default();
        for entry in entries {
            glossary.insert(entry);
        }
        glossary
    }

    /// Parse a glossary from JSON: a list of entries, `{"entries": [...]}`,
    /// or a map of canonical spelling to variants
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let file: GlossaryFile = serde_json::from_str(json)?;
        let entries = match file {
            GlossaryFile::List(entries) | GlossaryFile::Wrapped { entries } => entries,
            GlossaryFile::Map(map) => map
                .into_iter()
                .map(|(canonical, variants)| GlossaryEntry::with_variants(canonical, variants))
                .collect(),
        };
        Ok(Self::new(entries))
    }

    pub fn entries(&self) -> &[GlossaryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fold another glossary's entries into this one
    pub fn merge(&mut self, other: Glossary) {
        for entry in other.entries {
            self.insert(entry);
        }
    }

    /// Longest entry (canonical or variant) in words
    pub fn max_words(&self) -> usize {
        self.entries
            .iter()
            .flat_map(|e| std::iter::once(&e.canonical).chain(e.variants.iter()))
            .map(|s| phrase_word_count(s))
            .max()
            .unwrap_or(0)
    }

    fn insert(&mut self, entry: GlossaryEntry) {
        let canonical = entry.canonical.split_whitespace().collect::<Vec<_>>().join(" ");
        if canonical.is_empty() {
            return;
        }

        let position = match self.entries.iter().position(|e| e.canonical == canonical) {
            Some(i) => i,
            None => {
                self.entries.push(GlossaryEntry::new(canonical));
                self.entries.len() - 1
            }
        };

        let existing = &mut self.entries[position];
        for variant in entry.variants {
            let normalized = normalize_phrase(&variant);
            if normalized.is_empty() {
                continue;
            }
            let known = existing
                .variants
                .iter()
                .any(|v| normalize_phrase(v) == normalized);
            if !known {
                existing.variants.push(variant.trim().to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entry_list() {
        let json = r#"[
            {"canonical": "Siobhan Walsh", "variants": ["Shavon Walsh", "Shevon Walsh"]},
            {"canonical": "Matt Garman"}
        ]"#;

        let glossary = Glossary::from_json(json).unwrap();

        assert_eq!(glossary.len(), 2);
        assert_eq!(glossary.entries()[0].variants.len(), 2);
        assert!(glossary.entries()[1].variants.is_empty());
        assert_eq!(glossary.max_words(), 2);
    }

    #[test]
    fn test_parse_map_and_wrapped() {
        let map = Glossary::from_json(r#"{"Re:Invent": ["reinvent"], "AWS": []}"#).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.entries()[0].canonical, "AWS");

        let wrapped =
            Glossary::from_json(r#"{"entries": [{"canonical": "Bedrock", "variants": []}]}"#)
                .unwrap();
        assert_eq!(wrapped.len(), 1);
    }

    #[test]
    fn test_merge_dedupes_canonicals_and_variants() {
        let mut glossary = Glossary::new(vec![GlossaryEntry::with_variants(
            "Siobhan Walsh",
            ["Shavon Walsh"],
        )]);
        glossary.merge(Glossary::new(vec![
            GlossaryEntry::with_variants("Siobhan  Walsh", ["shavon walsh", "Shevon Walsh"]),
            GlossaryEntry::new("   "),
        ]));

        assert_eq!(glossary.len(), 1);
        assert_eq!(
            glossary.entries()[0].variants,
            vec!["Shavon Walsh".to_string(), "Shevon Walsh".to_string()]
        );
    }
}
