use crate::models::{TokenKind, TokenizedTranscript};

/// Characters that can end a sentence
pub const TERMINAL_PUNCTUATION: &[char] = &['.', '?', '!', '…'];

/// Tunable sentence-end heuristics
#[derive(Debug, Clone)]
pub struct SentenceRules {
    /// Lowercase abbreviations (without the trailing period) that never end a sentence
    pub abbreviations: Vec<String>,
    /// Words up to this many characters followed by "." and a lowercase word are abbreviations
    pub abbreviation_max_len: usize,
    /// Treat terminal punctuation followed by a lowercase word as mid-sentence
    pub lowercase_continues_sentence: bool,
}

impl Default for SentenceRules {
    fn default() -> Self {
        Self {
            abbreviations: default_abbreviations(),
            abbreviation_max_len: 3,
            lowercase_continues_sentence: true,
        }
    }
}

pub fn default_abbreviations() -> Vec<String> {
    [
        "mr", "mrs", "ms", "dr", "prof", "st", "jr", "sr", "vs", "etc", "e.g", "i.e", "inc",
        "ltd", "co", "corp", "mt", "ft", "gen", "gov", "sen", "rep", "rev", "capt", "lt", "col",
        "sgt", "approx", "dept", "est", "fig", "vol", "u.s", "u.k",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// A punctuation run made only of sentence-ending characters ("." "?!" "...")
pub fn is_terminal_punctuation(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| TERMINAL_PUNCTUATION.contains(&c))
}

/// Decide whether the token at `index` ends a sentence
pub fn is_sentence_end(transcript: &TokenizedTranscript, index: usize, rules: &SentenceRules) -> bool {
    let token = match transcript.get(index) {
        Some(t) if t.kind == TokenKind::Punctuation => t,
        _ => return false,
    };
    if !is_terminal_punctuation(&token.text) {
        return false;
    }

    let next_starts_lowercase = transcript
        .next_non_whitespace(index)
        .and_then(|i| transcript.get(i))
        .filter(|t| t.is_word())
        .and_then(|t| t.text.chars().next())
        .is_some_and(char::is_lowercase);

    if token.text == "." {
        if let Some(word) = abbreviation_before(transcript, index) {
            let lower = word.to_lowercase();
            if rules.abbreviations.iter().any(|a| *a == lower) {
                return false;
            }

            // Single capital letter: an initial ("J. Smith")
            let mut chars = word.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                if c.is_uppercase() {
                    return false;
                }
            }

            if word.chars().count() <= rules.abbreviation_max_len && next_starts_lowercase {
                return false;
            }
        }
    }

    !(rules.lowercase_continues_sentence && next_starts_lowercase)
}

/// The dotted word directly attached to the period at `index` ("Dr", "e.g"), if any
fn abbreviation_before(transcript: &TokenizedTranscript, index: usize) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    let mut i = index;
    let mut expect_word = true;

    while i > 0 {
        i -= 1;
        let token = &transcript.tokens[i];
        if expect_word && token.is_word() {
            parts.push(&token.text);
        } else if !expect_word && token.kind == TokenKind::Punctuation && token.text == "." {
            parts.push(".");
        } else {
            break;
        }
        expect_word = !expect_word;
    }

    // A trailing "." means the walk stopped on a period with no word before it
    if parts.last() == Some(&".") {
        parts.pop();
    }
    if parts.is_empty() {
        return None;
    }
    parts.reverse();
    Some(parts.concat())
}

/// Count sentence ends across the whole transcript
pub fn count_sentences(transcript: &TokenizedTranscript, rules: &SentenceRules) -> usize {
    (0..transcript.len())
        .filter(|&i| is_sentence_end(transcript, i, rules))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::tokenize;

    fn ends(text: &str, rules: &SentenceRules) -> Vec<String> {
        let transcript = tokenize(text, &[]);
        (0..transcript.len())
            .filter(|&i| is_sentence_end(&transcript, i, rules))
            .map(|i| {
                let prev = transcript.prev_non_whitespace(i).unwrap_or(0);
                transcript.tokens[prev].text.clone()
            })
            .collect()
    }

    #[test]
    fn test_plain_sentence_ends() {
        let rules = SentenceRules::default();
        assert_eq!(
            ends("It rained. Did it? Yes! Wait...", &rules),
            vec!["rained", "it", "Yes", "Wait"]
        );
    }

    #[test]
    fn test_title_abbreviation_is_not_an_end() {
        let rules = SentenceRules::default();
        assert!(ends("Dr. Smith arrived", &rules).is_empty());
        assert_eq!(ends("We met Mrs. Jones. She waved.", &rules), vec!["Jones", "waved"]);
    }

    #[test]
    fn test_dotted_abbreviation_and_initials() {
        let rules = SentenceRules::default();
        assert!(ends("Bring fruit, e.g. Apples", &rules).is_empty());
        assert!(ends("J. Smith spoke", &rules).is_empty());
    }

    #[test]
    fn test_lowercase_continuation() {
        let rules = SentenceRules::default();
        assert!(ends("approx. ten people", &rules).is_empty());
        assert!(ends("it was good. and then", &rules).is_empty());

        let strict = SentenceRules {
            lowercase_continues_sentence: false,
            ..Default::default()
        };
        assert_eq!(ends("it was good. and then", &strict), vec!["good"]);
        // Short word before the period still counts as an abbreviation
        assert!(ends("the cat. and then", &strict).is_empty());
    }

    #[test]
    fn test_count_sentences() {
        let transcript = tokenize("One. Two. Three", &[]);
        assert_eq!(count_sentences(&transcript, &SentenceRules::default()), 2);
    }
}
