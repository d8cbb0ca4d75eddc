use thiserror::Error;

/// Hard failures of a normalization run
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// Input bytes are not valid UTF-8 text
    #[error("malformed input at byte {offset}: {message}")]
    MalformedInput { offset: usize, message: String },

    /// Rendered output is not a verbatim re-rendering of the input
    #[error(
        "fidelity violation at word {index}: expected {}, found {}",
        display_word(.expected),
        display_word(.found)
    )]
    FidelityViolation {
        /// Position in the whitespace-free comparison sequence
        index: usize,
        expected: Option<String>,
        found: Option<String>,
    },

    /// Configuration rejected before any stage ran
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl NormalizeError {
    pub(crate) fn malformed(offset: usize, message: impl Into<String>) -> Self {
        Self::MalformedInput {
            offset,
            message: message.into(),
        }
    }

    pub(crate) fn fidelity(index: usize, expected: Option<&str>, found: Option<&str>) -> Self {
        Self::FidelityViolation {
            index,
            expected: expected.map(str::to_string),
            found: found.map(str::to_string),
        }
    }

    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

fn display_word(word: &Option<String>) -> String {
    match word {
        Some(w) => format!("{:?}", w),
        None => "end of text".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fidelity_message_names_missing_word() {
        let err = NormalizeError::fidelity(3, Some("about"), None);
        assert_eq!(
            err.to_string(),
            "fidelity violation at word 3: expected \"about\", found end of text"
        );
    }
}
