pub mod sentences;
pub mod similarity;

pub use sentences::{count_sentences, is_sentence_end, SentenceRules};
