pub mod config;
pub mod error;
pub mod heuristics;
pub mod io;
pub mod models;
pub mod pipeline;
pub mod stages;

pub use config::NormalizerConfig;
pub use error::NormalizeError;
pub use io::{
    load_glossary, load_metadata, output_path_in, read_input, write_text, NormalizationReport,
    VideoMetadata,
};
pub use models::{
    AmbiguousEntityWarning, CorrectionSpan, Glossary, GlossaryEntry, Paragraph,
    ParagraphBoundary, Token, TokenizedTranscript,
};
pub use pipeline::{normalize_bytes, normalize_transcript, NormalizationOutcome, NormalizationStats};
pub use stages::{
    execute_stage1, execute_stage2, execute_stage3, tokenize, verify_fidelity, FidelityReport,
    MatcherConfig, RenderConfig, SegmenterConfig,
};
