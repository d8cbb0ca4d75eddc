pub mod captions;
pub mod input;
pub mod metadata;
pub mod output;

pub use captions::{clean_vtt, load_captions};
pub use input::{load_glossary, read_input, read_transcript};
pub use metadata::{load_metadata, VideoMetadata};
pub use output::{output_path_in, write_text, NormalizationReport};
