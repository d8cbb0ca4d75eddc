pub mod stage0_tokenize;
pub mod stage1_entity_match;
pub mod stage2_segment;
pub mod stage3_render;
pub mod stage4_verify;

pub use stage0_tokenize::*;
pub use stage1_entity_match::*;
pub use stage2_segment::*;
pub use stage3_render::*;
pub use stage4_verify::*;
