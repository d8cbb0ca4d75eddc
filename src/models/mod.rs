pub mod correction;
pub mod glossary;
pub mod paragraph;
pub mod token;

pub use correction::*;
pub use glossary::*;
pub use paragraph::*;
pub use token::*;
