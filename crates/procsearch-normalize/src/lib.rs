#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod defaults;
pub mod store;
pub mod term;
pub mod text;

pub use store::{JsonRuleStore, MemoryRuleStore};
pub use term::{Suggestion, TermNormalizer};
pub use text::TextPreprocessor;
