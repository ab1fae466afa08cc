//! Window exclusion list
//!
//! - **parser**: raw `excludedWindows` text to compiled patterns
//! - **cache**: single-entry memo keyed on the raw text
//! - **matcher**: decides whether a window identity is excluded

pub mod cache;
pub mod matcher;
pub mod parser;

pub use matcher::Exclusions;
pub use parser::{parse, ParseResult};
