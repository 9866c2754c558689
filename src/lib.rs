pub mod document;
pub mod error;
pub mod expr;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod query;
pub mod resolver;
pub mod value;

pub use document::{Block, BlockId, Document, Field, FieldType};
pub use error::{BclError, Position, Result};
pub use value::{PathSeg, Ref, RefScope, Value};

pub use parser::parse;
pub use printer::{dump, to_source};
pub use query::{find_value, get_bool, get_float, get_int, get_string};
pub use resolver::resolve;

// ── Core API ───────────────────────────────────────────────────────

/// Parse BCL source and resolve every reference and expression field,
/// returning the finished document.
pub fn load(input: &str) -> Result<Document> {
    let mut doc = parser::parse(input)?;
    resolver::resolve(&mut doc)?;
    Ok(doc)
}

#[cfg(test)]
mod tests;
