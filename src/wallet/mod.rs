mod parse;
mod source;
mod types;

pub use source::{JsonDirSource, TransactionSource};
pub use types::{DetailLevel, Direction, TransactionRecord};
