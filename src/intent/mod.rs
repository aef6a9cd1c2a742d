//! Intent classification
//!
//! Matches recognized Arabic text against an ordered keyword table and
//! extracts command parameters. Pure functions, no I/O.

mod classifier;

pub use classifier::{CommandKind, ParsedCommand, classify};
