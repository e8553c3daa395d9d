//! Document splitting for Prooflow.
//!
//! Partitions a document into an ordered sequence of bounded-size chunks,
//! preferring semantically meaningful boundaries (paragraph breaks, line
//! breaks, sentence and clause punctuation, spaces) and optionally
//! overlapping adjacent chunks to preserve context across a cut.

pub mod split;

pub use split::split;
