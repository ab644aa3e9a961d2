//! # Shrink - size reduction for oversized documents
//!
//! Two reductions, applied at different points of the write path:
//!
//! | Module       | Purpose                                                    |
//! |--------------|------------------------------------------------------------|
//! | [`compress`] | Lossless: re-serialize JSON without formatting whitespace  |
//! | [`summary`]  | Lossy: reduce a document to a small fixed-shape summary    |
//!
//! Compression runs before splitting when a field is large. Summarizing only
//! runs after the store has rejected the full representation.

mod compress;
mod summary;

pub use compress::compress;
pub use summary::{summarize, Breakdown, DegradedSummary, ScoreTriple, TenantIdentity, SUMMARY_ERROR};

#[cfg(test)]
mod tests;
