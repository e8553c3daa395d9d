//! # prooflow-core
//!
//! Core types and traits for the Prooflow correction-batch engine.
//!
//! Prooflow splits long documents into bounded-size chunks for an external
//! correction engine and tracks the asynchronous completion of all chunks as
//! a single batch. This crate provides the shared vocabulary:
//!
//! - **Splitting**: [`SplitConfig`], [`Chunk`], [`SplitPlan`]
//! - **Batch tracking**: [`BatchStatus`], [`BatchProgress`], [`ChunkOutcome`]
//! - **Collaborator seam**: the [`Corrector`] trait
//!
//! ## Architecture
//!
//! ```text
//! text → split → SplitPlan → admit → BatchProgress
//!                                        ↑
//!                    ChunkOutcome per chunk (from a Corrector)
//! ```
//!
//! The splitting algorithm lives in `prooflow-splitter`; the batch lifecycle
//! controller, registry, and reaper live in `prooflow-batch`.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{BatchError, CorrectError, Error, Result, SplitError};
pub use traits::Corrector;
pub use types::*;
