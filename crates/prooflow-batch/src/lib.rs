//! Batch lifecycle tracking for Prooflow.
//!
//! Tracks the asynchronous, partially-parallel completion of a split plan's
//! chunks as a single logical batch:
//!
//! - [`BatchController`]: admission, state transitions, timeouts, events
//! - [`BatchRegistry`]: the in-memory source of truth for batch state
//! - [`Reaper`]: periodic eviction of old terminal batches
//! - [`run_batch`]: drives a `Corrector` over a plan with bounded concurrency
//!
//! The registry holds no durable state; everything is lost on restart by
//! design. Durability, transport, and provider concerns belong to the
//! surrounding application.

pub mod controller;
pub mod reaper;
pub mod registry;
pub mod runner;

pub use controller::{BatchConfig, BatchController, BatchEvent};
pub use reaper::Reaper;
pub use registry::BatchRegistry;
pub use runner::run_batch;
