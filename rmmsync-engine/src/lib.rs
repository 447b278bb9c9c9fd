//! # rmmsync-engine
//!
//! The reconciliation engine: drives the fixed pipeline
//! pull → writeback → fetch/materialize → prune → push over the three
//! stores (remote API, filesystem mirror, Git checkout).
//!
//! The step order carries the one invariant everything else hangs on:
//! local edits must be detected and pushed to the API *before* the API is
//! re-fetched and re-materialized, or the authoritative copy silently
//! overwrites the edit in the same run.
//!
//! Writeback (step 2) and the Git push (step 5) are not transactional with
//! each other. A crash between them leaves the API ahead of Git or vice
//! versa; re-running converges because every mutation is hash-gated.

pub mod error;
pub mod pipeline;
pub mod preflight;
pub mod store;
pub mod writeback;

pub use error::EngineError;
pub use pipeline::{run, RunReport};
pub use preflight::{preflight, PreflightError};
pub use store::{Mirror, PruneReport, SaveOutcome};
pub use writeback::WritebackTally;
