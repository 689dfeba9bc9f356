//! Policy artifact schema and the backward-induction engine.
//!
//! The artifact is the frozen output of an offline fit: a random-feature
//! reservoir plus one regression coefficient vector per exercise date.
//! The engine replays that policy on fresh path ensembles; it never fits
//! anything itself.

mod artifact;
mod engine;
mod error;

pub use artifact::PolicyArtifact;
pub use engine::{PolicyEngine, PolicyResult};
pub use error::PolicyError;
