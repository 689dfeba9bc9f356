//! # Reservoir Pricing (Layer 3)
//!
//! Exotic payoff evaluation and the backward-induction policy engine:
//!
//! - [`payoffs`]: the closed registry of barrier, lookback and basket
//!   payoffs, all evaluated against truncated path views
//! - [`policy`]: the serialized policy artifact (frozen reservoir plus
//!   per-date regression coefficients) and the engine that replays it on
//!   fresh path ensembles
//!
//! The engine is inference-only: coefficients are fitted offline and
//! arrive through [`policy::PolicyArtifact`]. A run never mutates the
//! artifact, so one engine can price many batches.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod payoffs;
pub mod policy;


pub use payoffs::{Payoff, PayoffError, PayoffKind};
pub use policy::{PolicyArtifact, PolicyEngine, PolicyError, PolicyResult};
