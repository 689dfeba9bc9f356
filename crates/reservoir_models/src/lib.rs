//! # Reservoir Models (Layer 2)
//!
//! Path simulation under a rough-volatility stock-price model:
//!
//! - [`rough_heston`]: the fractional ("rough") Heston simulator with
//!   Hurst exponent H in (0, 0.5)
//! - [`paths`]: owned path ensembles and borrowed truncated views
//! - [`rng`]: locally seeded random source for reproducible simulation
//!
//! Path generation is deterministic given `(seed, params)`: the same call
//! produces bit-identical `f32` arrays regardless of thread count or call
//! ordering, because all normal variates are drawn up front from a local
//! generator and each path-asset unit consumes a disjoint slice.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod error;
pub mod paths;
pub mod rng;
pub mod rough_heston;

pub use error::ModelError;
pub use paths::{PathBatch, PathView};
pub use rng::SimRng;
pub use rough_heston::{RoughHeston, RoughHestonParams};
