//! # Reservoir Core (Layer 1)
//!
//! Foundation crate for reservoir-computing based option pricing:
//!
//! - [`math::activations`]: scalar activation functions, including the
//!   exact error-function GELU required for numerical reproducibility
//! - [`reservoir`]: the frozen random-feature network that maps a
//!   normalised state vector to a basis-function vector
//!
//! Everything in this crate is immutable after construction. There is no
//! training machinery here by design: weights arrive pre-generated (the
//! random projection is fixed) and regression coefficients are fitted by
//! an external offline procedure.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod error;
pub mod math;
pub mod reservoir;

pub use error::CoreError;
pub use math::activations::Activation;
pub use reservoir::{DenseLayer, Reservoir};
