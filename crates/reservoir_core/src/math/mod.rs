//! Numerical building blocks for the core layer.

pub mod activations;
