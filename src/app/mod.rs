//! Binary-side application wiring.

pub(crate) mod config;
pub(crate) mod runtime;
