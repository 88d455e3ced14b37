//! Command implementations.

pub mod compile;
