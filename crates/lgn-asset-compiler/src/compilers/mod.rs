//! Asset compilers shipped with the crate.

pub mod physics;
