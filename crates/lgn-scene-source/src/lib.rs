//! Scene-description source documents.
//!
//! A [`Stage`] is a read-only scene graph: prims addressed by absolute paths
//! (`/Root`, `/Root/Collider`) carrying named, typed properties. Asset
//! compilers only ever look up a root prim and read a handful of properties
//! from it.
//!
//! Stages are produced by a [`StageLoader`]. [`UsdaLoader`] reads the `.usda`
//! text format:
//!
//! ```text
//! #usda 1.0
//! (
//!     defaultPrim = "Root"
//! )
//!
//! def Xform "Root"
//! {
//!     string uid = "01234567-89ab-cdef-0123-456789abcdef"
//!     float physics:density = 2.5
//! }
//! ```

// crate-specific lint exceptions:
//#![allow()]

mod errors;
pub use errors::{Error, Result};

mod stage;
pub use stage::{Prim, Property, Specifier, Stage, Value};

mod usda;

mod loader;
pub use loader::{StageLoader, UsdaLoader};
