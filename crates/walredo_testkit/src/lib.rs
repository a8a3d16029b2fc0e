//! # walredo Testkit
//!
//! Test utilities for walredo.
//!
//! This crate provides:
//! - Log and table fixtures
//! - Property-based log generators using proptest
//! - A reference model of the redo pass to check the engine against
//!
//! ## Usage
//!
//! ```rust
//! use walredo_testkit::prelude::*;
//!
//! let log = LogBuilder::new().start("T1").write("T1", 1, "A", 5).commit("T1").build();
//! let mut table = seeded_table();
//! let report = recover(&log, &mut table).unwrap();
//! assert_eq!(report.succeeded().count(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod model;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::model::*;
}

pub use fixtures::*;
pub use generators::*;
pub use model::*;
