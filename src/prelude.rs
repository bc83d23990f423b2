//! # classmatch Prelude
//!
//! A curated selection of the most frequently used types, for convenient glob
//! imports:
//!
//! ```rust
//! use classmatch::prelude::*;
//!
//! let mut builder = ImageBuilder::new("v1");
//! builder.class("app/Main", AccessFlags::PUBLIC);
//! let image = builder.build()?;
//! # Ok::<(), classmatch::Error>(())
//! ```

// Core types and error handling

/// The main error type for all classmatch operations
pub use crate::Error;

/// The result type used throughout classmatch
pub use crate::Result;

// Image model

/// Image construction and the assembled image itself
pub use crate::image::{Image, ImageBuilder};

/// Entity identifiers and kinds
pub use crate::image::{ClassId, EntityKind, FieldId, MethodId};

/// Entity records
pub use crate::image::{ClassDef, FieldDef, MethodDef};

/// Access flags and instruction categories
pub use crate::image::{AccessFlags, OpKind};

// Matching engine

/// The driver and its run products
pub use crate::matching::{CancelToken, MatchEngine, MatchOutcome, MatchResult, MatchStats};

/// Configuration and levels
pub use crate::matching::{MatcherConfig, MatchLevel};

/// The match store and per-match provenance
pub use crate::matching::{MatchInfo, MatchStore};
