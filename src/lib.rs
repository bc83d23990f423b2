#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]

//! # classmatch
//!
//! A similarity-based matching engine that pairs classes, methods and fields
//! between two program images, a previously understood named release and a
//! freshly obfuscated one, so confirmed names can be carried forward to the
//! newer version.
//!
//! # Architecture
//!
//! The crate is organized around two halves that mirror the data flow:
//!
//! - **Image model** ([`crate::image`]): an arena-backed, fully resolved
//!   snapshot of one program version with bidirectional reference edges.
//!   Assembler front-ends populate it through [`crate::image::ImageBuilder`];
//!   it is immutable afterwards.
//! - **Matching engine** ([`crate::matching`]): compare primitives, weighted
//!   feature families per entity kind, a ranking framework, the iterated
//!   driver, and the match store the run accumulates.
//!
//! Matching is purely rule- and score-driven: each candidate pair is scored by
//! a weighted mean of feature functions, and a pair commits only when it clears
//! the current level's absolute threshold and leads the runner-up by the
//! level's relative margin. Levels escalate from strict to permissive, and a
//! committed class pair propagates through the hierarchy to its parents.
//! Ambiguous entities stay unmatched by design.
//!
//! # Key Components
//!
//! - [`crate::image::ImageBuilder`] - Declarative image construction with
//!   placeholder materialization and invariant validation
//! - [`crate::matching::MatchEngine`] - The iterated matching driver
//! - [`crate::matching::MatcherConfig`] - Thresholds, levels, propagation,
//!   parallelism
//! - [`crate::matching::MatchStore`] - The bidirectional partial bijection
//!   with per-match provenance
//! - [`crate::prelude`] - Convenient re-exports of commonly used types
//! - [`crate::Error`] and [`crate::Result`] - Error handling
//!
//! # Usage Example
//!
//! ```rust
//! use classmatch::prelude::*;
//!
//! // The previously named release...
//! let mut named = ImageBuilder::new("1.4.2");
//! named
//!     .class("app/Session", AccessFlags::PUBLIC)
//!     .method_with("open", "()V", |m| {
//!         m.insns(&[OpKind::Load, OpKind::FieldPut, OpKind::Return])
//!             .writes("app/Session", "active", "Z");
//!     })
//!     .field("active", "Z", AccessFlags::PRIVATE);
//! let named = named.build()?;
//!
//! // ...and the freshly obfuscated one.
//! let mut unnamed = ImageBuilder::new("1.4.3");
//! unnamed
//!     .class("ab", AccessFlags::PUBLIC)
//!     .method_with("a", "()V", |m| {
//!         m.insns(&[OpKind::Load, OpKind::FieldPut, OpKind::Return])
//!             .writes("ab", "b", "Z");
//!     })
//!     .field("b", "Z", AccessFlags::PRIVATE);
//! let unnamed = unnamed.build()?;
//!
//! let engine = MatchEngine::new(MatcherConfig::default());
//! let result = engine.run(&named, &unnamed)?;
//!
//! let session = named.class_by_name("app/Session").unwrap();
//! assert_eq!(result.store.class_match(session), unnamed.class_by_name("ab"));
//! # Ok::<(), classmatch::Error>(())
//! ```
//!
//! # Determinism
//!
//! Given identical images and configuration, two runs produce identical match
//! stores, tie-breaks included: candidate rankings break score ties by entity
//! name, proposals are resolved in source order, and parallel ranking preserves
//! the sequential result order. This holds at any `parallelism` setting.
//!
//! # Thread Safety
//!
//! Images are immutable after construction and safe to share across threads.
//! The engine mutates only its run's [`crate::matching::MatchStore`], and only
//! in the serial commit phase.

#[macro_use]
mod error;

pub mod image;
pub mod matching;

/// Convenient re-exports of the most commonly used types.
pub mod prelude;

pub use error::Error;

/// Result alias used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;
