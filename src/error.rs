use thiserror::Error;

use crate::matching::MatchLevel;

macro_rules! inconsistent_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::ImageInconsistent {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::ImageInconsistent {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Matching itself is deterministic and total: a pair that cannot be paired up is simply left
/// unmatched and is never an error. The variants below therefore cover only the genuinely
/// fatal conditions (broken input images and programmer errors in feature functions) plus
/// the failures the image builder can surface while resolving declarative input.
///
/// # Error Categories
///
/// ## Image Construction Errors
/// - [`Error::ImageInconsistent`] - The assembled image violates a structural invariant
/// - [`Error::InvalidDescriptor`] - A type or method descriptor could not be parsed
/// - [`Error::UnknownEntity`] - A lookup by name missed during image construction
///
/// ## Matching Errors
/// - [`Error::FeatureOutOfRange`] - A feature function produced a score outside `[0, 1]`
///
/// Cooperative cancellation is deliberately NOT an error: a cancelled run surfaces as
/// [`MatchOutcome::Cancelled`](crate::matching::MatchOutcome) in the
/// [`MatchResult`](crate::matching::MatchResult) so partial matches stay accessible.
#[derive(Error, Debug)]
pub enum Error {
    /// The image violates a structural invariant.
    ///
    /// Raised when edge sets are not bidirectionally consistent, when the class
    /// hierarchy or interface graph contains a cycle, or when member keys collide
    /// within a class. The error includes the source location where the
    /// inconsistency was detected for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of the violated invariant
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Inconsistent image - {file}:{line}: {message}")]
    ImageInconsistent {
        /// The message to be printed for the inconsistency
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A feature function returned a score outside `[0, 1]`.
    ///
    /// Feature scores are aggregated as a weighted mean and must stay within the
    /// unit interval; anything else is a programmer error in the feature itself,
    /// so the run is aborted immediately. The fields carry enough context to
    /// reproduce the offending invocation.
    #[error("Feature '{feature}' returned {value} for '{a}' / '{b}' at level {level}")]
    FeatureOutOfRange {
        /// Symbolic name of the offending feature
        feature: &'static str,
        /// The level at which the feature was invoked
        level: MatchLevel,
        /// Display name of the source-image entity
        a: String,
        /// Display name of the candidate entity
        b: String,
        /// The out-of-range value that was returned
        value: f64,
    },

    /// A type or method descriptor could not be parsed.
    ///
    /// Descriptors use the internal form: single letters for primitives
    /// (`V Z B C S I J F D`), `Lpkg/Name;` for object types and a `[` prefix
    /// per array dimension.
    #[error("Invalid descriptor '{0}'")]
    InvalidDescriptor(String),

    /// A lookup by name missed during image construction.
    #[error("Unknown entity '{0}'")]
    UnknownEntity(String),
}
