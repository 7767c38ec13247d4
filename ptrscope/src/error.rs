use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// The analyses themselves never fail: malformed IR shapes are skipped
/// silently and the result is a best-effort may-set. Errors only arise on the
/// IR surface, that is the textual loader, the programmatic builder, and
/// file I/O.
///
/// # Examples
///
/// ```rust
/// use ptrscope::{ir, Error};
///
/// match ir::parse("func @broken( {") {
///     Ok(_) => unreachable!(),
///     Err(Error::Parse { line, message }) => {
///         eprintln!("parse error on line {line}: {message}");
///     }
///     Err(e) => eprintln!("other error: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The textual IR could not be parsed.
    ///
    /// Reported with the one-based source line and a description of what was
    /// expected at that point.
    #[error("parse error on line {line}: {message}")]
    Parse {
        /// One-based line number in the input text
        line: usize,
        /// Description of the syntax problem
        message: String,
    },

    /// The module under construction is damaged and cannot be completed.
    ///
    /// Produced by the builder for shapes the IR cannot represent: a store
    /// through a non-pointer, a block without a terminator, a duplicate
    /// symbol name. The error includes the source location where the
    /// malformation was detected for debugging purposes.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// File I/O error.
    ///
    /// Wraps standard I/O errors that can occur while reading input files.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}
