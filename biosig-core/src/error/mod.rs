use alloc::{boxed::Box, string::String};
use core::{error, fmt};

/// Errors raised whilst running biosig.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A parameter was malformed or out of its valid range.
    InvalidParameter {
        /// The offending parameter.
        arg: String,
        /// Explaining why the parameter is invalid.
        reason: String,
    },
    /// The input carries no usable information (empty, zero variance).
    DegenerateInput {
        /// What made the input degenerate.
        reason: String,
    },
    /// Two related buffers disagree on length.
    LengthMismatch {
        /// Name of the argument.
        arg: String,
        /// Required length.
        expected: usize,
        /// Received length.
        got: usize,
    },
    /// A conditioning pipeline step failed.
    PipelineStep {
        /// Zero-based position of the step.
        index: usize,
        /// Tag name of the step.
        step: String,
        /// The step's own error.
        source: Box<Error>,
    },
    /// A numerical transform could not be carried out.
    Transform {
        /// Why the transform failed.
        reason: String,
    },
    /// Filesystem access failed.
    Io {
        /// The path being accessed.
        path: String,
        /// Underlying failure.
        reason: String,
    },
    /// A tabular record could not be parsed.
    Parse {
        /// One-based line number in the source file.
        line: usize,
        /// What could not be parsed.
        reason: String,
    },
}

impl Error {
    /// Shorthand for [`Error::InvalidParameter`].
    pub fn invalid(arg: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            arg: arg.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for [`Error::DegenerateInput`].
    pub fn degenerate(reason: impl Into<String>) -> Self {
        Error::DegenerateInput {
            reason: reason.into(),
        }
    }

    /// Wrap this error as the failure of pipeline step `index`.
    pub fn at_step(self, index: usize, step: impl Into<String>) -> Self {
        Error::PipelineStep {
            index,
            step: step.into(),
            source: Box::new(self),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidParameter { arg, reason } => {
                write!(f, "Invalid parameter `{arg}`: {reason}")
            }
            Error::DegenerateInput { reason } => write!(f, "Degenerate input: {reason}"),
            Error::LengthMismatch { arg, expected, got } => {
                write!(f, "Length mismatch on `{arg}`. Expected {expected}, got {got}.")
            }
            Error::PipelineStep {
                index,
                step,
                source,
            } => write!(f, "Pipeline step {index} (`{step}`) failed: {source}"),
            Error::Transform { reason } => write!(f, "Transform failed: {reason}"),
            Error::Io { path, reason } => write!(f, "I/O failure on `{path}`: {reason}"),
            Error::Parse { line, reason } => write!(f, "Parse error on line {line}: {reason}"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::PipelineStep { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Result alias used across biosig.
pub type Result<T> = core::result::Result<T, Error>;
