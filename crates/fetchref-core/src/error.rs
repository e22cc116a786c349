//! Error types for reference resolution.

use thiserror::Error;

use crate::format::{Format, FormatKind};

/// Broad category of a [`RefError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The input string is malformed.
    Syntax,
    /// The path could not be classified.
    Inference,
    /// The classified reference is not legal for the calling context.
    Policy,
    /// An internal invariant was broken. Never caused by user input.
    Internal,
}

/// Errors that can occur while resolving a reference string.
#[derive(Debug, Error)]
pub enum RefError {
    #[error("reference is empty")]
    EmptyInput,

    #[error("reference {value:?} has an empty path")]
    EmptyPath { value: String },

    #[error("reference {value:?} has an empty option string after '#'")]
    EmptyOptions { value: String },

    #[error("unknown option key {key:?} in reference {value:?}")]
    UnknownOptionKey { key: String, value: String },

    #[error("duplicate option key {key:?} in reference {value:?}")]
    DuplicateOptionKey { key: String, value: String },

    #[error("option {key:?} in reference {value:?} requires a value")]
    MissingOptionValue { key: String, value: String },

    #[error("invalid value {option_value:?} for option {key:?}: {reason}")]
    InvalidOptionValue {
        key: String,
        option_value: String,
        reason: String,
    },

    #[error("unknown format {format:?}")]
    UnknownFormat { format: String },

    #[error("invalid subdir {subdir:?}: {reason}")]
    InvalidSubdir { subdir: String, reason: String },

    #[error("invalid module reference {value:?}: {reason}")]
    InvalidModuleReference { value: String, reason: String },

    #[error("invalid git path {path:?}: {reason}")]
    InvalidGitPath { path: String, reason: String },

    #[error("path {path:?} had .{suffix} extension with unknown format")]
    UnknownFormatUnderCompression { path: String, suffix: String },

    #[error("path {path:?} is not a valid proto file: a directory with that name already exists")]
    ProtoFileIsDirectory { path: String },

    #[error("cannot decide between module and directory: no path given")]
    AmbiguousEmptyPath,

    #[error("format {format} ({kind}) is not allowed here, allowed formats are: {allowed}")]
    FormatNotAllowed {
        format: Format,
        kind: FormatKind,
        allowed: String,
    },

    #[error(
        "format {format} ({kind}) is not registered with this parser, known formats are: {known}"
    )]
    FormatNotRegistered {
        format: Format,
        kind: FormatKind,
        known: String,
    },

    #[error("option {key:?} is not allowed for format {format}")]
    OptionNotAllowed { key: String, format: Format },

    #[error("compression {compression} is not allowed for format {format}")]
    CompressionNotAllowed { compression: String, format: Format },

    #[error("options {first:?} and {second:?} cannot be used together")]
    ConflictingOptions {
        first: &'static str,
        second: &'static str,
    },

    #[error("format {format} cannot be read from {path:?}")]
    StreamNotAllowed { format: Format, path: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl RefError {
    /// Classify this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::EmptyInput
            | Self::EmptyPath { .. }
            | Self::EmptyOptions { .. }
            | Self::UnknownOptionKey { .. }
            | Self::DuplicateOptionKey { .. }
            | Self::MissingOptionValue { .. }
            | Self::InvalidOptionValue { .. }
            | Self::UnknownFormat { .. }
            | Self::InvalidSubdir { .. }
            | Self::InvalidModuleReference { .. }
            | Self::InvalidGitPath { .. } => ErrorClass::Syntax,
            Self::UnknownFormatUnderCompression { .. }
            | Self::ProtoFileIsDirectory { .. }
            | Self::AmbiguousEmptyPath => ErrorClass::Inference,
            Self::FormatNotAllowed { .. }
            | Self::FormatNotRegistered { .. }
            | Self::OptionNotAllowed { .. }
            | Self::CompressionNotAllowed { .. }
            | Self::ConflictingOptions { .. }
            | Self::StreamNotAllowed { .. } => ErrorClass::Policy,
            Self::Internal(_) => ErrorClass::Internal,
        }
    }

    pub(crate) fn invalid_value(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidOptionValue {
            key: key.into(),
            option_value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience type alias for resolution results.
pub type Result<T> = std::result::Result<T, RefError>;
