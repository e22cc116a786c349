//! Legacy format identifiers that bundle gzip compression into their name.

use std::fmt;

use crate::format::Format;

/// Legacy format and the format that replaces it when paired with
/// `compression=gzip`. Read-only for the life of the process.
const DEPRECATED_GZIP_FORMATS: &[(Format, Format)] = &[
    (Format::Bingz, Format::Bin),
    (Format::Jsongz, Format::Json),
    (Format::Targz, Format::Tar),
];

/// A non-fatal warning produced by a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advisory {
    pub format: Format,
    pub replacement: Format,
}

impl Advisory {
    /// The modern spelling of the deprecated format.
    pub fn replacement_spelling(&self) -> String {
        format!("format={},compression=gzip", self.replacement)
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Format {:?} is deprecated. Use \"{}\" instead. This will continue to work forever, but updating is recommended.",
            self.format.as_str(),
            self.replacement_spelling()
        )
    }
}

/// Return the advisory for `format`, if it is deprecated.
pub fn check_deprecated(format: Format) -> Option<Advisory> {
    DEPRECATED_GZIP_FORMATS
        .iter()
        .find(|(deprecated, _)| *deprecated == format)
        .map(|(deprecated, replacement)| Advisory {
            format: *deprecated,
            replacement: *replacement,
        })
}

/// Receives advisories emitted by a parser.
pub trait AdvisorySink: fmt::Debug + Send + Sync {
    fn advise(&self, advisory: &Advisory);
}

/// Emits advisories as `tracing` warnings.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl AdvisorySink for TracingSink {
    fn advise(&self, advisory: &Advisory) {
        tracing::warn!(
            format = %advisory.format,
            replacement = %advisory.replacement_spelling(),
            "{advisory}"
        );
    }
}
