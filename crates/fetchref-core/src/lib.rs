//! fetchref Core Library
//!
//! Resolves a user-supplied reference string (a file, directory, git
//! repository, archive, module coordinate or single proto file, with optional
//! `#key=value` options) into a typed, validated reference. Fetching the
//! referenced content is left to the caller.

pub mod config;
pub mod deprecation;
pub mod error;
pub mod format;
pub mod git;
pub mod infer;
pub mod module_ref;
pub mod parsed;
pub mod parser;
pub mod raw;
pub mod refs;

pub use config::ParserConfig;
pub use deprecation::{Advisory, AdvisorySink, TracingSink};
pub use error::{ErrorClass, RefError, Result};
pub use format::{ArchiveType, Compression, Format, FormatKind, MessageEncoding};
pub use git::{GitRef, GitRefName, GitTransport};
pub use infer::{FsProbe, ModuleOrDirPolicy};
pub use module_ref::ModuleCoordinate;
pub use parsed::{ArchiveRef, DirRef, ModuleRef, ParsedRef, ProtoFileRef, SingleRef};
pub use parser::{ParserKind, RefParser, RefParserBuilder};
pub use raw::{RawOptions, RawRef};
pub use refs::{MessageRef, Ref, SourceOrModuleRef, SourceRef};

/// Re-exports of commonly used types
pub mod prelude {
    pub use crate::error::{ErrorClass, RefError};
    pub use crate::format::{Compression, Format, MessageEncoding};
    pub use crate::parser::{ParserKind, RefParser};
    pub use crate::refs::{MessageRef, Ref, SourceOrModuleRef, SourceRef};
}
