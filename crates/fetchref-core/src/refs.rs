//! References handed to the fetching layer, one type per consumer use-case.

use serde::{Deserialize, Serialize};

use crate::error::{RefError, Result};
use crate::format::{Compression, MessageEncoding};
use crate::git::GitRef;
use crate::parsed::{ArchiveRef, DirRef, ModuleRef, ParsedRef, ProtoFileRef, SingleRef};

/// Any reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "ref")]
pub enum Ref {
    Message(MessageRef),
    Source(SourceRef),
    Module(ModuleRef),
    ProtoFile(ProtoFileRef),
}

/// A reference that can be built: a source, a module, or one proto file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "ref")]
pub enum SourceOrModuleRef {
    Source(SourceRef),
    Module(ModuleRef),
    ProtoFile(ProtoFileRef),
}

/// A tree of files: an archive, a git repository or a directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SourceRef {
    Archive(ArchiveRef),
    Dir(DirRef),
    Git(GitRef),
}

impl SourceRef {
    /// Path of the archive, repository or directory.
    pub fn path(&self) -> &str {
        match self {
            Self::Archive(archive) => &archive.path,
            Self::Dir(dir) => &dir.path,
            Self::Git(git) => &git.path,
        }
    }

    /// Subdirectory within the fetched tree, if any.
    pub fn subdir(&self) -> Option<&str> {
        match self {
            Self::Archive(archive) => archive.subdir.as_deref(),
            Self::Git(git) => git.subdir.as_deref(),
            Self::Dir(_) => None,
        }
    }
}

/// A single encoded message and its encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    #[serde(flatten)]
    pub single: SingleRef,
    pub encoding: MessageEncoding,
}

impl MessageRef {
    pub fn new(single: SingleRef) -> Result<Self> {
        let encoding = MessageEncoding::from_format(single.format).ok_or_else(|| {
            RefError::Internal(format!(
                "format {} has no message encoding",
                single.format
            ))
        })?;
        Ok(Self { single, encoding })
    }

    pub fn path(&self) -> &str {
        &self.single.path
    }

    pub fn compression(&self) -> Compression {
        self.single.compression
    }

    pub fn is_stream(&self) -> bool {
        self.single.is_stream()
    }

    pub fn use_proto_names(&self) -> bool {
        self.single.use_proto_names
    }

    pub fn use_enum_numbers(&self) -> bool {
        self.single.use_enum_numbers
    }
}

impl Ref {
    /// Build from any parsed reference.
    pub fn from_parsed(parsed: ParsedRef) -> Result<Self> {
        let r = match parsed {
            ParsedRef::Single(single) => Ref::Message(MessageRef::new(single)?),
            ParsedRef::Archive(archive) => Ref::Source(SourceRef::Archive(archive)),
            ParsedRef::Dir(dir) => Ref::Source(SourceRef::Dir(dir)),
            ParsedRef::Git(git) => Ref::Source(SourceRef::Git(git)),
            ParsedRef::Module(module) => Ref::Module(module),
            ParsedRef::ProtoFile(proto_file) => Ref::ProtoFile(proto_file),
        };
        Ok(r)
    }
}

impl SourceOrModuleRef {
    pub fn from_parsed(parsed: ParsedRef) -> Result<Self> {
        match parsed {
            ParsedRef::Single(single) => Err(RefError::Internal(format!(
                "message format {} reached the source or module builder",
                single.format
            ))),
            ParsedRef::Archive(archive) => Ok(Self::Source(SourceRef::Archive(archive))),
            ParsedRef::Dir(dir) => Ok(Self::Source(SourceRef::Dir(dir))),
            ParsedRef::Git(git) => Ok(Self::Source(SourceRef::Git(git))),
            ParsedRef::Module(module) => Ok(Self::Module(module)),
            ParsedRef::ProtoFile(proto_file) => Ok(Self::ProtoFile(proto_file)),
        }
    }
}

impl SourceRef {
    pub fn from_parsed(parsed: ParsedRef) -> Result<Self> {
        match parsed {
            ParsedRef::Archive(archive) => Ok(Self::Archive(archive)),
            ParsedRef::Dir(dir) => Ok(Self::Dir(dir)),
            ParsedRef::Git(git) => Ok(Self::Git(git)),
            other => Err(unexpected(&other, "source")),
        }
    }
}

impl MessageRef {
    pub fn from_parsed(parsed: ParsedRef) -> Result<Self> {
        match parsed {
            ParsedRef::Single(single) => Self::new(single),
            other => Err(unexpected(&other, "message")),
        }
    }
}

impl ModuleRef {
    pub fn from_parsed(parsed: ParsedRef) -> Result<Self> {
        match parsed {
            ParsedRef::Module(module) => Ok(module),
            other => Err(unexpected(&other, "module")),
        }
    }
}

// The allowed-format check runs first, so reaching these is a bug.
fn unexpected(parsed: &ParsedRef, builder: &str) -> RefError {
    RefError::Internal(format!(
        "{} reference with format {} reached the {builder} builder",
        parsed.kind(),
        parsed.format()
    ))
}
