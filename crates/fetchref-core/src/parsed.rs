//! Classified and validated references.

use serde::{Deserialize, Serialize};

use crate::error::{RefError, Result};
use crate::format::{
    ArchiveType, Compression, CustomOptionKey, Format, FormatDescriptor, FormatKind,
};
use crate::git::GitRef;
use crate::infer::is_stream_path;
use crate::module_ref::ModuleCoordinate;
use crate::raw::{RawOptions, RawRef};

/// A resolved reference. Exactly one variant per [`FormatKind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ParsedRef {
    /// A single encoded message
    Single(SingleRef),
    /// A tar or zip archive
    Archive(ArchiveRef),
    /// A local directory
    Dir(DirRef),
    /// A git repository
    Git(GitRef),
    /// A remote module
    Module(ModuleRef),
    /// A single `.proto` file
    ProtoFile(ProtoFileRef),
}

/// A single encoded message file or stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleRef {
    pub format: Format,
    pub compression: Compression,
    pub path: String,
    pub use_proto_names: bool,
    pub use_enum_numbers: bool,
}

impl SingleRef {
    /// Whether the message is read from or written to a stream token.
    pub fn is_stream(&self) -> bool {
        is_stream_path(&self.path)
    }
}

/// A tar or zip archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveRef {
    pub format: Format,
    pub archive_type: ArchiveType,
    pub compression: Compression,
    pub path: String,
    /// Subdirectory within the extracted archive
    pub subdir: Option<String>,
    /// Leading path components dropped while extracting
    pub strip_components: u32,
}

/// A local directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirRef {
    pub path: String,
}

impl DirRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// A module coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRef {
    pub coordinate: ModuleCoordinate,
}

/// A single schema file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtoFileRef {
    pub path: String,
    /// Also build the other files of the file's package
    pub include_package_files: bool,
}

impl ParsedRef {
    /// Build a reference from an inferred [`RawRef`] and the descriptor of its
    /// format, rejecting options the format does not accept.
    pub fn from_raw(raw: RawRef, descriptor: &FormatDescriptor) -> Result<Self> {
        let format = descriptor.format;
        let RawRef {
            path,
            compression,
            options,
            ..
        } = raw;

        let compression = compression
            .or(descriptor.default_compression)
            .unwrap_or_default();
        if !descriptor.allows_compression(compression) {
            return Err(RefError::CompressionNotAllowed {
                compression: compression.to_string(),
                format,
            });
        }
        check_options(&options, descriptor)?;

        if is_stream_path(&path)
            && matches!(
                descriptor.kind,
                FormatKind::Dir | FormatKind::Git | FormatKind::ProtoFile
            )
        {
            return Err(RefError::StreamNotAllowed { format, path });
        }

        let parsed = match descriptor.kind {
            FormatKind::Single => ParsedRef::Single(SingleRef {
                format,
                compression,
                use_proto_names: custom_flag(&options, CustomOptionKey::UseProtoNames),
                use_enum_numbers: custom_flag(&options, CustomOptionKey::UseEnumNumbers),
                path,
            }),
            FormatKind::Archive => {
                let archive_type = descriptor.archive_type.ok_or_else(|| {
                    RefError::Internal(format!("archive format {format} has no archive type"))
                })?;
                ParsedRef::Archive(ArchiveRef {
                    format,
                    archive_type,
                    compression,
                    path,
                    subdir: options.subdir,
                    strip_components: options.strip_components.unwrap_or(0),
                })
            }
            FormatKind::Git => ParsedRef::Git(GitRef::from_options(&path, &options)?),
            FormatKind::Dir => ParsedRef::Dir(DirRef { path }),
            FormatKind::Module => ParsedRef::Module(ModuleRef {
                coordinate: ModuleCoordinate::parse(&path)?,
            }),
            FormatKind::ProtoFile => ParsedRef::ProtoFile(ProtoFileRef {
                path,
                include_package_files: options.include_package_files.unwrap_or(false),
            }),
        };
        Ok(parsed)
    }

    /// The format this reference resolved to.
    pub fn format(&self) -> Format {
        match self {
            Self::Single(single) => single.format,
            Self::Archive(archive) => archive.format,
            Self::Dir(_) => Format::Dir,
            Self::Git(_) => Format::Git,
            Self::Module(_) => Format::Mod,
            Self::ProtoFile(_) => Format::Protofile,
        }
    }

    pub fn kind(&self) -> FormatKind {
        self.format().kind()
    }

    pub fn as_single(&self) -> Option<&SingleRef> {
        match self {
            Self::Single(single) => Some(single),
            _ => None,
        }
    }

    pub fn as_archive(&self) -> Option<&ArchiveRef> {
        match self {
            Self::Archive(archive) => Some(archive),
            _ => None,
        }
    }

    pub fn as_git(&self) -> Option<&GitRef> {
        match self {
            Self::Git(git) => Some(git),
            _ => None,
        }
    }

    pub fn as_module(&self) -> Option<&ModuleRef> {
        match self {
            Self::Module(module) => Some(module),
            _ => None,
        }
    }
}

fn custom_flag(options: &RawOptions, key: CustomOptionKey) -> bool {
    options.custom.get(&key).copied().unwrap_or(false)
}

fn check_options(options: &RawOptions, descriptor: &FormatDescriptor) -> Result<()> {
    let format = descriptor.format;
    let not_allowed = |key: &str| RefError::OptionNotAllowed {
        key: key.to_string(),
        format,
    };

    for key in options.custom.keys() {
        if !descriptor.allows_custom_option_key(*key) {
            return Err(not_allowed(key.as_str()));
        }
    }

    let kind = descriptor.kind;
    if options.subdir.is_some() && !matches!(kind, FormatKind::Archive | FormatKind::Git) {
        return Err(not_allowed("subdir"));
    }
    if options.strip_components.is_some() && kind != FormatKind::Archive {
        return Err(not_allowed("strip_components"));
    }
    if kind != FormatKind::Git {
        if let Some(key) = options.git_keys().first() {
            return Err(not_allowed(key));
        }
    }
    if options.include_package_files.is_some() && kind != FormatKind::ProtoFile {
        return Err(not_allowed("include_package_files"));
    }
    Ok(())
}
