//! Per-parser table of legal formats and the options each accepts.

use std::collections::BTreeMap;
use std::fmt;

use super::{ArchiveType, Compression, Format, FormatKind};

/// Formats accepted by the generic entry point.
pub const ALL_FORMATS: &[Format] = &Format::ALL;

/// Formats accepted when resolving a source or a module.
pub const SOURCE_OR_MODULE_FORMATS: &[Format] = &[
    Format::Tar,
    Format::Targz,
    Format::Zip,
    Format::Git,
    Format::Dir,
    Format::Mod,
    Format::Protofile,
];

/// Formats accepted when resolving a single encoded message.
pub const MESSAGE_FORMATS: &[Format] = &[
    Format::Bin,
    Format::Binpb,
    Format::Json,
    Format::Txtpb,
    Format::Yaml,
    Format::Bingz,
    Format::Jsongz,
];

/// Formats accepted when resolving a source.
pub const SOURCE_FORMATS: &[Format] = &[
    Format::Tar,
    Format::Targz,
    Format::Zip,
    Format::Git,
    Format::Dir,
];

/// Formats accepted when resolving a module.
pub const MODULE_FORMATS: &[Format] = &[Format::Mod];

/// Format-specific option keys of single messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CustomOptionKey {
    UseProtoNames,
    UseEnumNumbers,
}

impl CustomOptionKey {
    pub const ALL: [CustomOptionKey; 2] =
        [CustomOptionKey::UseProtoNames, CustomOptionKey::UseEnumNumbers];

    pub fn as_str(self) -> &'static str {
        match self {
            CustomOptionKey::UseProtoNames => "use_proto_names",
            CustomOptionKey::UseEnumNumbers => "use_enum_numbers",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == key)
    }
}

impl fmt::Display for CustomOptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a registered format accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatDescriptor {
    pub format: Format,
    pub kind: FormatKind,
    /// Only set for archive formats.
    pub archive_type: Option<ArchiveType>,
    pub allowed_compressions: Vec<Compression>,
    pub allowed_custom_option_keys: Vec<CustomOptionKey>,
    /// Applied when the user did not give a compression.
    pub default_compression: Option<Compression>,
}

impl FormatDescriptor {
    fn new(format: Format, allowed_compressions: Vec<Compression>) -> Self {
        Self {
            format,
            kind: format.kind(),
            archive_type: None,
            allowed_compressions,
            allowed_custom_option_keys: Vec::new(),
            default_compression: None,
        }
    }

    /// A single encoded message. Accepts every compression.
    pub fn single(format: Format) -> Self {
        debug_assert_eq!(format.kind(), FormatKind::Single);
        Self::new(
            format,
            vec![Compression::None, Compression::Gzip, Compression::Zstd],
        )
    }

    /// An archive. Only tar archives accept compression.
    pub fn archive(format: Format, archive_type: ArchiveType) -> Self {
        debug_assert_eq!(format.kind(), FormatKind::Archive);
        let compressions = match archive_type {
            ArchiveType::Tar => vec![Compression::None, Compression::Gzip, Compression::Zstd],
            ArchiveType::Zip => vec![Compression::None],
        };
        Self {
            archive_type: Some(archive_type),
            ..Self::new(format, compressions)
        }
    }

    pub fn git() -> Self {
        Self::new(Format::Git, vec![Compression::None])
    }

    pub fn dir() -> Self {
        Self::new(Format::Dir, vec![Compression::None])
    }

    pub fn module() -> Self {
        Self::new(Format::Mod, vec![Compression::None])
    }

    pub fn proto_file() -> Self {
        Self::new(Format::Protofile, vec![Compression::None])
    }

    /// Allow a format-specific option key.
    pub fn with_custom_option_key(mut self, key: CustomOptionKey) -> Self {
        if !self.allowed_custom_option_keys.contains(&key) {
            self.allowed_custom_option_keys.push(key);
        }
        self
    }

    pub fn with_default_compression(mut self, compression: Compression) -> Self {
        self.default_compression = Some(compression);
        self
    }

    pub fn allows_compression(&self, compression: Compression) -> bool {
        self.allowed_compressions.contains(&compression)
    }

    pub fn allows_custom_option_key(&self, key: CustomOptionKey) -> bool {
        self.allowed_custom_option_keys.contains(&key)
    }
}

/// Immutable set of registered formats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatRegistry {
    descriptors: BTreeMap<Format, FormatDescriptor>,
}

impl FormatRegistry {
    pub fn builder() -> FormatRegistryBuilder {
        FormatRegistryBuilder::default()
    }

    pub fn get(&self, format: Format) -> Option<&FormatDescriptor> {
        self.descriptors.get(&format)
    }

    pub fn contains(&self, format: Format) -> bool {
        self.descriptors.contains_key(&format)
    }

    /// Registered formats in identifier order.
    pub fn formats(&self) -> impl Iterator<Item = Format> + '_ {
        self.descriptors.keys().copied()
    }

    /// Every format, for parsers that accept all reference kinds.
    pub fn full() -> Self {
        Self::builder()
            .messages()
            .sources()
            .register(FormatDescriptor::module())
            .register(FormatDescriptor::proto_file())
            .build()
    }

    /// Single encoded messages only.
    pub fn messages() -> Self {
        Self::builder().messages().build()
    }

    /// Archives, git repositories and directories.
    pub fn sources() -> Self {
        Self::builder().sources().build()
    }

    /// Module references only.
    pub fn modules() -> Self {
        Self::builder().register(FormatDescriptor::module()).build()
    }

    /// Sources, modules and single proto files.
    pub fn sources_or_modules() -> Self {
        Self::builder()
            .sources()
            .register(FormatDescriptor::module())
            .register(FormatDescriptor::proto_file())
            .build()
    }
}

/// Assembles a [`FormatRegistry`]. Registering a format twice keeps the last
/// descriptor.
#[derive(Debug, Default)]
pub struct FormatRegistryBuilder {
    descriptors: BTreeMap<Format, FormatDescriptor>,
}

impl FormatRegistryBuilder {
    pub fn register(mut self, descriptor: FormatDescriptor) -> Self {
        self.descriptors.insert(descriptor.format, descriptor);
        self
    }

    /// Register the single message formats, including the legacy gzip ones.
    pub fn messages(self) -> Self {
        self.register(FormatDescriptor::single(Format::Bin))
            .register(FormatDescriptor::single(Format::Binpb))
            .register(
                FormatDescriptor::single(Format::Json)
                    .with_custom_option_key(CustomOptionKey::UseProtoNames)
                    .with_custom_option_key(CustomOptionKey::UseEnumNumbers),
            )
            .register(FormatDescriptor::single(Format::Txtpb))
            .register(
                FormatDescriptor::single(Format::Yaml)
                    .with_custom_option_key(CustomOptionKey::UseProtoNames)
                    .with_custom_option_key(CustomOptionKey::UseEnumNumbers),
            )
            .register(
                FormatDescriptor::single(Format::Bingz)
                    .with_default_compression(Compression::Gzip),
            )
            .register(
                FormatDescriptor::single(Format::Jsongz)
                    .with_default_compression(Compression::Gzip),
            )
    }

    /// Register archives, git and directories.
    pub fn sources(self) -> Self {
        self.register(FormatDescriptor::archive(Format::Tar, ArchiveType::Tar))
            .register(
                FormatDescriptor::archive(Format::Targz, ArchiveType::Tar)
                    .with_default_compression(Compression::Gzip),
            )
            .register(FormatDescriptor::archive(Format::Zip, ArchiveType::Zip))
            .register(FormatDescriptor::git())
            .register(FormatDescriptor::dir())
    }

    pub fn build(self) -> FormatRegistry {
        FormatRegistry {
            descriptors: self.descriptors,
        }
    }
}
