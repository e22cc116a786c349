//! Format identifiers and the enums derived from them.
//!
//! Every reference resolves to exactly one [`Format`]. The format decides the
//! [`FormatKind`], which in turn decides the [`ParsedRef`](crate::ParsedRef)
//! variant that is produced.

pub mod registry;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RefError;

pub use registry::{
    ALL_FORMATS, CustomOptionKey, FormatDescriptor, FormatRegistry, FormatRegistryBuilder,
    MESSAGE_FORMATS, MODULE_FORMATS, SOURCE_FORMATS, SOURCE_OR_MODULE_FORMATS,
};

/// A format identifier as spelled in `#format=<id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Bin,
    Binpb,
    Json,
    Txtpb,
    Yaml,
    /// Legacy spelling of `bin` with gzip compression.
    Bingz,
    /// Legacy spelling of `json` with gzip compression.
    Jsongz,
    Tar,
    /// Legacy spelling of `tar` with gzip compression.
    Targz,
    Zip,
    Git,
    Dir,
    Mod,
    Protofile,
}

impl Format {
    pub const ALL: [Format; 14] = [
        Format::Bin,
        Format::Binpb,
        Format::Json,
        Format::Txtpb,
        Format::Yaml,
        Format::Bingz,
        Format::Jsongz,
        Format::Tar,
        Format::Targz,
        Format::Zip,
        Format::Git,
        Format::Dir,
        Format::Mod,
        Format::Protofile,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Format::Bin => "bin",
            Format::Binpb => "binpb",
            Format::Json => "json",
            Format::Txtpb => "txtpb",
            Format::Yaml => "yaml",
            Format::Bingz => "bingz",
            Format::Jsongz => "jsongz",
            Format::Tar => "tar",
            Format::Targz => "targz",
            Format::Zip => "zip",
            Format::Git => "git",
            Format::Dir => "dir",
            Format::Mod => "mod",
            Format::Protofile => "protofile",
        }
    }

    /// The kind of reference this format produces.
    pub fn kind(self) -> FormatKind {
        match self {
            Format::Bin
            | Format::Binpb
            | Format::Json
            | Format::Txtpb
            | Format::Yaml
            | Format::Bingz
            | Format::Jsongz => FormatKind::Single,
            Format::Tar | Format::Targz | Format::Zip => FormatKind::Archive,
            Format::Git => FormatKind::Git,
            Format::Dir => FormatKind::Dir,
            Format::Mod => FormatKind::Module,
            Format::Protofile => FormatKind::ProtoFile,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = RefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Format::ALL
            .into_iter()
            .find(|format| format.as_str() == s)
            .ok_or_else(|| RefError::UnknownFormat {
                format: s.to_string(),
            })
    }
}

/// The closed set of reference kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatKind {
    Single,
    Archive,
    Git,
    Dir,
    Module,
    ProtoFile,
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FormatKind::Single => "message",
            FormatKind::Archive => "archive",
            FormatKind::Git => "git repository",
            FormatKind::Dir => "directory",
            FormatKind::Module => "module",
            FormatKind::ProtoFile => "proto file",
        };
        f.write_str(name)
    }
}

/// Compression applied to a single message or a tar archive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    None,
    Gzip,
    Zstd,
}

impl Compression {
    pub fn as_str(self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Gzip => "gzip",
            Compression::Zstd => "zstd",
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Compression {
    type Err = RefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Compression::None),
            "gzip" => Ok(Compression::Gzip),
            "zstd" => Ok(Compression::Zstd),
            other => Err(RefError::invalid_value(
                "compression",
                other,
                "expected one of none, gzip, zstd",
            )),
        }
    }
}

/// Container type of an archive reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveType {
    Tar,
    Zip,
}

/// Serialization of a single encoded message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageEncoding {
    #[default]
    Binpb,
    Json,
    Txtpb,
    Yaml,
}

impl MessageEncoding {
    /// The canonical format used when this encoding is the stream default.
    pub fn format(self) -> Format {
        match self {
            MessageEncoding::Binpb => Format::Binpb,
            MessageEncoding::Json => Format::Json,
            MessageEncoding::Txtpb => Format::Txtpb,
            MessageEncoding::Yaml => Format::Yaml,
        }
    }

    /// Map a single-message format to its encoding.
    ///
    /// Returns `None` for formats that are not single messages.
    pub fn from_format(format: Format) -> Option<Self> {
        match format {
            Format::Bin | Format::Binpb | Format::Bingz => Some(MessageEncoding::Binpb),
            Format::Json | Format::Jsongz => Some(MessageEncoding::Json),
            Format::Txtpb => Some(MessageEncoding::Txtpb),
            Format::Yaml => Some(MessageEncoding::Yaml),
            _ => None,
        }
    }
}

impl fmt::Display for MessageEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.format().as_str())
    }
}

impl FromStr for MessageEncoding {
    type Err = RefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "binpb" | "bin" => Ok(MessageEncoding::Binpb),
            "json" => Ok(MessageEncoding::Json),
            "txtpb" => Ok(MessageEncoding::Txtpb),
            "yaml" => Ok(MessageEncoding::Yaml),
            other => Err(RefError::invalid_value(
                "message encoding",
                other,
                "expected one of binpb, json, txtpb, yaml",
            )),
        }
    }
}

/// Join formats for error messages.
pub(crate) fn join_formats(formats: impl IntoIterator<Item = Format>) -> String {
    formats
        .into_iter()
        .map(Format::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
