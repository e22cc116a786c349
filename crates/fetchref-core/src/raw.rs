//! Splitting a reference string into a path and its explicit options.
//!
//! The accepted grammar is `<path>[#<key>=<value>[,<key>=<value>...]]`.
//! Nothing in this module touches the filesystem.

use std::collections::BTreeMap;

use crate::error::{RefError, Result};
use crate::format::registry::CustomOptionKey;
use crate::format::{Compression, Format};

const OPTIONS_DELIMITER: char = '#';
const OPTION_SEPARATOR: char = ',';

/// A reference string split into its path and options, prior to
/// classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRef {
    pub path: String,
    /// Explicit `format=`, or the inferred format once inference has run.
    pub format: Option<Format>,
    /// Explicit `compression=`, or the inferred compression.
    pub compression: Option<Compression>,
    pub options: RawOptions,
}

/// Every option besides `format` and `compression`.
///
/// Each field is `None` when the key was not given, so validation can tell
/// an explicit default apart from an absent key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOptions {
    pub subdir: Option<String>,
    pub branch: Option<String>,
    pub tag: Option<String>,
    pub git_ref: Option<String>,
    pub depth: Option<u32>,
    pub recurse_submodules: Option<bool>,
    pub strip_components: Option<u32>,
    pub include_package_files: Option<bool>,
    pub custom: BTreeMap<CustomOptionKey, bool>,
}

impl RawOptions {
    /// Names of the git-only keys that were given.
    pub(crate) fn git_keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.branch.is_some() {
            keys.push(OptionKey::Branch.as_str());
        }
        if self.tag.is_some() {
            keys.push(OptionKey::Tag.as_str());
        }
        if self.git_ref.is_some() {
            keys.push(OptionKey::Ref.as_str());
        }
        if self.depth.is_some() {
            keys.push(OptionKey::Depth.as_str());
        }
        if self.recurse_submodules.is_some() {
            keys.push(OptionKey::RecurseSubmodules.as_str());
        }
        keys
    }
}

/// The closed set of recognized option keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OptionKey {
    Format,
    Compression,
    Subdir,
    Branch,
    Tag,
    Ref,
    Depth,
    RecurseSubmodules,
    StripComponents,
    IncludePackageFiles,
    Custom(CustomOptionKey),
}

impl OptionKey {
    pub fn parse(key: &str) -> Option<Self> {
        let key = match key {
            "format" => OptionKey::Format,
            "compression" => OptionKey::Compression,
            "subdir" => OptionKey::Subdir,
            "branch" => OptionKey::Branch,
            "tag" => OptionKey::Tag,
            "ref" => OptionKey::Ref,
            "depth" => OptionKey::Depth,
            "recurse_submodules" => OptionKey::RecurseSubmodules,
            "strip_components" => OptionKey::StripComponents,
            "include_package_files" => OptionKey::IncludePackageFiles,
            other => OptionKey::Custom(CustomOptionKey::from_key(other)?),
        };
        Some(key)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OptionKey::Format => "format",
            OptionKey::Compression => "compression",
            OptionKey::Subdir => "subdir",
            OptionKey::Branch => "branch",
            OptionKey::Tag => "tag",
            OptionKey::Ref => "ref",
            OptionKey::Depth => "depth",
            OptionKey::RecurseSubmodules => "recurse_submodules",
            OptionKey::StripComponents => "strip_components",
            OptionKey::IncludePackageFiles => "include_package_files",
            OptionKey::Custom(key) => key.as_str(),
        }
    }

    /// Boolean keys may be given without `=value`, meaning `true`.
    pub fn is_boolean(self) -> bool {
        matches!(
            self,
            OptionKey::RecurseSubmodules | OptionKey::IncludePackageFiles | OptionKey::Custom(_)
        )
    }
}

/// Split a reference string into a [`RawRef`].
///
/// The format and compression stay `None` unless given explicitly.
pub fn split(value: &str) -> Result<RawRef> {
    if value.is_empty() {
        return Err(RefError::EmptyInput);
    }

    let (path, options) = match value.split_once(OPTIONS_DELIMITER) {
        Some((path, options)) => (path, Some(options)),
        None => (value, None),
    };
    if path.is_empty() {
        return Err(RefError::EmptyPath {
            value: value.to_string(),
        });
    }

    let mut raw = RawRef {
        path: path.to_string(),
        ..RawRef::default()
    };
    let Some(options) = options else {
        return Ok(raw);
    };
    if options.is_empty() {
        return Err(RefError::EmptyOptions {
            value: value.to_string(),
        });
    }

    let mut seen = Vec::new();
    for pair in options.split(OPTION_SEPARATOR) {
        let (key_str, option_value) = match pair.split_once('=') {
            Some((key, option_value)) => (key, Some(option_value)),
            None => (pair, None),
        };
        let key = OptionKey::parse(key_str).ok_or_else(|| RefError::UnknownOptionKey {
            key: key_str.to_string(),
            value: value.to_string(),
        })?;
        if seen.contains(&key) {
            return Err(RefError::DuplicateOptionKey {
                key: key_str.to_string(),
                value: value.to_string(),
            });
        }
        seen.push(key);

        let option_value = match option_value {
            None if key.is_boolean() => "true",
            None | Some("") => {
                return Err(RefError::MissingOptionValue {
                    key: key_str.to_string(),
                    value: value.to_string(),
                });
            }
            Some(option_value) => option_value,
        };
        apply_option(&mut raw, key, option_value)?;
    }

    Ok(raw)
}

fn apply_option(raw: &mut RawRef, key: OptionKey, value: &str) -> Result<()> {
    let options = &mut raw.options;
    match key {
        OptionKey::Format => raw.format = Some(value.parse()?),
        OptionKey::Compression => raw.compression = Some(value.parse()?),
        OptionKey::Subdir => options.subdir = normalize_subdir(value)?,
        OptionKey::Branch => options.branch = Some(value.to_string()),
        OptionKey::Tag => options.tag = Some(value.to_string()),
        OptionKey::Ref => options.git_ref = Some(value.to_string()),
        OptionKey::Depth => {
            let depth = parse_u32(key, value)?;
            if depth == 0 {
                return Err(RefError::invalid_value(
                    key.as_str(),
                    value,
                    "depth must be greater than zero",
                ));
            }
            options.depth = Some(depth);
        }
        OptionKey::RecurseSubmodules => options.recurse_submodules = Some(parse_bool(key, value)?),
        OptionKey::StripComponents => options.strip_components = Some(parse_u32(key, value)?),
        OptionKey::IncludePackageFiles => {
            options.include_package_files = Some(parse_bool(key, value)?)
        }
        OptionKey::Custom(custom) => {
            options.custom.insert(custom, parse_bool(key, value)?);
        }
    }
    Ok(())
}

fn parse_bool(key: OptionKey, value: &str) -> Result<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(RefError::invalid_value(
            key.as_str(),
            value,
            "expected true or false",
        )),
    }
}

fn parse_u32(key: OptionKey, value: &str) -> Result<u32> {
    value.parse::<u32>().map_err(|_| {
        RefError::invalid_value(key.as_str(), value, "expected a non-negative integer")
    })
}

/// Normalize a subdir to a relative, slash-separated path.
///
/// Returns `None` when the subdir points at the root.
pub fn normalize_subdir(subdir: &str) -> Result<Option<String>> {
    if subdir.starts_with('/') {
        return Err(RefError::InvalidSubdir {
            subdir: subdir.to_string(),
            reason: "must be relative".to_string(),
        });
    }

    let mut components: Vec<&str> = Vec::new();
    for component in subdir.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                if components.pop().is_none() {
                    return Err(RefError::InvalidSubdir {
                        subdir: subdir.to_string(),
                        reason: "escapes the root".to_string(),
                    });
                }
            }
            other => components.push(other),
        }
    }

    if components.is_empty() {
        Ok(None)
    } else {
        Ok(Some(components.join("/")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_path_has_no_options() {
        let raw = split("proto/acme").unwrap();
        assert_eq!(raw.path, "proto/acme");
        assert_eq!(raw.format, None);
        assert_eq!(raw.compression, None);
        assert_eq!(raw.options, RawOptions::default());
    }

    #[test]
    fn splits_format_compression_and_subdir() {
        let raw = split("archive.bin#format=tar,compression=gzip,subdir=api").unwrap();
        assert_eq!(raw.path, "archive.bin");
        assert_eq!(raw.format, Some(Format::Tar));
        assert_eq!(raw.compression, Some(Compression::Gzip));
        assert_eq!(raw.options.subdir.as_deref(), Some("api"));
    }

    #[test]
    fn unknown_key_is_named() {
        let err = split("foo#colour=blue").unwrap_err();
        assert!(matches!(err, RefError::UnknownOptionKey { ref key, .. } if key == "colour"));
    }

    #[test]
    fn duplicate_key_fails() {
        let err = split("foo#format=json,format=yaml").unwrap_err();
        assert!(matches!(err, RefError::DuplicateOptionKey { ref key, .. } if key == "format"));
    }

    #[test]
    fn key_without_value_fails_unless_boolean() {
        let err = split("foo#format").unwrap_err();
        assert!(matches!(err, RefError::MissingOptionValue { .. }));

        let raw = split("foo.git#recurse_submodules").unwrap();
        assert_eq!(raw.options.recurse_submodules, Some(true));

        let raw = split("foo.json#use_proto_names").unwrap();
        assert_eq!(
            raw.options.custom.get(&CustomOptionKey::UseProtoNames),
            Some(&true)
        );
    }

    #[test]
    fn empty_value_fails_even_for_boolean_keys() {
        assert!(split("foo#subdir=").is_err());
        assert!(split("foo.git#recurse_submodules=").is_err());
    }

    #[test]
    fn empty_path_and_empty_options_fail() {
        assert!(matches!(split("").unwrap_err(), RefError::EmptyInput));
        assert!(matches!(
            split("#format=json").unwrap_err(),
            RefError::EmptyPath { .. }
        ));
        assert!(matches!(
            split("foo#").unwrap_err(),
            RefError::EmptyOptions { .. }
        ));
    }

    #[test]
    fn depth_must_be_positive() {
        assert!(split("foo.git#depth=0").is_err());
        assert!(split("foo.git#depth=abc").is_err());
        assert_eq!(split("foo.git#depth=10").unwrap().options.depth, Some(10));
    }

    #[test]
    fn boolean_values_must_be_true_or_false() {
        let err = split("foo.git#recurse_submodules=yes").unwrap_err();
        assert!(err.to_string().contains("expected true or false"));
    }

    #[test]
    fn subdir_is_normalized() {
        assert_eq!(normalize_subdir("./a//b/./c").unwrap().as_deref(), Some("a/b/c"));
        assert_eq!(normalize_subdir("a/../b").unwrap().as_deref(), Some("b"));
        assert_eq!(normalize_subdir(".").unwrap(), None);
        assert!(normalize_subdir("../a").is_err());
        assert!(normalize_subdir("/abs").is_err());
    }
}
