//! Deriving a default format and compression from a path.
//!
//! Inference only runs when the reference carries no explicit `format=`.
//! The outermost `.gz`/`.zst` suffix always decides the compression, and the
//! extension beneath it decides the format.

mod ambiguity;

use crate::error::{RefError, Result};
use crate::format::{Compression, Format, FormatRegistry, MessageEncoding};
use crate::raw::RawRef;

pub use ambiguity::{FsContext, FsProbe, ModuleOrDirPolicy, OsFs, assume_module_or_dir};

#[cfg(not(windows))]
const STREAM_DEVICES: &[&str] = &["/dev/null", "/dev/stdin", "/dev/stdout"];
#[cfg(windows)]
const STREAM_DEVICES: &[&str] = &["NUL", "nul"];

/// Whether `path` names stdin, stdout or the null device.
pub fn is_stream_path(path: &str) -> bool {
    path == "-" || STREAM_DEVICES.contains(&path)
}

/// Which fallback a parser uses when the extension decides nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferenceProfile {
    /// Stream tokens are binary messages, unknown extensions go through
    /// [`assume_module_or_dir`].
    Generic,
    /// Stream tokens and unknown extensions use the default encoding.
    Message { default_encoding: MessageEncoding },
    /// Unknown extensions are directories.
    Source,
    /// Unknown extensions go through [`assume_module_or_dir`].
    SourceOrModule,
    /// Everything is a module.
    Module,
}

/// Everything inference needs besides the path itself.
#[derive(Debug, Clone, Copy)]
pub struct InferenceContext<'a> {
    pub profile: InferenceProfile,
    pub registry: &'a FormatRegistry,
    pub fs: &'a FsContext,
    pub policy: ModuleOrDirPolicy,
    /// Whether `.proto` paths become proto file references.
    pub accepts_proto_file: bool,
}

/// Fill in the format and compression of `raw` when no format was given.
///
/// An explicit compression is kept even when the path implies another one.
pub fn infer(raw: &mut RawRef, ctx: &InferenceContext<'_>) -> Result<()> {
    if raw.format.is_some() {
        return Ok(());
    }

    let (format, compression) = infer_format(&raw.path, ctx)?;
    tracing::debug!(
        path = %raw.path,
        %format,
        %compression,
        "inferred format from path"
    );
    raw.format = Some(format);
    if raw.compression.is_none() {
        raw.compression = Some(compression);
    }
    Ok(())
}

fn infer_format(path: &str, ctx: &InferenceContext<'_>) -> Result<(Format, Compression)> {
    if ctx.profile == InferenceProfile::Module {
        return Ok((Format::Mod, Compression::None));
    }

    if is_stream_path(path) {
        match ctx.profile {
            InferenceProfile::Generic => return Ok((Format::Binpb, Compression::None)),
            InferenceProfile::Message { default_encoding } => {
                return Ok((default_encoding.format(), Compression::None));
            }
            _ => {}
        }
    }

    match split_extension(path) {
        Some((inner_path, ext @ ("gz" | "zst"))) => {
            let compression = if ext == "gz" {
                Compression::Gzip
            } else {
                Compression::Zstd
            };
            let inner = split_extension(inner_path)
                .and_then(|(_, inner_ext)| lookup_extension(inner_ext))
                .filter(|(format, inner_compression)| {
                    *inner_compression == Compression::None
                        && ctx
                            .registry
                            .get(*format)
                            .is_some_and(|descriptor| descriptor.allows_compression(compression))
                });
            match inner {
                Some((format, _)) => Ok((format, compression)),
                None => Err(RefError::UnknownFormatUnderCompression {
                    path: path.to_string(),
                    suffix: ext.to_string(),
                }),
            }
        }
        Some((_, "proto")) if ctx.accepts_proto_file => {
            if ctx.fs.is_dir(path) {
                return Err(RefError::ProtoFileIsDirectory {
                    path: path.to_string(),
                });
            }
            Ok((Format::Protofile, Compression::None))
        }
        Some((_, ext)) => match lookup_extension(ext) {
            Some((format, compression)) if ctx.registry.contains(format) => {
                Ok((format, compression))
            }
            _ => fallback(path, ctx),
        },
        None => fallback(path, ctx),
    }
}

/// The fixed extension table.
fn lookup_extension(ext: &str) -> Option<(Format, Compression)> {
    let entry = match ext {
        "bin" | "binpb" => (Format::Binpb, Compression::None),
        "json" => (Format::Json, Compression::None),
        "txtpb" => (Format::Txtpb, Compression::None),
        "yaml" => (Format::Yaml, Compression::None),
        "tar" => (Format::Tar, Compression::None),
        "zip" => (Format::Zip, Compression::None),
        "tgz" => (Format::Tar, Compression::Gzip),
        "git" => (Format::Git, Compression::None),
        _ => return None,
    };
    Some(entry)
}

fn fallback(path: &str, ctx: &InferenceContext<'_>) -> Result<(Format, Compression)> {
    let format = match ctx.profile {
        InferenceProfile::Generic | InferenceProfile::SourceOrModule => {
            assume_module_or_dir(path, ctx.policy, ctx.fs)?
        }
        InferenceProfile::Message { default_encoding } => default_encoding.format(),
        InferenceProfile::Source => Format::Dir,
        InferenceProfile::Module => Format::Mod,
    };
    Ok((format, Compression::None))
}

/// Split `path` into the part before the last `.` of its final segment and
/// the extension after it.
///
/// A final segment that is empty (trailing separator) or has no dot yields
/// `None`. A leading dot counts, so `.json` has extension `json`.
fn split_extension(path: &str) -> Option<(&str, &str)> {
    let segment_start = path
        .rfind(std::path::is_separator)
        .map_or(0, |idx| idx + 1);
    let dot = segment_start + path[segment_start..].rfind('.')?;
    let ext = &path[dot + 1..];
    if ext.is_empty() {
        return None;
    }
    Some((&path[..dot], ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn infer_with(
        path: &str,
        profile: InferenceProfile,
        registry: &FormatRegistry,
    ) -> Result<RawRef> {
        let fs = FsContext::default();
        let ctx = InferenceContext {
            profile,
            registry,
            fs: &fs,
            policy: ModuleOrDirPolicy::Dir,
            accepts_proto_file: registry.contains(Format::Protofile),
        };
        let mut raw = RawRef {
            path: path.to_string(),
            ..RawRef::default()
        };
        infer(&mut raw, &ctx)?;
        Ok(raw)
    }

    fn inferred(path: &str) -> (Format, Compression) {
        let raw = infer_with(path, InferenceProfile::Generic, &FormatRegistry::full()).unwrap();
        (raw.format.unwrap(), raw.compression.unwrap())
    }

    #[test]
    fn extension_table() {
        let cases = [
            ("image.bin", Format::Binpb, Compression::None),
            ("image.binpb", Format::Binpb, Compression::None),
            ("image.json", Format::Json, Compression::None),
            ("image.txtpb", Format::Txtpb, Compression::None),
            ("image.yaml", Format::Yaml, Compression::None),
            ("proto.tar", Format::Tar, Compression::None),
            ("proto.zip", Format::Zip, Compression::None),
            ("proto.tgz", Format::Tar, Compression::Gzip),
            ("weather.git", Format::Git, Compression::None),
            (".json", Format::Json, Compression::None),
            ("nested/.yaml", Format::Yaml, Compression::None),
            ("v1.2/proto.tar.gz", Format::Tar, Compression::Gzip),
        ];
        for (path, format, compression) in cases {
            assert_eq!(inferred(path), (format, compression), "{path}");
        }
    }

    #[test]
    fn trailing_separator_means_no_extension() {
        for path in ["proto.tar/", "proto.tar.gz/", "image.json/", "v1.2/proto"] {
            assert_eq!(inferred(path), (Format::Dir, Compression::None), "{path}");
        }
    }

    #[test]
    fn split_extension_uses_final_segment() {
        assert_eq!(split_extension("a/b.tar.gz"), Some(("a/b.tar", "gz")));
        assert_eq!(split_extension(".json"), Some(("", "json")));
        assert_eq!(split_extension("a.b/"), None);
        assert_eq!(split_extension("a.b/c"), None);
        assert_eq!(split_extension("trailing."), None);
    }

    #[test]
    fn compression_suffix_wraps_inner_format() {
        for ext in ["bin", "binpb", "json", "txtpb", "yaml", "tar"] {
            let (format, _) = inferred(&format!("file.{ext}"));
            assert_eq!(inferred(&format!("file.{ext}.gz")), (format, Compression::Gzip));
            assert_eq!(inferred(&format!("file.{ext}.zst")), (format, Compression::Zstd));
        }
    }

    #[test]
    fn unknown_format_under_compression_fails() {
        let registry = FormatRegistry::full();
        for path in ["file.gz", "file.txt.gz", "file.zip.zst", "file.tgz.gz", "repo.git.gz"] {
            let err = infer_with(path, InferenceProfile::Generic, &registry).unwrap_err();
            assert!(
                matches!(err, RefError::UnknownFormatUnderCompression { .. }),
                "{path}: {err}"
            );
        }
    }

    #[test]
    fn stream_tokens_use_profile_default() {
        assert_eq!(inferred("-"), (Format::Binpb, Compression::None));

        let registry = FormatRegistry::messages();
        let raw = infer_with(
            "-",
            InferenceProfile::Message {
                default_encoding: MessageEncoding::Json,
            },
            &registry,
        )
        .unwrap();
        assert_eq!(raw.format, Some(Format::Json));
    }

    #[cfg(not(windows))]
    #[test]
    fn device_paths_are_stream_tokens() {
        for path in ["/dev/stdin", "/dev/stdout", "/dev/null"] {
            assert!(is_stream_path(path));
            assert_eq!(inferred(path).0, Format::Binpb);
        }
        assert!(!is_stream_path("/dev/sda"));
    }

    #[test]
    fn proto_suffix_depends_on_context() {
        assert_eq!(inferred("weather.proto").0, Format::Protofile);

        let raw = infer_with("weather.proto", InferenceProfile::Source, &FormatRegistry::sources())
            .unwrap();
        assert_eq!(raw.format, Some(Format::Dir));
    }

    #[test]
    fn unregistered_table_hits_fall_through() {
        let registry = FormatRegistry::sources();
        let raw = infer_with("image.json", InferenceProfile::Source, &registry).unwrap();
        assert_eq!(raw.format, Some(Format::Dir));

        let err = infer_with("image.json.gz", InferenceProfile::Source, &registry).unwrap_err();
        assert!(matches!(err, RefError::UnknownFormatUnderCompression { .. }));
    }

    #[test]
    fn module_profile_always_infers_module() {
        let raw = infer_with("proto.tar", InferenceProfile::Module, &FormatRegistry::modules())
            .unwrap();
        assert_eq!(raw.format, Some(Format::Mod));
    }

    #[test]
    fn explicit_compression_is_kept() {
        let fs = FsContext::default();
        let registry = FormatRegistry::full();
        let ctx = InferenceContext {
            profile: InferenceProfile::Generic,
            registry: &registry,
            fs: &fs,
            policy: ModuleOrDirPolicy::Probe,
            accepts_proto_file: true,
        };
        let mut raw = RawRef {
            path: "image.json.gz".to_string(),
            compression: Some(Compression::Zstd),
            ..RawRef::default()
        };
        infer(&mut raw, &ctx).unwrap();
        assert_eq!(raw.format, Some(Format::Json));
        assert_eq!(raw.compression, Some(Compression::Zstd));
    }

    #[test]
    fn explicit_format_skips_inference() {
        let fs = FsContext::default();
        let registry = FormatRegistry::full();
        let ctx = InferenceContext {
            profile: InferenceProfile::Generic,
            registry: &registry,
            fs: &fs,
            policy: ModuleOrDirPolicy::Probe,
            accepts_proto_file: true,
        };
        let mut raw = RawRef {
            path: "archive.weird.gz".to_string(),
            format: Some(Format::Tar),
            ..RawRef::default()
        };
        infer(&mut raw, &ctx).unwrap();
        assert_eq!(raw.format, Some(Format::Tar));
        assert_eq!(raw.compression, None);
    }
}
