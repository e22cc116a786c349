//! Reference parsers and their entry points.
//!
//! A [`RefParser`] owns a [`FormatRegistry`] and an [`InferenceProfile`]
//! fixed at construction. Every entry point runs the same pipeline:
//!
//! 1. split the string into a [`RawRef`](crate::RawRef)
//! 2. infer format and compression when no `format=` was given
//! 3. check the format against the entry point's allowed set, then the registry
//! 4. validate options and build the [`ParsedRef`]
//! 5. emit at most one deprecation [`Advisory`](crate::Advisory)
//! 6. convert to the entry point's output type

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::ParserConfig;
use crate::deprecation::{AdvisorySink, TracingSink, check_deprecated};
use crate::error::{RefError, Result};
use crate::format::{
    ALL_FORMATS, Format, FormatRegistry, MESSAGE_FORMATS, MODULE_FORMATS, MessageEncoding,
    SOURCE_FORMATS, SOURCE_OR_MODULE_FORMATS, join_formats,
};
use crate::infer::{
    FsContext, FsProbe, InferenceContext, InferenceProfile, ModuleOrDirPolicy, OsFs, infer,
};
use crate::parsed::{ModuleRef, ParsedRef};
use crate::raw;
use crate::refs::{MessageRef, Ref, SourceOrModuleRef, SourceRef};

/// Which family of formats a parser registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserKind {
    /// Every format.
    Generic,
    /// Single encoded messages.
    Message,
    /// Archives, git repositories and directories.
    Source,
    /// Module coordinates.
    Module,
    /// Sources, modules and proto files.
    SourceOrModule,
}

/// Resolves reference strings. Cheap to share across threads.
#[derive(Debug, Clone)]
pub struct RefParser {
    profile: InferenceProfile,
    registry: FormatRegistry,
    fs: FsContext,
    policy: ModuleOrDirPolicy,
    sink: Arc<dyn AdvisorySink>,
}

impl Default for RefParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RefParser {
    /// A parser that accepts every reference kind.
    pub fn new() -> Self {
        Self::builder(ParserKind::Generic).build()
    }

    /// A parser for single messages. `default_encoding` applies to stream
    /// tokens and paths without a known extension.
    pub fn message(default_encoding: MessageEncoding) -> Self {
        Self::builder(ParserKind::Message)
            .default_message_encoding(default_encoding)
            .build()
    }

    pub fn source() -> Self {
        Self::builder(ParserKind::Source).build()
    }

    pub fn module() -> Self {
        Self::builder(ParserKind::Module).build()
    }

    pub fn source_or_module() -> Self {
        Self::builder(ParserKind::SourceOrModule).build()
    }

    pub fn builder(kind: ParserKind) -> RefParserBuilder {
        RefParserBuilder::new(kind)
    }

    /// Resolve any reference.
    pub fn get_ref(&self, value: &str) -> Result<Ref> {
        Ref::from_parsed(self.get_parsed_ref(value, ALL_FORMATS)?)
    }

    /// Resolve a source, module or proto file. Messages are rejected.
    pub fn get_source_or_module_ref(&self, value: &str) -> Result<SourceOrModuleRef> {
        SourceOrModuleRef::from_parsed(self.get_parsed_ref(value, SOURCE_OR_MODULE_FORMATS)?)
    }

    /// Resolve a single encoded message and its encoding.
    pub fn get_message_ref(&self, value: &str) -> Result<MessageRef> {
        MessageRef::from_parsed(self.get_parsed_ref(value, MESSAGE_FORMATS)?)
    }

    /// Resolve an archive, git repository or directory.
    pub fn get_source_ref(&self, value: &str) -> Result<SourceRef> {
        SourceRef::from_parsed(self.get_parsed_ref(value, SOURCE_FORMATS)?)
    }

    /// Resolve a module coordinate.
    pub fn get_module_ref(&self, value: &str) -> Result<ModuleRef> {
        ModuleRef::from_parsed(self.get_parsed_ref(value, MODULE_FORMATS)?)
    }

    /// Resolve `value` against an arbitrary allowed set.
    pub fn get_parsed_ref(&self, value: &str, allowed: &[Format]) -> Result<ParsedRef> {
        tracing::debug!(
            value,
            allowed = %join_formats(allowed.iter().copied()),
            "resolving reference"
        );

        let mut raw_ref = raw::split(value)?;
        let ctx = InferenceContext {
            profile: self.profile,
            registry: &self.registry,
            fs: &self.fs,
            policy: self.policy,
            accepts_proto_file: self.registry.contains(Format::Protofile)
                && allowed.contains(&Format::Protofile),
        };
        infer(&mut raw_ref, &ctx)?;

        let format = raw_ref
            .format
            .ok_or_else(|| RefError::Internal(format!("no format after inference for {value:?}")))?;
        if !allowed.contains(&format) {
            return Err(RefError::FormatNotAllowed {
                format,
                kind: format.kind(),
                allowed: join_formats(allowed.iter().copied()),
            });
        }
        let descriptor = self
            .registry
            .get(format)
            .ok_or_else(|| RefError::FormatNotRegistered {
                format,
                kind: format.kind(),
                known: join_formats(self.registry.formats()),
            })?;

        let parsed = ParsedRef::from_raw(raw_ref, descriptor)?;
        if let Some(advisory) = check_deprecated(parsed.format()) {
            self.sink.advise(&advisory);
        }
        Ok(parsed)
    }
}

/// Configures a [`RefParser`].
#[derive(Debug, Clone)]
pub struct RefParserBuilder {
    kind: ParserKind,
    default_message_encoding: MessageEncoding,
    policy: ModuleOrDirPolicy,
    working_dir: Option<PathBuf>,
    probe: Arc<dyn FsProbe>,
    sink: Arc<dyn AdvisorySink>,
}

impl RefParserBuilder {
    pub fn new(kind: ParserKind) -> Self {
        Self {
            kind,
            default_message_encoding: MessageEncoding::default(),
            policy: ModuleOrDirPolicy::default(),
            working_dir: None,
            probe: Arc::new(OsFs),
            sink: Arc::new(TracingSink),
        }
    }

    /// Only used by message parsers.
    pub fn default_message_encoding(mut self, encoding: MessageEncoding) -> Self {
        self.default_message_encoding = encoding;
        self
    }

    pub fn module_or_dir(mut self, policy: ModuleOrDirPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Directory relative paths are probed against.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn fs_probe(mut self, probe: Arc<dyn FsProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn advisory_sink(mut self, sink: Arc<dyn AdvisorySink>) -> Self {
        self.sink = sink;
        self
    }

    /// Apply every setting of a loaded configuration.
    pub fn config(mut self, config: &ParserConfig) -> Self {
        self.default_message_encoding = config.default_message_encoding;
        self.policy = config.module_or_dir;
        if let Some(dir) = &config.working_dir {
            self.working_dir = Some(dir.clone());
        }
        self
    }

    pub fn build(self) -> RefParser {
        let (profile, registry) = match self.kind {
            ParserKind::Generic => (InferenceProfile::Generic, FormatRegistry::full()),
            ParserKind::Message => (
                InferenceProfile::Message {
                    default_encoding: self.default_message_encoding,
                },
                FormatRegistry::messages(),
            ),
            ParserKind::Source => (InferenceProfile::Source, FormatRegistry::sources()),
            ParserKind::Module => (InferenceProfile::Module, FormatRegistry::modules()),
            ParserKind::SourceOrModule => (
                InferenceProfile::SourceOrModule,
                FormatRegistry::sources_or_modules(),
            ),
        };
        RefParser {
            profile,
            registry,
            fs: FsContext::new(self.probe, self.working_dir),
            policy: self.policy,
            sink: self.sink,
        }
    }
}
