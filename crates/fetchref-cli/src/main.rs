//! fetchref - reference resolver
//!
//! Usage:
//!   fetchref resolve ./proto                      # any reference
//!   fetchref resolve image.json.gz --as message   # single message
//!   fetchref resolve buf.build/acme/weather --as module --output json

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fetchref_core::{
    ArchiveRef, GitRef, GitRefName, MessageEncoding, MessageRef, ModuleOrDirPolicy, ModuleRef,
    ParserConfig, ParserKind, ProtoFileRef, Ref, RefParser, SourceOrModuleRef, SourceRef,
};

#[derive(Parser)]
#[command(name = "fetchref")]
#[command(about = "Resolve source, module and message references", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a reference string and print what it points at
    Resolve {
        /// Reference, e.g. `proto.tar.gz#subdir=api`
        value: String,

        /// Which kind of reference is expected
        #[arg(long = "as", value_enum, default_value = "ref")]
        expect: Expect,

        /// Encoding of `-` and extensionless paths when resolving messages
        #[arg(long, value_enum)]
        default_encoding: Option<EncodingArg>,

        /// How to classify paths that could be modules or directories
        #[arg(long, value_enum)]
        module_or_dir: Option<PolicyArg>,

        /// Config file (defaults to the user config dir)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        output: OutputFormat,
    },

    /// Print the effective configuration
    Config {
        /// Config file (defaults to the user config dir)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Expect {
    /// Any reference
    Ref,
    /// A source or a module
    SourceOrModule,
    /// A single encoded message
    Message,
    /// An archive, git repository or directory
    Source,
    /// A module coordinate
    Module,
}

#[derive(Clone, Copy, ValueEnum)]
enum EncodingArg {
    Binpb,
    Json,
    Txtpb,
    Yaml,
}

impl From<EncodingArg> for MessageEncoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Binpb => MessageEncoding::Binpb,
            EncodingArg::Json => MessageEncoding::Json,
            EncodingArg::Txtpb => MessageEncoding::Txtpb,
            EncodingArg::Yaml => MessageEncoding::Yaml,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Probe,
    Dir,
    Module,
}

impl From<PolicyArg> for ModuleOrDirPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Probe => ModuleOrDirPolicy::Probe,
            PolicyArg::Dir => ModuleOrDirPolicy::Dir,
            PolicyArg::Module => ModuleOrDirPolicy::Module,
        }
    }
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fetchref=info,fetchref_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve {
            value,
            expect,
            default_encoding,
            module_or_dir,
            config,
            output,
        } => {
            let mut config = ParserConfig::load_or_default(config.as_deref())?;
            if let Some(encoding) = default_encoding {
                config.default_message_encoding = encoding.into();
            }
            if let Some(policy) = module_or_dir {
                config.module_or_dir = policy.into();
            }
            run_resolve(&value, expect, &config, output)?;
        }
        Commands::Config { config } => {
            let config = ParserConfig::load_or_default(config.as_deref())?;
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}

fn parser_kind(expect: Expect) -> ParserKind {
    match expect {
        Expect::Ref => ParserKind::Generic,
        Expect::SourceOrModule => ParserKind::SourceOrModule,
        Expect::Message => ParserKind::Message,
        Expect::Source => ParserKind::Source,
        Expect::Module => ParserKind::Module,
    }
}

fn run_resolve(
    value: &str,
    expect: Expect,
    config: &ParserConfig,
    output: OutputFormat,
) -> Result<()> {
    let parser = RefParser::builder(parser_kind(expect)).config(config).build();

    let resolved = match expect {
        Expect::Ref => parser.get_ref(value)?,
        Expect::SourceOrModule => match parser.get_source_or_module_ref(value)? {
            SourceOrModuleRef::Source(source) => Ref::Source(source),
            SourceOrModuleRef::Module(module) => Ref::Module(module),
            SourceOrModuleRef::ProtoFile(proto_file) => Ref::ProtoFile(proto_file),
        },
        Expect::Message => Ref::Message(parser.get_message_ref(value)?),
        Expect::Source => Ref::Source(parser.get_source_ref(value)?),
        Expect::Module => Ref::Module(parser.get_module_ref(value)?),
    };

    match output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&resolved)
                .context("Failed to serialize reference")?;
            println!("{json}");
        }
        OutputFormat::Table => print_table(&resolved),
    }
    Ok(())
}

fn print_table(resolved: &Ref) {
    match resolved {
        Ref::Message(message) => print_message(message),
        Ref::Source(SourceRef::Archive(archive)) => print_archive(archive),
        Ref::Source(SourceRef::Dir(dir)) => {
            print_row("kind", "directory");
            print_row("path", &dir.path);
        }
        Ref::Source(SourceRef::Git(git)) => print_git(git),
        Ref::Module(module) => print_module(module),
        Ref::ProtoFile(proto_file) => print_proto_file(proto_file),
    }
}

fn print_row(key: &str, value: &str) {
    println!("{:<22} {}", key, value);
}

fn print_message(message: &MessageRef) {
    print_row("kind", "message");
    print_row("path", message.path());
    print_row("format", message.single.format.as_str());
    print_row("encoding", &message.encoding.to_string());
    print_row("compression", message.compression().as_str());
    if message.use_proto_names() {
        print_row("use_proto_names", "true");
    }
    if message.use_enum_numbers() {
        print_row("use_enum_numbers", "true");
    }
}

fn print_archive(archive: &ArchiveRef) {
    print_row("kind", "archive");
    print_row("path", &archive.path);
    print_row("format", archive.format.as_str());
    print_row("compression", archive.compression.as_str());
    if let Some(subdir) = &archive.subdir {
        print_row("subdir", subdir);
    }
    if archive.strip_components > 0 {
        print_row("strip_components", &archive.strip_components.to_string());
    }
}

fn print_git(git: &GitRef) {
    print_row("kind", "git");
    print_row("path", &git.path);
    print_row("transport", &format!("{:?}", git.transport).to_lowercase());
    match &git.name {
        Some(GitRefName::Branch(branch)) => print_row("branch", branch),
        Some(GitRefName::Tag(tag)) => print_row("tag", tag),
        Some(GitRefName::Ref { name, branch }) => {
            print_row("ref", name);
            if let Some(branch) = branch {
                print_row("branch", branch);
            }
        }
        None => print_row("branch", "(default)"),
    }
    print_row("depth", &git.depth.to_string());
    if git.recurse_submodules {
        print_row("recurse_submodules", "true");
    }
    if let Some(subdir) = &git.subdir {
        print_row("subdir", subdir);
    }
}

fn print_module(module: &ModuleRef) {
    let coordinate = &module.coordinate;
    print_row("kind", "module");
    print_row("remote", &coordinate.remote);
    print_row("owner", &coordinate.owner);
    print_row("repository", &coordinate.repository);
    if let Some(reference) = &coordinate.reference {
        print_row("reference", reference);
    }
}

fn print_proto_file(proto_file: &ProtoFileRef) {
    print_row("kind", "proto file");
    print_row("path", &proto_file.path);
    if proto_file.include_package_files {
        print_row("include_package_files", "true");
    }
}
