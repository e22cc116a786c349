//! Git repository references.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{RefError, Result};
use crate::raw::RawOptions;

/// Clone depth used when `ref=` is given without `depth=`.
pub const DEFAULT_REF_DEPTH: u32 = 50;
/// Clone depth used otherwise.
pub const DEFAULT_DEPTH: u32 = 1;

/// How a git repository is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GitTransport {
    Http,
    Https,
    Ssh,
    Git,
    File,
    /// A filesystem path without a URL scheme.
    Local,
}

impl GitTransport {
    /// Classify a git path.
    ///
    /// Handles:
    /// - `https://github.com/org/repo.git` and the other URL schemes
    /// - `git@github.com:org/repo.git` (scp-like ssh)
    /// - `path/to/repo.git` (local)
    pub fn classify(path: &str) -> Result<Self> {
        if is_scp_like(path) {
            return Ok(GitTransport::Ssh);
        }

        let url = match Url::parse(path) {
            Ok(url) => url,
            Err(_) => return Ok(GitTransport::Local),
        };

        // Windows drive letters parse as one-letter schemes.
        if url.scheme().len() == 1 {
            return Ok(GitTransport::Local);
        }

        match url.scheme() {
            "http" => Ok(GitTransport::Http),
            "https" => Ok(GitTransport::Https),
            "ssh" => Ok(GitTransport::Ssh),
            "git" => Ok(GitTransport::Git),
            "file" => Ok(GitTransport::File),
            other => Err(RefError::InvalidGitPath {
                path: path.to_string(),
                reason: format!("unsupported scheme {other:?}"),
            }),
        }
    }
}

fn is_scp_like(path: &str) -> bool {
    let Some((host_part, _)) = path.split_once(':') else {
        return false;
    };
    host_part.contains('@') && !host_part.contains('/')
}

/// Which commit of the repository to check out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum GitRefName {
    Branch(String),
    Tag(String),
    /// Any revision git understands, optionally constrained to a branch.
    Ref {
        name: String,
        branch: Option<String>,
    },
}

/// A git repository to fetch, with the branch, tag or ref to check out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitRef {
    /// Repository URL or local path
    pub path: String,
    pub transport: GitTransport,
    /// `None` means the default branch
    pub name: Option<GitRefName>,
    pub depth: u32,
    pub recurse_submodules: bool,
    /// Subdirectory within the repository
    pub subdir: Option<String>,
}

impl GitRef {
    /// Create a GitRef for the default branch.
    pub fn new(path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let transport = GitTransport::classify(&path)?;
        Ok(Self {
            path,
            transport,
            name: None,
            depth: DEFAULT_DEPTH,
            recurse_submodules: false,
            subdir: None,
        })
    }

    pub fn with_name(mut self, name: GitRefName) -> Self {
        if matches!(name, GitRefName::Ref { .. }) && self.depth == DEFAULT_DEPTH {
            self.depth = DEFAULT_REF_DEPTH;
        }
        self.name = Some(name);
        self
    }

    pub fn with_subdir(mut self, subdir: impl Into<String>) -> Self {
        self.subdir = Some(subdir.into());
        self
    }

    /// Build a GitRef from a path and its split options.
    ///
    /// `branch` and `tag` are mutually exclusive, as are `tag` and `ref`.
    pub fn from_options(path: &str, options: &RawOptions) -> Result<Self> {
        if options.branch.is_some() && options.tag.is_some() {
            return Err(RefError::ConflictingOptions {
                first: "branch",
                second: "tag",
            });
        }
        if options.tag.is_some() && options.git_ref.is_some() {
            return Err(RefError::ConflictingOptions {
                first: "tag",
                second: "ref",
            });
        }

        let name = match (&options.branch, &options.tag, &options.git_ref) {
            (branch, _, Some(name)) => Some(GitRefName::Ref {
                name: name.clone(),
                branch: branch.clone(),
            }),
            (Some(branch), _, None) => Some(GitRefName::Branch(branch.clone())),
            (None, Some(tag), None) => Some(GitRefName::Tag(tag.clone())),
            (None, None, None) => None,
        };

        let default_depth = if options.git_ref.is_some() {
            DEFAULT_REF_DEPTH
        } else {
            DEFAULT_DEPTH
        };

        Ok(Self {
            path: path.to_string(),
            transport: GitTransport::classify(path)?,
            name,
            depth: options.depth.unwrap_or(default_depth),
            recurse_submodules: options.recurse_submodules.unwrap_or(false),
            subdir: options.subdir.clone(),
        })
    }
}
