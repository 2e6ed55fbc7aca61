//! Unified error types for policy loading, record parsing, and path safety.

use std::path::PathBuf;

/// Error loading the policy document. Fatal: the gate refuses to make any
/// decision without a well-formed policy.
#[derive(Debug, thiserror::Error)]
pub enum PolicyLoadError {
    #[error("failed to read policy file '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse policy file '{path}'")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Error parsing an Intent Record document.
///
/// Not fatal on its own: a malformed record only matters once a mutating
/// command actually requires one, at which point the absence denies.
#[derive(Debug, thiserror::Error)]
pub enum RecordParseError {
    #[error("failed to read intent record '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("intent record front matter is missing its closing '---'")]
    UnterminatedFrontMatter,

    #[error("invalid intent record front matter: {0}")]
    FrontMatter(#[from] serde_yaml::Error),
}

impl RecordParseError {
    /// Return a help message suggesting how to fix this error, if applicable.
    pub fn help(&self) -> Option<String> {
        match self {
            RecordParseError::UnterminatedFrontMatter => Some(
                "a front-matter record must open and close with a line containing only '---'"
                    .into(),
            ),
            RecordParseError::FrontMatter(_) => Some(
                "the block between the '---' delimiters must be valid key: value content".into(),
            ),
            RecordParseError::Io { .. } => None,
        }
    }
}

/// Which containment check tripped for an [`PathError::EscapesSandbox`] failure.
///
/// One unified escape kind carries this context so callers can reproduce
/// either canonical message family without a deeper semantic split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainmentCheck {
    /// The escape is visible as `..` traversal: written in the argument
    /// itself, or present in the target text of a symlink crossed during
    /// resolution. Rendered "escapes sandbox root".
    Lexical,
    /// The argument looks sandbox-internal but its fully resolved real path
    /// lands outside, via an absolute-target symlink. Rendered "resolves
    /// outside sandbox root".
    RealPath,
}

impl ContainmentCheck {
    /// The stable phrase downstream tooling greps for.
    pub fn phrase(&self) -> &'static str {
        match self {
            ContainmentCheck::Lexical => "escapes sandbox root",
            ContainmentCheck::RealPath => "resolves outside sandbox root",
        }
    }
}

/// A path argument failed the sandbox-safety checks.
///
/// Each variant maps to a distinct, stable reason substring so downstream
/// tooling can assert on cause.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("absolute paths are not allowed (must be relative to sandbox root)")]
    AbsolutePath { arg: String },

    #[error("do not prefix paths with '{prefix}/' (cwd is already sandbox root); use relative paths")]
    DoubleSandboxPrefix { arg: String, prefix: String },

    #[error("dangerous target '{arg}' not allowed")]
    DangerousTarget { arg: String },

    #[error("path '{arg}' {}", .check.phrase())]
    EscapesSandbox { arg: String, check: ContainmentCheck },

    #[error("too many levels of symbolic links while resolving '{arg}'")]
    TooManyLinks { arg: String },
}
