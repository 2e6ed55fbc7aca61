//! The Intent Record: a human-authored, scoped, time-limited authorization
//! document required before any mutating command is permitted.
//!
//! Two surface syntaxes are accepted by one entry point, auto-detected by
//! whether the document opens with a front-matter delimiter:
//!
//! - **Front-matter form** (preferred, emitted by `intent-gate ir new`): a
//!   `---`-delimited key/value block followed by a free-form body.
//! - **Heading form**: a human-oriented document with `## Scope`,
//!   `## Allowed action classes`, `## Constraints`, and `## Signature`
//!   sections.
//!
//! Both normalize to the same [`IntentRecord`]. Fields that are not found
//! stay absent — defaulting is the decision engine's job, never the parser's.

use std::collections::BTreeSet;
use std::path::Path;

use regex::Regex;

use crate::error::RecordParseError;

/// The root directory and expiry window a record authorizes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    /// Directory tree the record authorizes. Must match the gate's sandbox
    /// root exactly.
    pub root: Option<String>,
    /// Expiry timestamp, kept verbatim; the engine parses and compares it.
    pub expires: Option<String>,
}

/// Additional limits a record imposes on top of the policy floor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Constraints {
    /// Files-touched limit; absent means the policy default applies.
    pub max_files: Option<u64>,
    /// Deny-globs unioned with (never replacing) the policy's defaults.
    pub deny_globs: Vec<String>,
}

/// A parsed Intent Record. Never mutated after parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntentRecord {
    /// Authorized root and expiry.
    pub scope: Scope,
    /// Record-level constraints.
    pub constraints: Constraints,
    /// Action classes the record explicitly permits.
    pub allowed_action_classes: BTreeSet<String>,
    /// Attestation string. Plain text, not cryptographically verified.
    pub signature: Option<String>,
    /// The full source document, kept for audit and debugging.
    pub raw_text: String,
}

impl IntentRecord {
    /// Read and parse the record at `path`.
    pub fn load(path: &Path) -> Result<Self, RecordParseError> {
        let text = std::fs::read_to_string(path).map_err(|source| RecordParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse a record from its document text, auto-detecting the syntax.
    pub fn parse(text: &str) -> Result<Self, RecordParseError> {
        if text.lines().next().map(str::trim) == Some("---") {
            parse_front_matter(text)
        } else {
            Ok(parse_headings(text))
        }
    }
}

/// Coerce a YAML scalar to a trimmed, non-empty string. Mappings and
/// sequences are never sensible field values and read as absent.
fn scalar_string(value: &serde_yaml::Value) -> Option<String> {
    let s = match value {
        serde_yaml::Value::String(s) => s.trim().to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

/// Coerce a YAML value to a list of strings: a bare string becomes a
/// one-element list, a sequence keeps its scalar items.
fn string_list(value: &serde_yaml::Value) -> Vec<String> {
    match value {
        serde_yaml::Value::Sequence(items) => items.iter().filter_map(scalar_string).collect(),
        other => scalar_string(other).into_iter().collect(),
    }
}

/// Coerce a YAML value to a files limit: an integer, or an integer-shaped
/// string. Anything else is absent and the policy default applies.
fn files_limit(value: &serde_yaml::Value) -> Option<u64> {
    match value {
        serde_yaml::Value::Number(n) => n.as_u64(),
        serde_yaml::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_front_matter(text: &str) -> Result<IntentRecord, RecordParseError> {
    let lines: Vec<&str> = text.lines().collect();
    let close = lines
        .iter()
        .skip(1)
        .position(|line| line.trim() == "---")
        .ok_or(RecordParseError::UnterminatedFrontMatter)?
        + 1;

    let fm_text = lines[1..close].join("\n");
    let fm: serde_yaml::Value = serde_yaml::from_str(&fm_text)?;
    let scope = fm.get("scope");
    let constraints = fm.get("constraints");
    let nested = |outer: Option<&serde_yaml::Value>, key: &str| {
        outer.and_then(|v| v.get(key).and_then(scalar_string))
    };

    let root = nested(scope, "root").or_else(|| fm.get("root").and_then(scalar_string));
    let expires = fm
        .get("expires_utc")
        .and_then(scalar_string)
        .or_else(|| nested(scope, "expires"))
        .or_else(|| fm.get("expires").and_then(scalar_string));

    let actions = fm
        .get("actions_allowed")
        .or_else(|| fm.get("actions"))
        .map(string_list)
        .unwrap_or_default();

    let signature = fm
        .get("signature")
        .and_then(scalar_string)
        .map(|s| s.trim_matches(['"', '\'']).to_string())
        .filter(|s| !s.is_empty());

    let deny_globs = constraints
        .and_then(|c| c.get("deny_globs"))
        .or_else(|| fm.get("deny_globs"))
        .map(string_list)
        .unwrap_or_default();

    let max_files = constraints
        .and_then(|c| c.get("max_files"))
        .or_else(|| fm.get("max_files"))
        .and_then(files_limit);

    Ok(IntentRecord {
        scope: Scope { root, expires },
        constraints: Constraints {
            max_files,
            deny_globs,
        },
        allowed_action_classes: actions.into_iter().collect(),
        signature,
        raw_text: text.to_string(),
    })
}

/// Find the first `key: value` line anywhere in the text.
fn key_line(text: &str, key: &str) -> Option<String> {
    let re = Regex::new(&format!(r"(?m)^\s*{key}\s*:\s*(.*)$")).ok()?;
    re.captures(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Collect `- item` lines inside the `## <header>` section, terminated by
/// the next `## ` heading.
fn list_after(text: &str, header: &str) -> Vec<String> {
    let Ok(header_re) = Regex::new(&format!(r"^\s*##\s+{}\s*$", regex::escape(header))) else {
        return Vec::new();
    };
    let Ok(item_re) = Regex::new(r"^\s*-\s+(.*?)\s*$") else {
        return Vec::new();
    };

    let mut items = Vec::new();
    let mut in_section = false;
    for line in text.lines() {
        if header_re.is_match(line) {
            in_section = true;
            continue;
        }
        if in_section {
            if line.trim_start().starts_with("## ") {
                break;
            }
            if let Some(caps) = item_re.captures(line) {
                items.push(caps[1].to_string());
            }
        }
    }
    items
}

/// Returns true if a constraints list item reads as a path glob rather than
/// a key/value limit.
fn looks_like_glob(item: &str) -> bool {
    item.contains(['*', '?', '/', '.'])
}

fn parse_headings(text: &str) -> IntentRecord {
    let mut deny_globs = Vec::new();
    let mut max_files = None;
    let limit_re = Regex::new(r"^max_files\s*:\s*(\d+)$").ok();
    for item in list_after(text, "Constraints") {
        if looks_like_glob(&item) {
            deny_globs.push(item);
        } else if let Some(caps) = limit_re.as_ref().and_then(|re| re.captures(&item)) {
            max_files = caps[1].parse().ok();
        }
    }

    IntentRecord {
        scope: Scope {
            root: key_line(text, "root"),
            expires: key_line(text, "expires"),
        },
        constraints: Constraints {
            max_files,
            deny_globs,
        },
        allowed_action_classes: list_after(text, "Allowed action classes")
            .into_iter()
            .collect(),
        signature: key_line(text, "signature"),
        raw_text: text.to_string(),
    }
}
