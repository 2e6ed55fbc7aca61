//! Core library for the intent-gate refusal boundary.
//!
//! A deterministic, default-deny authorization gate sits between an agent and
//! the filesystem-mutating commands it proposes: read-only commands pass,
//! mutating commands need a validated Intent Record, everything else is
//! refused. This crate holds the hard core — the document formats, the
//! path-safety resolver, and the decision engine — while the `intent-gate`
//! binary supplies the thin CLI, audit, and execution plumbing around it.
//!
//! This is explicitly not a sandbox: nothing here prevents an allowed command
//! from doing anything once it runs, and the record's "signature" is a plain
//! attestation string, not cryptography.
//!
//! # Modules
//!
//! - [`policy`] — the policy document: command classification lists, the
//!   deny-glob floor, the default files-touched limit.
//! - [`record`] — the Intent Record model and its dual-syntax parser.
//! - [`author`] — rendering new Intent Records.
//! - [`path`] — symlink-aware path resolution and sandbox containment.
//! - [`glob`] — deny-glob matching.
//! - [`decision`] — the state-free decision engine.
//! - [`error`] — error types shared by the above.
//!
//! # Example
//!
//! ```
//! use intent_record::decision::decide;
//! use intent_record::policy::Policy;
//!
//! let policy: Policy =
//!     serde_yaml::from_str("read_only_commands: [ls]").expect("static policy");
//! let decision = decide(&["ls".into()], &policy, None, std::path::Path::new("/tmp"));
//! assert!(decision.allowed);
//! ```

pub mod author;
pub mod decision;
pub mod error;
pub mod glob;
pub mod path;
pub mod policy;
pub mod record;

pub use decision::{Decision, Reason, decide};
pub use policy::Policy;
pub use record::IntentRecord;
