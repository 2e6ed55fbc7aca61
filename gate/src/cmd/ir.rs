//! The `ir` subcommand: author new Intent Records.

use chrono::Utc;
use tracing::{Level, instrument};

use intent_record::author;
use intent_record::decision::ActionClass;
use intent_record::path::canonicalize_lenient;

use crate::cli::IrCmd;

/// Handle an `ir` subcommand; returns the process exit code.
#[instrument(level = Level::TRACE, skip(cmd))]
pub fn run(cmd: IrCmd) -> anyhow::Result<i32> {
    match cmd {
        IrCmd::New {
            root,
            actions,
            signed_by,
            note,
            expires_hours,
            dir,
            print,
        } => {
            let unknown: Vec<&String> = actions
                .iter()
                .filter(|a| {
                    !ActionClass::AUTHORABLE
                        .iter()
                        .any(|c| c.as_str() == a.as_str())
                })
                .collect();
            if !unknown.is_empty() {
                let valid: Vec<&str> =
                    ActionClass::AUTHORABLE.iter().map(|c| c.as_str()).collect();
                eprintln!("ERROR: unknown actions: {unknown:?}");
                eprintln!("Valid actions: {}", valid.join(", "));
                return Ok(2);
            }

            let root = canonicalize_lenient(&root);
            let now = Utc::now();
            let content = author::render(
                &root,
                &actions,
                &signed_by,
                &note,
                Some(expires_hours),
                now,
            );

            if print {
                println!("{content}");
                return Ok(0);
            }

            std::fs::create_dir_all(&dir)?;
            let out_path = dir.join(author::default_record_name(now));
            std::fs::write(&out_path, &content)?;
            println!("{}", out_path.display());
            Ok(0)
        }
    }
}
