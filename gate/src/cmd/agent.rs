//! The `agent` subcommand: a deliberately tiny task driver.
//!
//! Not an LLM — a deterministic task-to-command mapper that demonstrates the
//! workflow where autonomy is constrained by explicit intent. Every planned
//! step gets a visible dry-run decision first; execution only happens with
//! `--execute` and an allow; and the remaining plan is aborted the moment any
//! step is denied, since later steps may depend on earlier steps' effects.

use anyhow::bail;
use tracing::{Level, instrument};

use intent_record::decision::normalize_command;

use crate::cli::AgentArgs;
use crate::cmd::run::EXIT_DENIED;
use crate::pipeline::Gate;

/// Split a task string into tokens, honoring single and double quotes.
fn split_task(task: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut seen_any = false;

    for c in task.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '\'' || c == '"' => {
                quote = Some(c);
                seen_any = true;
            }
            None if c.is_whitespace() => {
                if seen_any {
                    tokens.push(std::mem::take(&mut current));
                    seen_any = false;
                }
            }
            None => {
                current.push(c);
                seen_any = true;
            }
        }
    }
    if seen_any {
        tokens.push(current);
    }
    tokens
}

/// Map a task to a sequence of exactly one gate-mediated command per step.
pub fn build_plan(task: &str) -> anyhow::Result<Vec<Vec<String>>> {
    let tokens = split_task(task);
    let Some((op, rest)) = tokens.split_first() else {
        bail!("empty task");
    };

    match (op.to_lowercase().as_str(), rest) {
        ("delete", [path]) => Ok(vec![vec!["rm".into(), path.clone()]]),
        ("rename", [src, dst]) => Ok(vec![vec!["mv".into(), src.clone(), dst.clone()]]),
        ("copy", [src, dst]) => Ok(vec![vec!["cp".into(), src.clone(), dst.clone()]]),
        _ => bail!(
            "unsupported task; try:\n  delete <path>\n  rename <src> <dst>\n  copy <src> <dst>"
        ),
    }
}

/// Plan, decide, and (optionally) execute; returns the process exit code.
#[instrument(level = Level::TRACE, skip(args))]
pub fn run(args: AgentArgs) -> anyhow::Result<i32> {
    let plan = build_plan(&args.task)?;

    println!("PLAN:");
    for (i, step) in plan.iter().enumerate() {
        println!("  {}. {}", i + 1, normalize_command(step));
    }
    println!();

    let gate = Gate::load(
        &args.policy,
        args.intent.as_deref(),
        &args.sandbox,
        &args.audit,
    )?;

    let mut exit_code = 0;
    for step in &plan {
        // Always a visible dry-run decision first.
        let decision = gate.decide(step, true);
        println!("{}", decision.reason_line());
        println!("cmd: {}", decision.normalized_command);

        if !decision.allowed {
            // A denied step aborts the rest of the plan: later steps may
            // depend on this one's filesystem effects.
            exit_code = EXIT_DENIED;
            break;
        }

        if !args.execute {
            continue;
        }

        // The execution pass is decided (and audited) again with the real
        // dry_run flag; identical inputs yield the identical verdict.
        let decision = gate.decide(step, false);
        if !decision.allowed {
            exit_code = EXIT_DENIED;
            break;
        }
        let outcome = gate.execute(step, &decision)?;
        print!("{}", outcome.stdout);
        eprint!("{}", outcome.stderr);
        if exit_code == 0 {
            exit_code = outcome.returncode;
        }
    }

    Ok(exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_task_plain() {
        assert_eq!(split_task("delete foo.txt"), vec!["delete", "foo.txt"]);
    }

    #[test]
    fn test_split_task_quoted() {
        assert_eq!(
            split_task("delete 'my file.txt'"),
            vec!["delete", "my file.txt"]
        );
        assert_eq!(
            split_task("rename \"a b\" c"),
            vec!["rename", "a b", "c"]
        );
    }

    #[test]
    fn test_build_plan_delete() {
        let plan = build_plan("delete foo.txt").unwrap();
        assert_eq!(plan, vec![vec!["rm".to_string(), "foo.txt".to_string()]]);
    }

    #[test]
    fn test_build_plan_rename_and_copy() {
        assert_eq!(
            build_plan("rename a.txt b.txt").unwrap(),
            vec![vec!["mv".to_string(), "a.txt".to_string(), "b.txt".to_string()]]
        );
        assert_eq!(
            build_plan("copy a.txt b.txt").unwrap(),
            vec![vec!["cp".to_string(), "a.txt".to_string(), "b.txt".to_string()]]
        );
    }

    #[test]
    fn test_build_plan_rejects_unsupported() {
        assert!(build_plan("").is_err());
        assert!(build_plan("delete").is_err());
        assert!(build_plan("delete a b").is_err());
        assert!(build_plan("chown a").is_err());
    }
}
