//! The `run` subcommand: decide on one command and, unless denied or
//! dry-run, execute it in the sandbox root.

use tracing::{Level, instrument};

use crate::cli::RunArgs;
use crate::pipeline::Gate;

/// Exit code for a denied command.
pub const EXIT_DENIED: i32 = 2;

/// The literal command conventionally follows a "--" separator; drop it if
/// the argument parser left it in place.
pub fn strip_separator(command: &[String]) -> &[String] {
    match command.first().map(String::as_str) {
        Some("--") => &command[1..],
        _ => command,
    }
}

/// Decide and optionally execute; returns the process exit code.
#[instrument(level = Level::TRACE, skip(args))]
pub fn run(args: RunArgs) -> anyhow::Result<i32> {
    let gate = Gate::load(
        &args.policy,
        args.intent.as_deref(),
        &args.sandbox,
        &args.audit,
    )?;

    let command = strip_separator(&args.command);

    let dry_run = args.dry_run || args.print_decision;
    let decision = gate.decide(command, dry_run);

    if args.print_decision || args.dry_run {
        println!("{}", decision.reason_line());
        println!("cmd: {}", decision.normalized_command);
        if decision.files_touched > 0 {
            println!("files_touched_est: {}", decision.files_touched);
        }
        return Ok(if decision.allowed { 0 } else { EXIT_DENIED });
    }

    if !decision.allowed {
        eprintln!("{}", decision.reason_line());
        eprintln!("cmd: {}", decision.normalized_command);
        return Ok(EXIT_DENIED);
    }

    let outcome = gate.execute(command, &decision)?;
    print!("{}", outcome.stdout);
    eprint!("{}", outcome.stderr);
    Ok(outcome.returncode)
}
