//! Migrate command implementation

use anyhow::Result;
use pl_core::{Launcher, Patch};
use pl_engine::{AppliedPatch, MigrateError, MigrationPlan, RunFailure, RunObserver, RunReport, RunStatus};

use crate::cli::{GlobalArgs, MigrateArgs};
use crate::commands::common::{
    build_runner, exit_code_for, fail_migrate, format_duration, load_project, resolve_database,
    ExitCode,
};

/// Prints one line per patch as the run progresses.
struct ProgressPrinter;

impl RunObserver for ProgressPrinter {
    fn on_patch_applied(&self, applied: &AppliedPatch) {
        println!("  ✓ {} ({})", applied.name, format_duration(applied.duration));
    }

    fn on_patch_failed(&self, patch: &Patch, error: &MigrateError) {
        println!("  ✗ {} - {}", patch.name, error);
    }
}

/// Execute the migrate command
pub fn execute(args: &MigrateArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let database = resolve_database(&project, global)?;
    let runner = build_runner(&project, &database)?
        .with_target_version(args.to)
        .with_observer(ProgressPrinter);

    let plan_only = args.dry_run || project.config.launcher == Launcher::Plan;
    println!(
        "{} {} ({})\n",
        if plan_only { "Planning" } else { "Migrating" },
        project.config.name,
        database.display_location()
    );

    if plan_only {
        let plan = runner.plan().map_err(fail_migrate)?;
        print_plan(&plan);
        return Ok(());
    }

    match runner.run() {
        Ok(report) => {
            print_summary(&report);
            Ok(())
        }
        Err(failure) => {
            print_failure(&failure);
            Err(ExitCode(exit_code_for(&failure.error)).into())
        }
    }
}

fn print_plan(plan: &MigrationPlan) {
    if plan.is_up_to_date() {
        println!("Already at level {}; nothing to apply.", plan.current_level);
        return;
    }
    println!(
        "Would apply {} patches (level {} → {}):",
        plan.pending.len(),
        plan.current_level,
        plan.pending.last().map_or(plan.current_level, |p| p.version)
    );
    for patch in &plan.pending {
        println!("  • {} ({})", patch.name, patch.kind());
    }
}

fn print_summary(report: &RunReport) {
    match report.status {
        RunStatus::UpToDate => {
            println!("Already at level {}; nothing to apply.", report.final_level);
        }
        RunStatus::Done => {
            println!();
            println!(
                "Applied {} patches in {} (level {} → {})",
                report.applied.len(),
                format_duration(report.total_duration()),
                report.starting_level,
                report.final_level
            );
        }
        RunStatus::Cancelled => {
            println!();
            println!(
                "Cancelled after {} patches; level is {}",
                report.applied.len(),
                report.final_level
            );
        }
    }
}

fn print_failure(failure: &RunFailure) {
    match &failure.failed {
        // The observer already printed the patch error
        Some(patch) => {
            println!();
            println!(
                "Stopped at {}; applied {} patches, level is {}",
                patch,
                failure.report.applied.len(),
                failure.report.final_level
            );
        }
        None => eprintln!("Error: {}", failure.error),
    }
    if let MigrateError::LedgerWrite { version, .. } = &failure.error {
        eprintln!(
            "Warning: patch v{} may be applied without being recorded. \
             Check the database before running again.",
            version
        );
    }
}
