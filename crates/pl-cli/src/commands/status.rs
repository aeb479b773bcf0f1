//! Status command implementation

use anyhow::Result;
use chrono::{DateTime, Utc};
use pl_core::PatchKind;
use pl_engine::MigrationPlan;
use serde::Serialize;

use crate::cli::{GlobalArgs, StatusArgs, StatusOutput};
use crate::commands::common::{
    build_runner, fail_migrate, load_project, print_table, resolve_database,
};

/// JSON shape of `pl status --output json`
#[derive(Debug, Serialize)]
struct StatusReport {
    project: String,
    database: String,
    current_level: u64,
    latest_version: u64,
    up_to_date: bool,
    pending: Vec<PendingPatch>,
    checked_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct PendingPatch {
    version: u64,
    name: String,
    kind: PatchKind,
}

impl StatusReport {
    fn new(project: &str, database: &str, plan: &MigrationPlan) -> Self {
        Self {
            project: project.to_string(),
            database: database.to_string(),
            current_level: plan.current_level,
            latest_version: plan.latest_version,
            up_to_date: plan.is_up_to_date(),
            pending: plan
                .pending
                .iter()
                .map(|p| PendingPatch {
                    version: p.version,
                    name: p.name.to_string(),
                    kind: p.kind(),
                })
                .collect(),
            checked_at: Utc::now(),
        }
    }
}

/// Execute the status command
pub fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let database = resolve_database(&project, global)?;
    let runner = build_runner(&project, &database)?;

    let plan = runner.plan().map_err(fail_migrate)?;
    let report = StatusReport::new(&project.config.name, &database.display_location(), &plan);

    match args.output {
        StatusOutput::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        StatusOutput::Table => print_report(&report),
    }
    Ok(())
}

fn print_report(report: &StatusReport) {
    println!("Project:       {}", report.project);
    println!("Database:      {}", report.database);
    println!("Current level: {}", report.current_level);
    println!("Latest patch:  {}", report.latest_version);
    println!();

    if report.up_to_date {
        println!("Up to date.");
        return;
    }

    let rows: Vec<Vec<String>> = report
        .pending
        .iter()
        .map(|p| vec![p.version.to_string(), p.name.clone(), p.kind.to_string()])
        .collect();
    println!("{} pending:\n", rows.len());
    print_table(&["VERSION", "NAME", "KIND"], &rows);
}
