//! `rmmsync sync` — run the full reconciliation pipeline.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use rmmsync_api::HttpApi;
use rmmsync_core::Toggles;
use rmmsync_engine::{pipeline, RunReport};
use rmmsync_git::PushOutcome;

use super::{load_config, print_disabled_toggles, run_preflight};

/// Arguments for `rmmsync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Compare everything but mutate nothing: no pull, no writeback, no
    /// file writes, no push.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Tabled)]
struct ShellRow {
    #[tabled(rename = "shell")]
    shell: String,
    #[tabled(rename = "exported")]
    count: usize,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let mut config = load_config()?;
        if self.dry_run {
            println!("[dry-run] all mutating steps disabled for this run");
            config.toggles = Toggles::dry_run();
        }
        print_disabled_toggles(&config);

        let api = HttpApi::new(&config.api_base, &config.api_token);
        run_preflight(&config, &api)?;

        let report = pipeline::run(&config, &api).context("sync pipeline failed")?;
        print_report(&report, self.dry_run);
        Ok(())
    }
}

fn print_report(report: &RunReport, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    println!("\n===== Run Summary =====");
    println!("Run started: {}", report.started_at.to_rfc3339());

    let wb = &report.writeback;
    println!(
        "{prefix}Writeback: {} checked, {} matched, {} mismatched, {} updated, {} skipped",
        wb.checked, wb.matched, wb.mismatched, wb.updated, wb.skipped
    );

    println!("{prefix}Exported {} files from the API", report.exported);
    if !report.shell_summary.is_empty() {
        let rows: Vec<ShellRow> = report
            .shell_summary
            .iter()
            .map(|(shell, count)| ShellRow {
                shell: shell.clone(),
                count: *count,
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }

    for note in &report.skipped_records {
        println!("{} skipped: {note}", "!".yellow());
    }

    if report.prune_skipped {
        println!(
            "{} prune skipped: the API returned no records",
            "!".yellow()
        );
    } else {
        println!("{prefix}Pruned {} obsolete file(s)", report.pruned_files());
    }

    match (&report.push, &report.push_error) {
        (Some(PushOutcome::Pushed { message }), _) => {
            println!("{} pushed: {message}", "✓".green());
        }
        (Some(PushOutcome::NothingToCommit), _) => {
            println!("{} nothing to commit", "·".normal());
        }
        (None, Some(error)) => println!("{} push failed: {error}", "✗".red()),
        (None, None) => {}
    }
    println!("===== End of Run =====");
}
