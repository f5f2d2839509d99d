//! `run`: the full reprovisioning run against a build archive.

use std::fmt::Write as _;

use tabled::Tabled;

use reprovision_core::{DiscoveredProfile, Pipeline, RunReport, SecurityCmsInspector};

use crate::cli::{GlobalOpts, RunArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util::{self, DeviceRow, InstalledRow, ReconciledRow};

#[derive(Tabled)]
struct DiscoveredRow {
    #[tabled(rename = "Profile")]
    name: String,
    #[tabled(rename = "iOS")]
    ios: String,
    #[tabled(rename = "Path")]
    path: String,
}

impl From<&DiscoveredProfile> for DiscoveredRow {
    fn from(p: &DiscoveredProfile) -> Self {
        Self {
            name: p.name.clone(),
            ios: if p.ios { "yes".into() } else { "no".into() },
            path: p.path.display().to_string(),
        }
    }
}

pub async fn handle(args: RunArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::resolve(global)?;
    let device = config::device(&cfg, &args.device)?;
    let archive = config::archive_path(&cfg, args.archive_path.as_ref())?;
    let store = util::profile_store(&args.target)?;

    let remote = config::connect(&cfg).await?;
    let pipeline = Pipeline::new(&remote, &SecurityCmsInspector, &store, config::run_options(&cfg));
    let report = pipeline.run(std::slice::from_ref(&device), &archive).await?;

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &report,
        |r| render_report(r, color),
        |r| {
            r.installed
                .iter()
                .map(|i| i.path.display().to_string())
                .collect::<Vec<_>>()
                .join("\n")
        },
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

/// One table per step, skipping empty steps.
fn render_report(report: &RunReport, color: bool) -> String {
    let mut out = String::new();
    let mut section = |title: &str, table: String| {
        if !out.is_empty() {
            out.push('\n');
        }
        let _ = writeln!(out, "{}", output::heading(title, color));
        out.push_str(&table);
        out.push('\n');
    };

    if !report.devices.is_empty() {
        let rows: Vec<DeviceRow> = report.devices.iter().map(|d| DeviceRow::new(d, color)).collect();
        section("Devices", output::render_table(&rows));
    }
    if report.discovered.is_empty() {
        section("Profiles", "No embedded provisioning profiles found.".into());
    } else {
        let rows: Vec<DiscoveredRow> = report.discovered.iter().map(DiscoveredRow::from).collect();
        section("Profiles", output::render_table(&rows));
    }
    if !report.reconciled.is_empty() {
        let rows: Vec<ReconciledRow> = report.reconciled.iter().map(ReconciledRow::from).collect();
        section("Reconciled", output::render_table(&rows));
    }
    if !report.installed.is_empty() {
        let rows: Vec<InstalledRow> = report.installed.iter().map(InstalledRow::from).collect();
        section("Installed", output::render_table(&rows));
    }

    out.trim_end().to_owned()
}
