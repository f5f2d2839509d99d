//! `reconcile`: rebuild named profiles so they include every eligible device.

use reprovision_core::{ProfileReconciler, ReconcileSummary};

use crate::cli::{GlobalOpts, ReconcileArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util::{self, ReconciledRow};

pub async fn handle(args: ReconcileArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::resolve(global)?;
    let names = util::dedup_names(args.profiles)?;
    let options = config::run_options(&cfg);

    let remote = config::connect(&cfg).await?;
    let reconciler = ProfileReconciler::new(&remote)
        .with_certificate_page_limit(options.certificate_page_limit)
        .with_device_page_limit(options.device_page_limit);

    let mut summaries = Vec::with_capacity(names.len());
    for name in &names {
        let outcome = reconciler.reconcile(name).await?;
        summaries.push(ReconcileSummary::from(&outcome));
    }

    let out = output::render_list(
        &global.output,
        &summaries,
        |s| ReconciledRow::from(s),
        |s| s.uuid.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
