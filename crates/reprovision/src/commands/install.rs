//! `install`: download named profiles into the local profiles directory.

use reprovision_core::{Pipeline, SecurityCmsInspector};

use crate::cli::{GlobalOpts, InstallArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util::{self, InstalledRow};

pub async fn handle(args: InstallArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::resolve(global)?;
    let names = util::dedup_names(args.profiles)?;
    let store = util::profile_store(&args.target)?;

    let remote = config::connect(&cfg).await?;
    let pipeline = Pipeline::new(&remote, &SecurityCmsInspector, &store, config::run_options(&cfg));
    let installed = pipeline.install_profiles(&names).await?;

    let out = output::render_list(
        &global.output,
        &installed,
        |i| InstalledRow::from(i),
        |i| i.path.display().to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
