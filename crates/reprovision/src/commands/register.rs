//! `register`: ensure the test device exists on the portal.

use reprovision_core::{DeviceRegistrar, DeviceReport};

use crate::cli::{DeviceArgs, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util::DeviceRow;

pub async fn handle(args: DeviceArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::resolve(global)?;
    let device = config::device(&cfg, &args)?;
    let options = config::run_options(&cfg);

    let remote = config::connect(&cfg).await?;
    let registrar = DeviceRegistrar::new(&remote)
        .with_page_limit(options.device_page_limit)
        .with_udid_filter(options.udid_filter);

    let registration = registrar.register_if_absent(&device).await?;
    let reports = vec![DeviceReport {
        name: device.name,
        udid: device.udid.to_string(),
        registration,
    }];

    let color = output::should_color(&global.color);
    let out = output::render_list(
        &global.output,
        &reports,
        |r| DeviceRow::new(r, color),
        |r| r.udid.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
