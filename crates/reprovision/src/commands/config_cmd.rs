//! Config subcommand handlers.

use std::path::PathBuf;

use dialoguer::{Input, Password, Select};

use reprovision_config::{ApiSettings, DeviceSettings, store_private_key};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking sensitive fields.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref archive) = cfg.archive_path {
        let _ = writeln!(out, "archive_path = \"{}\"", archive.display());
        let _ = writeln!(out);
    }
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "page_size = {}", cfg.defaults.page_size);
    let _ = writeln!(out, "certificate_page_size = {}", cfg.defaults.certificate_page_size);
    let _ = writeln!(out, "udid_filter = {}", cfg.defaults.udid_filter);

    let _ = writeln!(out);
    let _ = writeln!(out, "[api]");
    if let Some(ref v) = cfg.api.key_id {
        let _ = writeln!(out, "key_id = \"{v}\"");
    }
    if let Some(ref v) = cfg.api.issuer_id {
        let _ = writeln!(out, "issuer_id = \"{v}\"");
    }
    if let Some(ref v) = cfg.api.private_key_path {
        let _ = writeln!(out, "private_key_path = \"{}\"", v.display());
    }
    if let Some(ref v) = cfg.api.private_key_env {
        let _ = writeln!(out, "private_key_env = \"{v}\"");
    }
    if let Some(ref v) = cfg.api.base_url {
        let _ = writeln!(out, "base_url = \"{v}\"");
    }
    if let Some(ref v) = cfg.api.ca_cert {
        let _ = writeln!(out, "ca_cert = \"{}\"", v.display());
    }

    if cfg.ci.build_url.is_some() || cfg.ci.build_api_token.is_some() {
        let _ = writeln!(out);
        let _ = writeln!(out, "[ci]");
        if let Some(ref v) = cfg.ci.build_url {
            let _ = writeln!(out, "build_url = \"{v}\"");
        }
        if cfg.ci.build_api_token.is_some() {
            let _ = writeln!(out, "build_api_token = \"****\"");
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "[device]");
    if let Some(ref v) = cfg.device.name {
        let _ = writeln!(out, "name = \"{v}\"");
    }
    if let Some(ref v) = cfg.device.udid {
        let _ = writeln!(out, "udid = \"{v}\"");
    }
    let _ = write!(out, "platform = \"{}\"", cfg.device.platform);

    out
}

/// Blank out secrets before a structured (JSON/YAML) rendering.
fn redacted(mut cfg: Config) -> Config {
    if cfg.ci.build_api_token.is_some() {
        cfg.ci.build_api_token = Some("****".into());
    }
    cfg
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn optional(value: String) -> Option<String> {
    let value = value.trim().to_owned();
    (!value.is_empty()).then_some(value)
}

fn check_pem(pem: &str) -> Result<(), CliError> {
    if pem.contains("BEGIN PRIVATE KEY") {
        Ok(())
    } else {
        Err(CliError::Validation {
            field: "private_key".into(),
            reason: "expected a PEM-encoded PKCS#8 key (the downloaded .p8 file)".into(),
        })
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => init(),

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = redacted(config::resolve(global)?);
            let out = output::render_single(&global.output, &cfg, format_config_redacted, |_| {
                "config".into()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        // ── SetKey ──────────────────────────────────────────────────
        ConfigCommand::SetKey { key_id, from_file } => {
            let key_id = key_id
                .or_else(|| global.key_id.clone())
                .or_else(|| config::load_config_or_default().api.key_id)
                .ok_or_else(|| CliError::Validation {
                    field: "key_id".into(),
                    reason: "pass --key-id or set api.key_id in the config file".into(),
                })?;

            let pem = match from_file {
                Some(path) => tokio::fs::read_to_string(&path).await?,
                None => Password::new()
                    .with_prompt(format!("Private key for {key_id} (paste the .p8 contents)"))
                    .interact()
                    .map_err(prompt_err)?,
            };
            check_pem(&pem)?;

            store_private_key(&key_id, &pem)?;
            if !global.quiet {
                eprintln!("✓ Private key for '{key_id}' stored in system keyring");
            }
            Ok(())
        }
    }
}

fn init() -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("reprovision configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    // 1. API key identity
    let key_id: String = Input::new()
        .with_prompt("API key ID")
        .interact_text()
        .map_err(prompt_err)?;
    let issuer_id: String = Input::new()
        .with_prompt("Issuer ID")
        .interact_text()
        .map_err(prompt_err)?;

    // 2. Private key storage
    let store_choices = &["Store in system keyring (recommended)", "Reference the .p8 file"];
    let store_selection = Select::new()
        .with_prompt("Where should the private key come from?")
        .items(store_choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    let key_path: String = Input::new()
        .with_prompt("Path to the .p8 private key")
        .interact_text()
        .map_err(prompt_err)?;
    let key_path = PathBuf::from(key_path.trim());

    let private_key_path = if store_selection == 0 {
        let pem = std::fs::read_to_string(&key_path)?;
        check_pem(&pem)?;
        store_private_key(&key_id, &pem)?;
        eprintln!("   ✓ Private key stored in system keyring");
        None
    } else {
        Some(key_path)
    };

    // 3. Device
    let name: String = Input::new()
        .with_prompt("Device name")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;
    let udid: String = Input::new()
        .with_prompt("Device UDID")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;
    let platform: String = Input::new()
        .with_prompt("Device platform (ios, macos, universal)")
        .default("ios".into())
        .interact_text()
        .map_err(prompt_err)?;

    // 4. Archive
    let archive: String = Input::new()
        .with_prompt("Build archive path (optional)")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;

    let cfg = Config {
        api: ApiSettings {
            key_id: optional(key_id),
            issuer_id: optional(issuer_id),
            private_key_path,
            ..ApiSettings::default()
        },
        device: DeviceSettings {
            name: optional(name),
            udid: optional(udid),
            platform: platform.trim().to_lowercase(),
        },
        archive_path: optional(archive).map(PathBuf::from),
        ..Config::default()
    };

    config::save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", config_path.display());
    eprintln!("\n  Test it: reprovision register");
    Ok(())
}
