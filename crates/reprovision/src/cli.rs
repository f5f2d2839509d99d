//! Clap derive structures for the `reprovision` CLI.
//!
//! Defines the command tree, global flags, and shared types. Also compiled
//! by `build.rs` for man page generation, so it depends on clap only.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// reprovision -- keep test devices in your iOS provisioning profiles
#[derive(Debug, Parser)]
#[command(
    name = "reprovision",
    version,
    about = "Register a test device and rebuild iOS provisioning profiles",
    long_about = "Registers a test device with App Store Connect if it is missing, then\n\
        deletes and recreates every iOS provisioning profile embedded in a build\n\
        archive so it includes all eligible devices, and installs the results.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// App Store Connect API key ID
    #[arg(long, env = "REPROVISION_KEY_ID", global = true)]
    pub key_id: Option<String>,

    /// App Store Connect API issuer ID
    #[arg(long, env = "REPROVISION_ISSUER_ID", global = true)]
    pub issuer_id: Option<String>,

    /// Path to the `.p8` private key file
    #[arg(long, env = "REPROVISION_PRIVATE_KEY_PATH", global = true)]
    pub private_key_path: Option<PathBuf>,

    /// CI build URL used to look up a connected API key
    #[arg(long, env = "REPROVISION_BUILD_URL", global = true)]
    pub build_url: Option<String>,

    /// CI build API token
    #[arg(long, env = "REPROVISION_BUILD_API_TOKEN", global = true, hide_env_values = true)]
    pub build_api_token: Option<String>,

    /// App Store Connect API base URL
    #[arg(long, env = "REPROVISION_BASE_URL", global = true, hide = true)]
    pub base_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "REPROVISION_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds
    #[arg(long, env = "REPROVISION_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register the device, then rebuild and install every profile in the archive
    Run(RunArgs),

    /// Register the device if it is not already known
    Register(DeviceArgs),

    /// Delete and recreate named profiles with all eligible devices
    Reconcile(ReconcileArgs),

    /// Download and install named profiles
    Install(InstallArgs),

    /// Manage configuration and stored keys
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Arguments ─────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DeviceArgs {
    /// Device name shown in the developer portal
    #[arg(long, env = "REPROVISION_DEVICE_NAME")]
    pub device_name: Option<String>,

    /// Device UDID, sent exactly as given
    #[arg(long, env = "REPROVISION_DEVICE_UDID")]
    pub device_udid: Option<String>,

    /// Device platform: ios, macos or universal
    #[arg(long, env = "REPROVISION_DEVICE_PLATFORM")]
    pub device_platform: Option<String>,
}

#[derive(Debug, Args)]
pub struct InstallTarget {
    /// Directory to install profiles into
    /// [default: ~/Library/MobileDevice/Provisioning Profiles]
    #[arg(long, env = "REPROVISION_PROFILES_DIR")]
    pub profiles_dir: Option<PathBuf>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  RUN / REGISTER / RECONCILE / INSTALL
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub device: DeviceArgs,

    /// Build archive (.xcarchive) to scan for embedded profiles
    #[arg(long, env = "REPROVISION_ARCHIVE_PATH")]
    pub archive_path: Option<PathBuf>,

    #[command(flatten)]
    pub target: InstallTarget,
}

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// Exact profile name (repeatable)
    #[arg(long = "profile", short = 'p', required = true)]
    pub profiles: Vec<String>,
}

#[derive(Debug, Args)]
pub struct InstallArgs {
    /// Exact profile name (repeatable)
    #[arg(long = "profile", short = 'p', required = true)]
    pub profiles: Vec<String>,

    #[command(flatten)]
    pub target: InstallTarget,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create the config file with guided setup
    Init,

    /// Display the resolved configuration (secrets masked)
    Show,

    /// Print the config file path
    Path,

    /// Store an API private key in the system keyring
    SetKey {
        /// API key ID the private key belongs to
        #[arg(long)]
        key_id: Option<String>,

        /// Read the PEM key from this file instead of prompting
        #[arg(long)]
        from_file: Option<PathBuf>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
