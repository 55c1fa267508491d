//! Command-line surface. One `Subcommand` variant per top-level token,
//! flags attached to each variant (rather than globally) so `clap`
//! enforces per-command structure; rules that cross subcommand
//! boundaries (`-u` vs `-local`, `-acm` vs `-ccm`) are checked in
//! `validate` after parsing, the same two-layer approach the teacher
//! uses for its own gateway CLI (`clap` structural parsing, then a
//! `Config::validate()` business-rule pass).

use clap::{Parser, Subcommand};

/// RPC — Remote Provisioning Client.
#[derive(Debug, Parser)]
#[command(name = "rpc", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Activate the device (CCM or ACM).
    Activate(ActivateArgs),
    /// Deactivate the device.
    Deactivate(DeactivateArgs),
    /// Apply a configuration profile (e.g. 802.1x).
    Configure(ConfigureArgs),
    /// Print AMT device information.
    AmtInfo(CommonArgs),
    /// Print version information.
    Version,
    /// Run maintenance tasks.
    Maintenance(CommonArgs),
}

/// Flags shared by every command that talks to a device, remote or
/// local.
#[derive(Debug, Clone, clap::Args, Default)]
pub struct CommonArgs {
    /// Remote server URL, e.g. `wss://provisioning.example.com`.
    #[arg(short = 'u', long)]
    pub url: Option<String>,

    /// Talk to the device directly instead of via a remote server.
    #[arg(long = "local")]
    pub local: bool,

    /// AMT/local-system password. Prompted on stdin if omitted and
    /// required.
    #[arg(long)]
    pub password: Option<String>,

    /// Remote activation profile name.
    #[arg(long)]
    pub profile: Option<String>,

    /// Friendly device name reported to the remote server.
    #[arg(long)]
    pub name: Option<String>,

    /// Loopback LMS address.
    #[arg(long = "lmsaddress")]
    pub lms_address: Option<String>,

    /// Loopback LMS port.
    #[arg(long = "lmsport")]
    pub lms_port: Option<u16>,

    /// Timeout in seconds for the driver version query.
    #[arg(short = 't', long = "timeout")]
    pub timeout_seconds: Option<u64>,

    /// Verbose logging.
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Emit machine-readable JSON instead of plain text.
    #[arg(long)]
    pub json: bool,

    /// Skip TLS certificate verification on the remote connection.
    #[arg(short = 'n', long = "skip-cert-check")]
    pub skip_cert_check: bool,

    /// Path to the YAML config file.
    #[arg(long = "config")]
    pub config_path: Option<String>,

    /// DNS suffix (defaults to `DNS_SUFFIX`).
    #[arg(short = 'd', long = "dns-suffix")]
    pub dns_suffix: Option<String>,

    /// Hostname (defaults to `HOSTNAME`).
    #[arg(short = 'h', long)]
    pub hostname: Option<String>,

    /// Proxy address and port.
    #[arg(short = 'p', long)]
    pub proxy: Option<String>,
}

#[derive(Debug, Clone, clap::Args)]
pub struct ActivateArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Activate into Admin Control Mode.
    #[arg(long)]
    pub acm: bool,

    /// Activate into Client Control Mode.
    #[arg(long)]
    pub ccm: bool,

    /// AMT password to set (ACM/CCM).
    #[arg(long = "amtPassword")]
    pub amt_password: Option<String>,

    /// MEBx password to set (ACM).
    #[arg(long = "mebxPassword")]
    pub mebx_password: Option<String>,

    /// Base64 PKCS#12 provisioning certificate bundle (ACM).
    #[arg(long = "provisioningCert")]
    pub provisioning_cert: Option<String>,

    /// Passphrase for the provisioning certificate bundle (ACM).
    #[arg(long = "provisioningCertPwd")]
    pub provisioning_cert_pwd: Option<String>,
}

#[derive(Debug, Clone, clap::Args)]
pub struct DeactivateArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Force deactivation even if already unprovisioned.
    #[arg(short = 'f', long)]
    pub force: bool,
}

#[derive(Debug, Clone, clap::Args)]
pub struct ConfigureArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}
