//! call-home - report a Percona product installation once
//!
//! # Usage
//!
//! ```bash
//! # From a package post-install hook
//! call-home -f PRODUCT_FAMILY_PS -v 8.0.33 -d PACKAGE
//!
//! # Same thing through the environment
//! PERCONA_PRODUCT_FAMILY=PRODUCT_FAMILY_PS PERCONA_PRODUCT_VERSION=8.0.33 \
//!     PERCONA_DEPLOYMENT_METHOD=PACKAGE call-home
//!
//! # Show the report without sending it
//! call-home -f PRODUCT_FAMILY_PS -v 8.0.33 -d PACKAGE --dry-run
//! ```
//!
//! Exit status is 0 when the report was sent, was already sent before, or
//! telemetry is disabled with `PERCONA_TELEMETRY_DISABLE`; 1 otherwise.

mod logging;
mod show;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{ArgAction, CommandFactory, Parser};
use percona_telemetry::endpoint::{
    self, CONFIG_FILE_PATH_ENV, DEPLOYMENT_METHOD_ENV, INSTANCE_ID_ENV, LOG_LEVEL_ENV,
    OPERATING_SYSTEM_ENV, PRODUCT_FAMILY_ENV, PRODUCT_VERSION_ENV, SEND_TIMEOUT_ENV,
    TELEMETRY_URL_ENV,
};
use percona_telemetry::{HttpTransport, Reporter, ReporterConfig, RunOutcome};
use tracing::info;

use crate::logging::LogLevel;

/// Report a Percona product installation to the telemetry service
#[derive(Parser, Debug)]
#[command(name = "call-home")]
#[command(version, about, long_about = None)]
#[command(disable_help_flag = true)]
struct Cli {
    /// Product family identifier
    #[arg(short = 'f', long, env = PRODUCT_FAMILY_ENV)]
    product_family: Option<String>,

    /// Product version
    #[arg(short = 'v', long, env = PRODUCT_VERSION_ENV)]
    product_version: Option<String>,

    /// Operating system descriptor (detected when omitted)
    #[arg(short = 's', long, env = OPERATING_SYSTEM_ENV)]
    operating_system: Option<String>,

    /// Deployment method (e.g. PACKAGE, DOCKER)
    #[arg(short = 'd', long, env = DEPLOYMENT_METHOD_ENV)]
    deployment_method: Option<String>,

    /// Instance id to use when none is stored (generated when omitted)
    #[arg(short = 'i', long, env = INSTANCE_ID_ENV)]
    instance_id: Option<String>,

    /// Telemetry state file
    #[arg(short = 'j', long, env = CONFIG_FILE_PATH_ENV, default_value = endpoint::DEFAULT_CONFIG_FILE_PATH)]
    config_file_path: PathBuf,

    /// Telemetry collection URL
    #[arg(short = 'u', long, env = TELEMETRY_URL_ENV, default_value = endpoint::DEFAULT_TELEMETRY_URL)]
    url: String,

    /// Send timeout in seconds (connection and response)
    #[arg(short = 't', long, env = SEND_TIMEOUT_ENV, default_value_t = endpoint::DEFAULT_SEND_TIMEOUT.as_secs())]
    timeout: u64,

    /// Print the report that would be sent and exit without sending or writing state
    #[arg(long)]
    dry_run: bool,

    /// Diagnostic log level (written to stderr)
    #[arg(long, value_enum, env = LOG_LEVEL_ENV, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,

    /// Print usage
    #[arg(short = 'h', long, action = ArgAction::SetTrue)]
    help: bool,
}

impl Cli {
    fn into_config(self) -> ReporterConfig {
        ReporterConfig {
            product_family: self.product_family,
            product_version: self.product_version,
            operating_system: self.operating_system,
            deployment_method: self.deployment_method,
            instance_id: self.instance_id,
            config_file_path: self.config_file_path,
            endpoint: self.url,
            send_timeout: Duration::from_secs(self.timeout),
        }
    }
}

fn main() -> Result<()> {
    // Checked before parsing so a disabled reporter never fails a package hook
    if percona_telemetry::telemetry_disabled() {
        return Ok(());
    }

    let cli = parse_cli();
    if cli.help {
        print_usage_and_exit();
    }

    logging::init(cli.log_level)?;

    let dry_run = cli.dry_run;
    let config = cli.into_config();
    if dry_run {
        return show::run(config);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(report(config))
}

/// Parse arguments; every parse error exits 1, `--version` exits 0
fn parse_cli() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.kind() == ErrorKind::DisplayVersion => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    }
}

fn print_usage_and_exit() -> ! {
    let _ = Cli::command().print_help();
    println!();
    std::process::exit(1);
}

async fn report(config: ReporterConfig) -> Result<()> {
    let transport = HttpTransport::new(config.send_timeout)?;
    let reporter = Reporter::new(config);

    match reporter.run(&transport).await? {
        RunOutcome::AlreadyReported { instance_id } => {
            info!(instance_id = %instance_id, "Nothing to report");
        }
        RunOutcome::Reported {
            instance_id,
            report_id,
        } => {
            info!(instance_id = %instance_id, report_id = %report_id, "Reported");
        }
    }

    Ok(())
}
