//! Dry run - show exactly what would be sent
//!
//! Prints the JSON report to stdout. Nothing is sent and the state file is not
//! created or modified.

use anyhow::Result;
use percona_telemetry::{Preview, Reporter, ReporterConfig};

/// Run the dry-run command
pub fn run(config: ReporterConfig) -> Result<()> {
    let endpoint = config.endpoint.clone();
    let state_file = config.config_file_path.clone();
    let preview = Reporter::new(config).preview()?;

    eprintln!("Endpoint:   {}", endpoint);
    eprintln!("State file: {}", state_file.display());
    eprintln!("Status:     {}", status_line(&preview));
    println!("{}", preview.envelope.to_json_pretty()?);

    Ok(())
}

fn status_line(preview: &Preview) -> &'static str {
    if preview.would_send {
        "would send (dry run, nothing sent)"
    } else {
        "already reported for this instance id, nothing would be sent"
    }
}
