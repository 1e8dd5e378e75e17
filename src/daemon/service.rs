//! systemd integration for the watchdog's own daemon process: unit file
//! rendering and the `systemctl` verbs the install path needs.

use std::path::Path;
use std::process::Command;

use crate::core::errors::{Result, UwdError};

/// Name of the installed unit.
pub const UNIT_NAME: &str = "uwd.service";

/// Default location for the installed unit file.
pub const UNIT_PATH: &str = "/etc/systemd/system/uwd.service";

/// Render the unit file contents pointing at `binary` and `config`.
#[must_use]
pub fn render_unit(binary: &Path, config: &Path) -> String {
    format!(
        "[Unit]\n\
         Description=Unit watchdog: alert on service state transitions\n\
         After=network.target\n\
         \n\
         [Service]\n\
         Type=simple\n\
         ExecStart={} --config {} daemon\n\
         Restart=on-failure\n\
         RestartSec=5\n\
         \n\
         [Install]\n\
         WantedBy=multi-user.target\n",
        binary.display(),
        config.display()
    )
}

/// Ask systemd to reload unit definitions.
pub fn daemon_reload() -> Result<()> {
    run_systemctl(&["daemon-reload"])
}

/// Enable and start the unit.
pub fn enable_now(unit: &str) -> Result<()> {
    run_systemctl(&["enable", "--now", unit])
}

/// Stop and disable the unit.
pub fn disable_now(unit: &str) -> Result<()> {
    run_systemctl(&["disable", "--now", unit])
}

fn run_systemctl(args: &[&str]) -> Result<()> {
    let output = Command::new("systemctl")
        .args(args)
        .output()
        .map_err(|e| UwdError::ServiceControl {
            details: format!("failed to run systemctl {}: {e}", args.join(" ")),
        })?;
    if output.status.success() {
        Ok(())
    } else {
        Err(UwdError::ServiceControl {
            details: format!(
                "systemctl {} exited with {}: {}",
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        })
    }
}
