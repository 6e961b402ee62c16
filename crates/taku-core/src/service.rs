//! systemd user units that keep the scripts root pulled.
//!
//! `taku service --install` writes `taku-sync.service` and a timer that
//! triggers it hourly, then enables the timer.  `--remove` undoes both.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::SCRIPTS_ENV_VAR;
use crate::error::Result;
use crate::process::{ProcessRunner, argv, run_checked};

/// Base name shared by the service and timer units.
pub const UNIT_NAME: &str = "taku-sync";

/// Manages the sync units in a systemd user unit directory.
#[derive(Debug, Clone)]
pub struct SyncService {
    unit_dir: PathBuf,
    scripts_dir: PathBuf,
    launcher: String,
}

impl SyncService {
    /// `config_dir` is the per-user configuration directory; units go to
    /// `<config_dir>/systemd/user`.
    pub fn new(config_dir: &Path, scripts_dir: impl Into<PathBuf>, launcher: impl Into<String>) -> Self {
        Self {
            unit_dir: config_dir.join("systemd").join("user"),
            scripts_dir: scripts_dir.into(),
            launcher: launcher.into(),
        }
    }

    pub fn service_path(&self) -> PathBuf {
        self.unit_dir.join(format!("{UNIT_NAME}.service"))
    }

    pub fn timer_path(&self) -> PathBuf {
        self.unit_dir.join(format!("{UNIT_NAME}.timer"))
    }

    fn service_unit(&self) -> Result<String> {
        let scripts = std::path::absolute(&self.scripts_dir)?;
        Ok(format!(
            "[Unit]\n\
             Description=Pull taku scripts\n\
             \n\
             [Service]\n\
             Type=oneshot\n\
             Environment=\"{SCRIPTS_ENV_VAR}={}\"\n\
             ExecStart={} sync --pull\n",
            scripts.display(),
            self.launcher,
        ))
    }

    fn timer_unit(&self) -> String {
        format!(
            "[Unit]\n\
             Description=Periodically pull taku scripts\n\
             \n\
             [Timer]\n\
             OnBootSec=5min\n\
             OnUnitActiveSec=1h\n\
             Unit={UNIT_NAME}.service\n\
             \n\
             [Install]\n\
             WantedBy=timers.target\n"
        )
    }

    /// Write the units and enable the timer.
    pub fn install(&self, runner: &dyn ProcessRunner) -> Result<()> {
        std::fs::create_dir_all(&self.unit_dir)?;
        std::fs::write(self.service_path(), self.service_unit()?)?;
        std::fs::write(self.timer_path(), self.timer_unit())?;

        run_checked(runner, &argv(["systemctl", "--user", "daemon-reload"]))?;
        let timer = format!("{UNIT_NAME}.timer");
        run_checked(
            runner,
            &argv(["systemctl", "--user", "enable", "--now", timer.as_str()]),
        )?;

        info!(unit_dir = %self.unit_dir.display(), "sync service installed");
        Ok(())
    }

    /// Disable the timer and delete the units.
    pub fn remove(&self, runner: &dyn ProcessRunner) -> Result<()> {
        let timer = format!("{UNIT_NAME}.timer");
        let code = runner.run(&argv(["systemctl", "--user", "disable", "--now", timer.as_str()]))?;
        if code != 0 {
            warn!(code, "timer was not enabled");
        }

        for path in [self.timer_path(), self.service_path()] {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        run_checked(runner, &argv(["systemctl", "--user", "daemon-reload"]))?;
        info!("sync service removed");
        Ok(())
    }
}
