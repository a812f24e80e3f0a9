//! Argument parsing for the `shore-monitor` binary (§4.9, §6).

use std::path::{Path, PathBuf};

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "shore-monitor", about = "Shore-side session monitor for a glider mission")]
pub struct Cli {
    /// Mission directory (implies `<dir>/comm.log`), or a path directly to the log file.
    pub target: PathBuf,

    /// Detach into the background after acquiring the lock.
    #[arg(long)]
    pub daemonize: bool,

    /// PID of the parent login shell, watched for the synthetic-disconnect trigger.
    #[arg(long)]
    pub parent_pid: Option<i32>,

    /// Verbose logging.
    #[arg(long)]
    pub debug: bool,

    /// Basestation-wide subscription config layer.
    #[arg(long)]
    pub basestation_config: Option<PathBuf>,

    /// Group-wide subscription config layer.
    #[arg(long)]
    pub group_config: Option<PathBuf>,
}

impl Cli {
    /// Resolves `target` to the mission directory and the log file path,
    /// per the open question resolved in the expanded spec: a bare directory
    /// implies `<dir>/comm.log`; anything else is taken as the log path
    /// directly, with its parent as the mission directory.
    pub fn resolve_paths(&self) -> (PathBuf, PathBuf) {
        if self.target.is_dir() {
            (self.target.clone(), self.target.join("comm.log"))
        } else {
            let mission_dir = self.target.parent().unwrap_or(Path::new(".")).to_path_buf();
            (mission_dir, self.target.clone())
        }
    }
}
