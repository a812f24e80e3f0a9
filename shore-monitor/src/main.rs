//! Binary entrypoint (§4.9): parses arguments, installs logging, optionally
//! daemonizes, and runs the lifecycle controller. The only module allowed to
//! call `std::process::exit`.

use clap::Parser;

use shore_monitor::cli::Cli;
use shore_monitor::controller::{Controller, ControllerConfig};
use shore_monitor::process::SystemProcessProbe;
use shore_notify::NotifyConfig;

/// Not `#[tokio::main]`: `daemonize()` forks, and forking a process that has
/// already spun up tokio's worker threads only carries the calling thread
/// into the child, leaving the runtime unusable there. Forking must happen
/// before the runtime exists, so the runtime is built by hand afterward.
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // `--debug` keeps the process attached to the controlling terminal so
    // its output is visible there, per §4.9.
    if cli.daemonize && !cli.debug {
        daemonize()?;
    }

    let (mission_dir, log_path) = cli.resolve_paths();

    let verbosity = if cli.debug {
        shore_log::Verbosity::Debug
    } else {
        shore_log::Verbosity::Normal
    };
    // Daemonized means stdout/stderr already went to /dev/null above, so
    // logging has to land in a file instead; held for the process lifetime
    // so the non-blocking writer keeps flushing until exit.
    let log_dir = (cli.daemonize && !cli.debug).then_some(mission_dir.as_path());
    // A second call is a caller bug, not a runtime condition; ignore it here
    // since nothing else in this binary installs a subscriber.
    let _log_guard = shore_log::init(verbosity, log_dir).ok().flatten();

    let parent_pid = cli
        .parent_pid
        .unwrap_or_else(|| nix::unistd::getppid().as_raw());

    let config = ControllerConfig {
        mission_dir,
        log_path,
        parent_pid,
        basestation_config: cli.basestation_config.clone(),
        group_config: cli.group_config.clone(),
        notify: notify_config_from_env(),
    };

    let runtime = tokio::runtime::Runtime::new()?;
    let controller = Controller::new(config, SystemProcessProbe);
    runtime.block_on(controller.run()).map_err(Into::into)
}

/// Reads the sink transport settings this binary doesn't expose as CLI
/// flags (credentials, gateway URLs) from the environment, matching the
/// teacher's own preference for environment-sourced secrets over CLI args.
fn notify_config_from_env() -> NotifyConfig {
    let mut config = NotifyConfig::default();
    if let Ok(host) = std::env::var("SHORE_SMTP_RELAY_HOST") {
        config.smtp_relay = Some(shore_notify::SmtpRelay {
            host,
            username: std::env::var("SHORE_SMTP_RELAY_USERNAME").unwrap_or_default(),
            password: std::env::var("SHORE_SMTP_RELAY_PASSWORD").unwrap_or_default(),
        });
    }
    config.push_gateway_url = std::env::var("SHORE_PUSH_GATEWAY_URL").ok();
    config.satellite_gateway_url = std::env::var("SHORE_SATELLITE_GATEWAY_URL").ok();
    config.visualization_base_url = std::env::var("SHORE_VISUALIZATION_BASE_URL").ok();
    config
}

/// Detaches from the controlling terminal: fork once, the parent exits
/// immediately, the child starts a new session and redirects standard
/// descriptors to `/dev/null`.
fn daemonize() -> nix::Result<()> {
    use nix::unistd::{dup2, fork, setsid, ForkResult};
    use std::os::unix::io::AsRawFd;

    match unsafe { fork()? } {
        ForkResult::Parent { .. } => std::process::exit(0),
        ForkResult::Child => {
            setsid()?;
            if let Ok(dev_null) = std::fs::OpenOptions::new().read(true).write(true).open("/dev/null") {
                let fd = dev_null.as_raw_fd();
                let _ = dup2(fd, 0);
                let _ = dup2(fd, 1);
                let _ = dup2(fd, 2);
            }
            Ok(())
        }
    }
}
