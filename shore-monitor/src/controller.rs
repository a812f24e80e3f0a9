//! Lifecycle controller (§4.8): acquires the singleton lock, runs the
//! tail/reduce/dispatch loop, and watches the parent shell for the
//! synthetic-disconnect trigger.

use std::path::PathBuf;
use std::time::Duration;

use shore_common::{EventKind, GliderId};
use shore_notify::{AuxInputs, Dispatcher, NotifyConfig};
use shore_session::{CommLog, NoopCallbacks, Session, SessionCallbacks, SessionReducer, Tailer, TailerError};
use shore_subscriptions::{load, ConfigError, ConfigLayers};
use thiserror::Error;

use crate::lock::{LockError, LockFile};
use crate::process::ProcessProbe;
use crate::watchdog::ParentWatchdog;

const POLL_INTERVAL: Duration = Duration::from_secs(1);
const MAX_CONSECUTIVE_IO_FAILURES: u32 = 5;
/// A GPS fix is reported as `lategps` rather than `gps` once a session has
/// been connected this long without one arriving.
const LATEGPS_THRESHOLD: chrono::Duration = chrono::Duration::minutes(10);

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("tailer reported {0} consecutive I/O failures, giving up")]
    TailerFailed(u32),
}

pub struct ControllerConfig {
    pub mission_dir: PathBuf,
    pub log_path: PathBuf,
    pub parent_pid: i32,
    pub basestation_config: Option<PathBuf>,
    pub group_config: Option<PathBuf>,
    pub notify: NotifyConfig,
}

impl ControllerConfig {
    fn mission_config_path(&self) -> PathBuf {
        self.mission_dir.join(".subscriptions")
    }
}

/// One event ready to be decided and dispatched, queued synchronously by a
/// reducer callback and drained after the reducer has finished applying the
/// records from one tailer pass (reducer callbacks are synchronous; sink
/// delivery is not, so the two can't be interleaved directly).
struct QueuedEvent {
    kind: EventKind,
    session: Option<Session>,
}

struct DispatchQueue {
    events: Vec<QueuedEvent>,
}

impl DispatchQueue {
    fn new() -> Self {
        Self { events: Vec::new() }
    }

    fn push(&mut self, kind: EventKind, session: Option<&Session>) {
        self.events.push(QueuedEvent {
            kind,
            session: session.cloned(),
        });
    }
}

impl SessionCallbacks for DispatchQueue {
    fn disconnected(&mut self, session: &Session) {
        // The session just closed; re-evaluate every end-of-session event
        // kind against its final state. `decide` gates each one internally
        // and returns nothing for kinds whose condition isn't met.
        self.push(EventKind::Critical, Some(session));
        self.push(EventKind::Recov, Some(session));
        self.push(EventKind::Drift, Some(session));
    }

    fn recovery(&mut self, session: &Session) {
        self.push(EventKind::Recov, Some(session));
    }

    fn counter_line(&mut self, session: &Session) {
        let Some(fix) = session.gps_fix else { return };
        let kind = if fix.time - session.connected_at > LATEGPS_THRESHOLD {
            EventKind::Lategps
        } else {
            EventKind::Gps
        };
        self.push(kind, Some(session));
    }
}

pub struct Controller<P: ProcessProbe + Clone> {
    config: ControllerConfig,
    mission_config_path: PathBuf,
    probe: P,
}

impl<P: ProcessProbe + Clone> Controller<P> {
    pub fn new(config: ControllerConfig, probe: P) -> Self {
        let mission_config_path = config.mission_config_path();
        Self {
            config,
            mission_config_path,
            probe,
        }
    }

    /// The per-mission layer path is fixed (`<mission-dir>/.subscriptions`,
    /// §4.9) but, unlike the CLI-supplied layers, is only ever "provided" to
    /// the loader when it actually exists — an unconfigured mission has no
    /// such file yet, and that's not a load failure.
    fn config_layers(&self) -> ConfigLayers<'_> {
        ConfigLayers {
            basestation: self.config.basestation_config.as_deref(),
            group: self.config.group_config.as_deref(),
            mission: self.mission_config_path.exists().then_some(self.mission_config_path.as_path()),
        }
    }

    pub async fn run(self) -> Result<(), ControllerError> {
        let lock = LockFile::new(&self.config.mission_dir);
        lock.acquire(&self.probe).await?;
        let result = self.run_loop().await;
        lock.release();
        result
    }

    async fn run_loop(&self) -> Result<(), ControllerError> {
        let mut tailer = Tailer::new(&self.config.log_path, 0);
        let mut reducer = SessionReducer::new();
        let mut commlog = CommLog::new();
        let dispatcher = Dispatcher::new(self.config.notify.clone());
        let mut watchdog = ParentWatchdog::new(self.probe.clone(), self.config.parent_pid);
        let mut glider_id = self.resolve_glider_id_from_name();
        let mut first_pass = true;
        let mut consecutive_io_failures = 0u32;

        loop {
            match tailer.poll().await {
                Ok(lines) => {
                    consecutive_io_failures = 0;
                    let mut queue = DispatchQueue::new();
                    for line in &lines {
                        let record = shore_parser::parse_line(line);
                        let closed = if first_pass {
                            reducer.apply(record, true, &mut NoopCallbacks)
                        } else {
                            reducer.apply(record, false, &mut queue)
                        };
                        if let Some(closed) = closed {
                            commlog.push_closed(closed);
                        }
                    }
                    commlog.set_open(reducer.current().cloned());

                    if first_pass {
                        first_pass = false;
                        if glider_id.is_none() {
                            // The Connected line may have carried an id directly (§4.2);
                            // otherwise we keep the one resolved from the mission dir name.
                            glider_id = reducer.current().and_then(|s| s.glider_id);
                        }
                    }

                    if let Some(glider_id) = glider_id {
                        self.drain(&dispatcher, glider_id, &commlog, queue).await?;
                    }
                }
                Err(TailerError::Rotated { path, .. }) => {
                    tracing::warn!(path = %path.display(), "log file rotated, resuming from the start");
                    tailer = Tailer::new(path, 0);
                }
                Err(e) => {
                    consecutive_io_failures += 1;
                    tracing::error!(error = %e, consecutive_io_failures, "tailer read failed");
                    if consecutive_io_failures >= MAX_CONSECUTIVE_IO_FAILURES {
                        return Err(ControllerError::TailerFailed(consecutive_io_failures));
                    }
                }
            }

            if watchdog.tick() {
                tracing::warn!(parent_pid = self.config.parent_pid, "parent shell gone, synthesizing disconnect");
                self.synthesize_disconnect(&mut reducer, &mut commlog, glider_id, &dispatcher).await?;
                return Ok(());
            }

            if commlog.open().is_none() && !first_pass && commlog.closed().last().is_some() {
                // Normal end of session: the most recent record observed was
                // a disconnect and nothing is open. Exit cleanly.
                return Ok(());
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn drain(
        &self,
        dispatcher: &Dispatcher,
        glider_id: GliderId,
        commlog: &CommLog,
        queue: DispatchQueue,
    ) -> Result<(), ControllerError> {
        if queue.events.is_empty() {
            return Ok(());
        }

        // The visualization sidechannel (§6) fires for every major callback
        // regardless of subscription routing, so it runs ahead of — and
        // doesn't depend on — the subscription table load below.
        for event in &queue.events {
            dispatcher.notify_visualization(glider_id, event.kind, event.session.as_ref()).await;
        }

        // Reloaded fresh per event rather than cached: the mission operator
        // may edit the subscription files while the monitor is running.
        let table = load(self.config_layers(), true)?;
        let aux = AuxInputs::default();
        for event in queue.events {
            dispatcher
                .dispatch(event.kind, &table, glider_id, event.session.as_ref(), commlog, &aux)
                .await;
        }
        Ok(())
    }

    fn resolve_glider_id_from_name(&self) -> Option<GliderId> {
        let name = self.config.mission_dir.file_name()?.to_str()?;
        GliderId::from_mission_dir_name(name)
    }

    async fn synthesize_disconnect(
        &self,
        reducer: &mut SessionReducer,
        commlog: &mut CommLog,
        glider_id: Option<GliderId>,
        dispatcher: &Dispatcher,
    ) -> Result<(), ControllerError> {
        let now = chrono::Utc::now();
        let line = format!("Disconnected at {} (shell_disappeared)", now.to_rfc3339());
        match tokio::fs::OpenOptions::new().create(true).append(true).open(&self.config.log_path).await {
            Ok(mut f) => {
                use tokio::io::AsyncWriteExt;
                if let Err(e) = f.write_all(format!("{line}\n").as_bytes()).await {
                    tracing::error!(error = %e, "failed to append synthetic disconnect line");
                }
            }
            Err(e) => tracing::error!(error = %e, "failed to open log file for synthetic disconnect"),
        }

        let record = shore_parser::parse_line(&line);
        let mut queue = DispatchQueue::new();
        if let Some(closed) = reducer.apply(record, false, &mut queue) {
            commlog.push_closed(closed);
        }
        commlog.set_open(reducer.current().cloned());

        if let Some(glider_id) = glider_id {
            self.drain(dispatcher, glider_id, commlog, queue).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::fake::FakeProcessTable;
    use tempfile::tempdir;

    fn config_for(mission_dir: PathBuf) -> ControllerConfig {
        ControllerConfig {
            log_path: mission_dir.join("comm.log"),
            mission_dir,
            parent_pid: 999,
            basestation_config: None,
            group_config: None,
            notify: NotifyConfig::default(),
        }
    }

    #[tokio::test]
    async fn a_fully_closed_session_exits_cleanly_after_scan_back() {
        let dir = tempdir().unwrap();
        let mission_dir = dir.path().join("sg401");
        std::fs::create_dir(&mission_dir).unwrap();
        std::fs::write(
            mission_dir.join("comm.log"),
            "Connected at 2024-01-15T00:00:00Z\n\
             Counter: dive=3, gps=4730.000N,12215.000W\n\
             Disconnected at 2024-01-15T00:05:00Z (logout)\n",
        )
        .unwrap();

        let probe = std::sync::Arc::new(FakeProcessTable::with_alive([999]));
        let controller = Controller::new(config_for(mission_dir.clone()), probe);
        controller.run().await.unwrap();

        assert!(!mission_dir.join(".shore-monitor.lock").exists());
    }

    #[tokio::test(start_paused = true)]
    async fn absent_parent_shell_synthesizes_a_disconnect_and_exits() {
        let dir = tempdir().unwrap();
        let mission_dir = dir.path().join("sg402");
        std::fs::create_dir(&mission_dir).unwrap();
        std::fs::write(&mission_dir.join("comm.log"), "Connected at 2024-01-15T00:00:00Z\n").unwrap();

        let probe = std::sync::Arc::new(FakeProcessTable::with_alive([]));
        let controller = Controller::new(config_for(mission_dir.clone()), probe);
        controller.run().await.unwrap();

        let log = std::fs::read_to_string(mission_dir.join("comm.log")).unwrap();
        assert!(log.contains("shell_disappeared"));
        assert!(!mission_dir.join(".shore-monitor.lock").exists());
    }
}
