//! Field runtime — the scheduled tasks around a `FieldEngine`.
//!
//! One background task owns the engine:
//! 1. waits the deferred init delay, then runs `load`
//! 2. ticks every poll interval and publishes a fresh snapshot
//! 3. handles activation requests from the handle
//! 4. on shutdown runs `unload` and hands the engine back
//!
//! Snapshots are published on a `watch` channel so a renderer only ever
//! sees the latest one.

use fieldstate_config::ScheduleConfig;
use fieldstate_core::{Error, Result};
use fieldstate_engine::{FieldContext, FieldEngine, FieldSnapshot};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

enum Command {
    Enter(oneshot::Sender<bool>),
    Shutdown,
}

/// Spawns and schedules a field engine.
#[derive(Debug, Clone)]
pub struct FieldRuntime {
    init_delay: Duration,
    poll_interval: Duration,
}

impl FieldRuntime {
    pub fn new(schedule: &ScheduleConfig) -> Self {
        Self {
            init_delay: schedule.init_delay(),
            poll_interval: schedule.poll_interval(),
        }
    }

    /// Start the background task. The engine is loaded after the init delay.
    pub fn start(&self, ctx: FieldContext) -> RuntimeHandle {
        let (command_tx, command_rx) = mpsc::channel(16);
        let (snapshot_tx, snapshot_rx) = watch::channel(None);

        let init_delay = self.init_delay;
        let poll_interval = self.poll_interval;
        let join = tokio::spawn(run(ctx, init_delay, poll_interval, command_rx, snapshot_tx));

        RuntimeHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
            join,
        }
    }
}

impl Default for FieldRuntime {
    fn default() -> Self {
        Self::new(&ScheduleConfig::default())
    }
}

/// Control side of a running field runtime.
pub struct RuntimeHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<Option<FieldSnapshot>>,
    join: JoinHandle<Option<FieldEngine>>,
}

impl RuntimeHandle {
    /// Latest published snapshot; `None` until the engine has loaded.
    pub fn snapshots(&self) -> watch::Receiver<Option<FieldSnapshot>> {
        self.snapshots.clone()
    }

    /// Activate the session. Requests made before the engine has loaded
    /// are applied right after load.
    pub async fn enter(&self) -> Result<bool> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Enter(reply_tx))
            .await
            .map_err(|_| Error::RuntimeStopped)?;
        reply_rx.await.map_err(|_| Error::RuntimeStopped)
    }

    /// Unload and stop. Returns the engine, or `None` when shutdown came
    /// before the deferred load ran.
    pub async fn shutdown(self) -> Result<Option<FieldEngine>> {
        // The task may already be gone; joining still reports its result
        let _ = self.commands.send(Command::Shutdown).await;
        self.join
            .await
            .map_err(|e| Error::Internal(format!("Field runtime task failed: {e}")))
    }
}

async fn run(
    ctx: FieldContext,
    init_delay: Duration,
    poll_interval: Duration,
    mut commands: mpsc::Receiver<Command>,
    snapshots: watch::Sender<Option<FieldSnapshot>>,
) -> Option<FieldEngine> {
    let mut pending_enters = Vec::new();

    let delay = tokio::time::sleep(init_delay);
    tokio::pin!(delay);
    loop {
        tokio::select! {
            _ = &mut delay => break,
            cmd = commands.recv() => match cmd {
                Some(Command::Enter(reply)) => pending_enters.push(reply),
                Some(Command::Shutdown) | None => {
                    debug!("Field runtime stopped before load");
                    return None;
                }
            },
        }
    }

    let mut engine = FieldEngine::load(ctx);
    let entered: Vec<bool> = pending_enters.iter().map(|_| engine.enter()).collect();
    snapshots.send_replace(Some(engine.snapshot()));
    for (reply, entered) in pending_enters.into_iter().zip(entered) {
        let _ = reply.send(entered);
    }

    let mut interval = tokio::time::interval(poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let resonance = engine.tick();
                debug!(resonance = %resonance, "Field tick");
                snapshots.send_replace(Some(engine.snapshot()));
            }
            cmd = commands.recv() => match cmd {
                Some(Command::Enter(reply)) => {
                    let entered = engine.enter();
                    snapshots.send_replace(Some(engine.snapshot()));
                    let _ = reply.send(entered);
                }
                Some(Command::Shutdown) | None => {
                    engine.unload();
                    info!("Field runtime stopped");
                    return Some(engine);
                }
            },
        }
    }
}
