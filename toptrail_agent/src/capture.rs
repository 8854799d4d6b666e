//! Capture controller: Idle/Running state machine driving the periodic
//! sample → append loop. Handlers share one controller through `AppState`.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use tokio::sync::{oneshot, Mutex};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::capture_log::CaptureLog;
use crate::error::{CollectionError, PersistError};
use crate::metrics::Sampler;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Running,
}

enum Inner {
    Idle,
    // Dropping or firing the sender ends the loop that owns the receiver.
    Running(oneshot::Sender<()>),
}

pub struct CaptureController {
    inner: Mutex<Inner>,
    sampler: Arc<Mutex<Box<dyn Sampler>>>,
    log: CaptureLog,
    period: Duration,
    live_loops: Arc<AtomicUsize>,
}

impl CaptureController {
    pub fn new(sampler: Box<dyn Sampler>, log: CaptureLog, period: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner::Idle),
            sampler: Arc::new(Mutex::new(sampler)),
            log,
            period,
            live_loops: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub async fn state(&self) -> CaptureState {
        match *self.inner.lock().await {
            Inner::Idle => CaptureState::Idle,
            Inner::Running(_) => CaptureState::Running,
        }
    }

    /// Number of capture loops that have not exited yet. Briefly 2 right after a
    /// stop/start pair while the old loop finishes its in-flight cycle.
    pub fn live_loops(&self) -> usize {
        self.live_loops.load(Ordering::Acquire)
    }

    /// Idle → Running. Returns false (and does nothing) when already running.
    pub async fn start(&self) -> bool {
        let mut inner = self.inner.lock().await;
        if matches!(*inner, Inner::Running(_)) {
            return false;
        }
        let (stop_tx, stop_rx) = oneshot::channel();
        *inner = Inner::Running(stop_tx);
        drop(inner);

        // Count the loop before it is scheduled so callers never observe a gap.
        self.live_loops.fetch_add(1, Ordering::AcqRel);
        tokio::spawn(run_loop(
            self.sampler.clone(),
            self.log.clone(),
            self.period,
            stop_rx,
            LoopGuard(self.live_loops.clone()),
        ));
        info!(period = ?self.period, "capture started");
        true
    }

    /// Running → Idle. Returns false when already idle. An in-flight cycle finishes;
    /// the loop exits before its next tick.
    pub async fn stop(&self) -> bool {
        let mut inner = self.inner.lock().await;
        match std::mem::replace(&mut *inner, Inner::Idle) {
            Inner::Idle => false,
            Inner::Running(stop_tx) => {
                let _ = stop_tx.send(());
                info!("capture stopped");
                true
            }
        }
    }
}

struct LoopGuard(Arc<AtomicUsize>);

impl Drop for LoopGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

async fn run_loop(
    sampler: Arc<Mutex<Box<dyn Sampler>>>,
    log: CaptureLog,
    period: Duration,
    mut stop_rx: oneshot::Receiver<()>,
    _guard: LoopGuard,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            biased;
            _ = &mut stop_rx => break,
            _ = ticker.tick() => {}
        }
        match capture_once(&sampler, &log).await {
            Ok(ts) => debug!(%ts, "captured metrics"),
            Err(CycleError::Collect(e)) => warn!("capture failed: {e}"),
            Err(CycleError::Persist(e)) => warn!("persist failed: {e}"),
        }
    }
    debug!("capture loop exited");
}

enum CycleError {
    Collect(CollectionError),
    Persist(PersistError),
}

async fn capture_once(
    sampler: &Arc<Mutex<Box<dyn Sampler>>>,
    log: &CaptureLog,
) -> Result<chrono::DateTime<chrono::Utc>, CycleError> {
    let sampler = sampler.clone();
    let snapshot = tokio::task::spawn_blocking(move || sampler.blocking_lock().capture())
        .await
        .map_err(|e| CycleError::Collect(CollectionError::Task(e.to_string())))?
        .map_err(CycleError::Collect)?;

    let log = log.clone();
    let ts = snapshot.timestamp;
    tokio::task::spawn_blocking(move || log.append(&snapshot))
        .await
        .map_err(|e| CycleError::Persist(PersistError::Task(e.to_string())))?
        .map_err(CycleError::Persist)?;
    Ok(ts)
}
