//! Playback engine
//!
//! Replays the committed actions against a [`GestureDispatcher`], `loop_count`
//! times (or forever when `loop_count <= 0`). Each run is one Tokio task.
//! Every suspension point (delays, waits, in-flight dispatches) races the
//! run's stop signal, so [`Player::stop`] takes effect at the next one.

use crate::dispatch::{DispatchOutcome, Gesture, GestureDispatcher, StrokeFloors};
use macrotap_core::{Action, ActionKind, Error, MacroHandle, Notification, Notifier, Result};
use parking_lot::Mutex;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Playback configuration
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// Pause before the first loop, lets the host settle after switching modes
    pub start_delay: Duration,
    /// Pause between two loops
    pub loop_pause: Duration,
    /// Smallest pause after an action, whatever its `delay_after` says
    pub min_delay_after: Duration,
    pub strokes: StrokeFloors,
    /// Initial repeat count; `<= 0` means forever
    pub loop_count: i32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            start_delay: Duration::from_millis(500),
            loop_pause: Duration::from_millis(100),
            min_delay_after: Duration::from_millis(100),
            strokes: StrokeFloors::default(),
            loop_count: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Stopped,
    Playing,
}

/// Counters for the current (or last) run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlaybackStats {
    pub loops_completed: usize,
    pub gestures_dispatched: usize,
    pub gestures_completed: usize,
    /// Cancelled or failed dispatches
    pub gestures_failed: usize,
    pub waits: usize,
}

#[derive(Debug, thiserror::Error)]
enum Interrupt {
    #[error("playback stopped")]
    Stopped,
}

type Step<T> = std::result::Result<T, Interrupt>;

/// Ownership of the current run.
#[derive(Debug, Default)]
struct RunSlot {
    generation: u64,
    stop_tx: Option<watch::Sender<bool>>,
}

struct Shared {
    state: watch::Sender<PlaybackState>,
    slot: Mutex<RunSlot>,
    stats: Mutex<PlaybackStats>,
    loop_count: AtomicI32,
}

pub struct Player<D> {
    dispatcher: Arc<D>,
    macros: MacroHandle,
    config: PlaybackConfig,
    notifier: Notifier,
    shared: Arc<Shared>,
}

impl<D> Clone for Player<D> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            macros: self.macros.clone(),
            config: self.config.clone(),
            notifier: self.notifier.clone(),
            shared: self.shared.clone(),
        }
    }
}

impl<D: GestureDispatcher + 'static> Player<D> {
    pub fn new(dispatcher: D, macros: MacroHandle) -> Self {
        Self::with_config(dispatcher, macros, PlaybackConfig::default())
    }

    pub fn with_config(dispatcher: D, macros: MacroHandle, config: PlaybackConfig) -> Self {
        let (state, _) = watch::channel(PlaybackState::Stopped);
        let shared = Arc::new(Shared {
            state,
            slot: Mutex::new(RunSlot::default()),
            stats: Mutex::new(PlaybackStats::default()),
            loop_count: AtomicI32::new(config.loop_count),
        });
        Self {
            dispatcher: Arc::new(dispatcher),
            macros,
            config,
            notifier: Notifier::disabled(),
            shared,
        }
    }

    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn state(&self) -> PlaybackState {
        *self.shared.state.borrow()
    }

    pub fn is_playing(&self) -> bool {
        self.state() == PlaybackState::Playing
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.shared.state.subscribe()
    }

    pub fn stats(&self) -> PlaybackStats {
        self.shared.stats.lock().clone()
    }

    pub fn loop_count(&self) -> i32 {
        self.shared.loop_count.load(Ordering::SeqCst)
    }

    /// Repeat count for the next [`start`](Self::start); kept across runs.
    pub fn set_loop_count(&self, count: i32) {
        self.shared.loop_count.store(count, Ordering::SeqCst);
    }

    /// Start a run on the current Tokio runtime. Returns `Ok(false)` if one
    /// is already playing.
    pub fn start(&self) -> Result<bool> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| Error::no_runtime())?;

        let mut slot = self.shared.slot.lock();
        if self.is_playing() {
            debug!("start ignored, already playing");
            return Ok(false);
        }
        slot.generation += 1;
        let generation = slot.generation;
        let (stop_tx, stop_rx) = watch::channel(false);
        slot.stop_tx = Some(stop_tx);
        *self.shared.stats.lock() = PlaybackStats::default();
        self.shared.state.send_replace(PlaybackState::Playing);
        drop(slot);

        let loops = self.loop_count();
        info!(
            "playback started ({} actions, {})",
            self.macros.len(),
            describe_loops(loops)
        );
        self.notifier.send(Notification::PlaybackStarted);

        let run = Run {
            player: self.clone(),
            stop: stop_rx,
            loops,
        };
        runtime.spawn(run.execute(generation));
        Ok(true)
    }

    /// Stop the current run. The state is `Stopped` when this returns.
    pub fn stop(&self) {
        let mut slot = self.shared.slot.lock();
        if !self.is_playing() {
            return;
        }
        if let Some(tx) = slot.stop_tx.take() {
            let _ = tx.send(true);
        }
        self.shared.state.send_replace(PlaybackState::Stopped);
        drop(slot);
        info!("playback stopped");
        self.notifier.send(Notification::PlaybackStopped);
    }

    /// Resolves once no run is playing.
    pub async fn wait_stopped(&self) {
        let mut rx = self.subscribe();
        let _ = rx.wait_for(|s| *s == PlaybackState::Stopped).await;
    }

    /// Natural end of run `generation`. A newer run or an explicit stop
    /// already owns the state.
    fn finish(&self, generation: u64) {
        let mut slot = self.shared.slot.lock();
        if slot.generation != generation || !self.is_playing() {
            return;
        }
        slot.stop_tx = None;
        self.shared.state.send_replace(PlaybackState::Stopped);
        drop(slot);
        info!("playback finished: {:?}", self.stats());
        self.notifier.send(Notification::PlaybackStopped);
    }

    fn record(&self, f: impl FnOnce(&mut PlaybackStats)) {
        f(&mut self.shared.stats.lock());
    }
}

fn describe_loops(loops: i32) -> String {
    if loops <= 0 {
        "looping forever".to_string()
    } else {
        format!("{} loop(s)", loops)
    }
}

/// One playback task.
struct Run<D> {
    player: Player<D>,
    stop: watch::Receiver<bool>,
    loops: i32,
}

impl<D: GestureDispatcher + 'static> Run<D> {
    async fn execute(mut self, generation: u64) {
        match self.run_loops().await {
            Ok(()) => self.player.finish(generation),
            Err(e) => debug!("run {}: {}", generation, e),
        }
    }

    async fn run_loops(&mut self) -> Step<()> {
        let config = self.player.config.clone();
        self.pause(config.start_delay).await?;

        let infinite = self.loops <= 0;
        let mut current = 0;
        while infinite || current < self.loops {
            info!("loop {} started", current + 1);
            self.run_once(&config).await?;
            current += 1;
            self.player.record(|s| s.loops_completed += 1);
            if !infinite && current >= self.loops {
                break;
            }
            self.pause(config.loop_pause).await?;
        }
        Ok(())
    }

    /// One pass over a snapshot of the committed actions.
    async fn run_once(&mut self, config: &PlaybackConfig) -> Step<()> {
        let actions = self.player.macros.snapshot();
        debug!("executing {} actions", actions.len());
        for action in &actions {
            self.check()?;
            if !action.enabled {
                continue;
            }
            self.pause(Duration::from_millis(action.delay_before)).await?;
            self.perform(action, config).await?;
            let after = Duration::from_millis(action.delay_after).max(config.min_delay_after);
            self.pause(after).await?;
        }
        Ok(())
    }

    async fn perform(&mut self, action: &Action, config: &PlaybackConfig) -> Step<()> {
        if action.kind == ActionKind::Wait {
            debug!("action {}: wait {}ms", action.id, action.duration);
            self.pause(Duration::from_millis(action.duration)).await?;
            self.player.record(|s| s.waits += 1);
            return Ok(());
        }
        let Some(gesture) = Gesture::for_action(action, &config.strokes) else {
            warn!(
                "action {} ({}) has {} points, skipped",
                action.id,
                action.kind,
                action.points.len()
            );
            return Ok(());
        };
        debug!("action {}: {}", action.id, gesture);
        let dispatcher = self.player.dispatcher.clone();
        self.player.record(|s| s.gestures_dispatched += 1);
        let outcome = self.cancellable(dispatcher.dispatch(gesture)).await?;
        match outcome {
            DispatchOutcome::Completed => self.player.record(|s| s.gestures_completed += 1),
            DispatchOutcome::Cancelled => {
                warn!("gesture for action {} cancelled", action.id);
                self.player.record(|s| s.gestures_failed += 1);
            }
            DispatchOutcome::Failed(reason) => {
                warn!("gesture for action {} failed: {}", action.id, reason);
                self.player.record(|s| s.gestures_failed += 1);
            }
        }
        Ok(())
    }

    fn check(&self) -> Step<()> {
        if *self.stop.borrow() {
            return Err(Interrupt::Stopped);
        }
        Ok(())
    }

    async fn pause(&mut self, duration: Duration) -> Step<()> {
        self.cancellable(tokio::time::sleep(duration)).await
    }

    /// Race `fut` against the stop signal. A dropped sender counts as stop.
    async fn cancellable<F: Future>(&mut self, fut: F) -> Step<F::Output> {
        self.check()?;
        tokio::select! {
            biased;
            _ = stop_signal(&mut self.stop) => Err(Interrupt::Stopped),
            out = fut => Ok(out),
        }
    }
}

async fn stop_signal(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}
