//! Attempt countdown clock
//!
//! The timer keeps the remaining attempt time for one platform and reports
//! every change to the displays. It never decides what an expiry means: when
//! the time runs out it raises a [`FopEventKind::TimeOver`] input on the
//! platform's input queue and lets the state machine react.
//!
//! Expiry detection is a tokio task sleeping for the remaining time. Every
//! start, stop, reset and expiry bumps an epoch counter; a task that wakes up
//! under an older epoch is stale and is discarded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::bus::{EventBus, InputSender};
use crate::events::{FopEvent, FopEventKind, Originator, UiEvent, UiEventKind};

pub struct CountdownTimer {
    platform: String,
    /// Remaining time as of `started_at` (or frozen value when stopped).
    remaining: u64,
    started_at: Option<Instant>,
    epoch: Arc<AtomicU64>,
    ui_bus: EventBus<UiEvent>,
    inputs: InputSender<FopEvent>,
}

impl CountdownTimer {
    pub fn new(
        platform: impl Into<String>,
        ui_bus: EventBus<UiEvent>,
        inputs: InputSender<FopEvent>,
    ) -> Self {
        Self {
            platform: platform.into(),
            remaining: 0,
            started_at: None,
            epoch: Arc::new(AtomicU64::new(0)),
            ui_bus,
            inputs,
        }
    }

    /// Route future expiries to another input queue.
    pub fn set_inputs(&mut self, inputs: InputSender<FopEvent>) {
        self.inputs = inputs;
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Remaining milliseconds, accounting for time elapsed while running.
    pub fn time_remaining(&self) -> u64 {
        match self.started_at {
            Some(started) => {
                let elapsed = started.elapsed().as_millis() as u64;
                self.remaining.saturating_sub(elapsed)
            }
            None => self.remaining,
        }
    }

    /// Current scheduling epoch; any expiry scheduled under an older value
    /// is ignored.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    pub fn start(&mut self, origin: Originator) {
        if self.is_running() {
            debug!(platform = %self.platform, "timer already running");
        } else {
            self.started_at = Some(Instant::now());
            let epoch = self.bump_epoch();
            self.schedule_expiry(epoch, self.remaining);
        }
        self.emit(origin, UiEventKind::StartTime {
            remaining: self.time_remaining(),
        });
    }

    /// Freeze the remaining time. When not running this only re-emits the
    /// current value.
    pub fn stop(&mut self, origin: Originator) {
        if self.is_running() {
            self.remaining = self.time_remaining();
            self.started_at = None;
            self.bump_epoch();
        }
        self.emit(origin, UiEventKind::StopTime {
            remaining: self.remaining,
        });
    }

    /// Load a new allowance. A running count is cancelled and the new value
    /// stays frozen until the next start.
    pub fn set_time_remaining(&mut self, millis: u64, origin: Originator) {
        self.remaining = millis;
        self.started_at = None;
        self.bump_epoch();
        self.emit(origin, UiEventKind::SetTime { remaining: millis });
    }

    /// Mark the clock as run out.
    pub fn expire(&mut self, origin: Originator) {
        self.remaining = 0;
        self.started_at = None;
        self.bump_epoch();
        self.emit(origin, UiEventKind::StopTime { remaining: 0 });
    }

    fn bump_epoch(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn schedule_expiry(&self, epoch: u64, after_millis: u64) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(platform = %self.platform, "no tokio runtime: timer expiry will not be detected");
            return;
        };

        let current = Arc::clone(&self.epoch);
        let inputs = self.inputs.clone();
        let platform = self.platform.clone();
        handle.spawn(async move {
            tokio::time::sleep(Duration::from_millis(after_millis)).await;
            if current.load(Ordering::SeqCst) == epoch {
                debug!(platform = %platform, epoch, "attempt time over");
                inputs.send(FopEvent::system(FopEventKind::TimeOver));
            } else {
                debug!(platform = %platform, epoch, "discarding stale timer expiry");
            }
        });
    }

    fn emit(&self, origin: Originator, kind: UiEventKind) {
        self.ui_bus.emit(UiEvent {
            origin,
            platform: self.platform.clone(),
            kind,
        });
    }
}
