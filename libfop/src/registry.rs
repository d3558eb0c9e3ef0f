//! Platform runtime and registry
//!
//! A [`PlatformHandle`] owns one [`FieldOfPlay`] behind an async mutex and a
//! tokio task that drains the platform's input queue. Officials' controls
//! and the attempt timer publish on that queue; the task applies the events
//! one at a time, so every mutation of a platform happens in a single
//! logical thread of control. The queue is unbounded: an input is never
//! dropped because the loop fell behind.
//!
//! The [`FieldOfPlayRegistry`] maps platform names to their handles. It is
//! an ordinary object built at startup and passed to whoever needs it.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use libfop::events::{FopEventKind, Originator};
//! use libfop::repository::memory::InMemoryAthleteRepository;
//! use libfop::{Config, FieldOfPlayRegistry};
//!
//! # async fn example() -> libfop::Result<()> {
//! let config = Config::default_config();
//! let registry =
//!     FieldOfPlayRegistry::from_config(&config, Arc::new(InMemoryAthleteRepository::new()))?;
//!
//! let platform = registry.get("A")?;
//! let mut displays = platform.subscribe_ui();
//! platform.dispatch(Originator::new(), FopEventKind::IntermissionDone);
//!
//! if let Ok(event) = displays.recv().await {
//!     println!("{}", event.kind.name());
//! }
//! registry.shutdown().await;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::{watch, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::bus::{EventBus, EventReceiver, InputReceiver, InputSender};
use crate::config::Config;
use crate::error::{FopError, Result};
use crate::events::{FopEvent, FopEventKind, Originator, UiEvent};
use crate::fop::{FieldOfPlay, FopSnapshot};
use crate::repository::AthleteRepository;
use crate::types::{Athlete, Group};

/// Running field of play.
///
/// Cloning the input sender and the UI bus is cheap; the handle itself is
/// not `Clone` because it owns the event loop task.
pub struct PlatformHandle {
    name: String,
    fop: Arc<Mutex<FieldOfPlay>>,
    inputs: InputSender<FopEvent>,
    ui_bus: EventBus<UiEvent>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PlatformHandle {
    /// Start the event loop for `fop`.
    ///
    /// Must be called from within a tokio runtime. The loop takes over the
    /// field of play's input queue, so inputs queued before the call are
    /// applied too.
    pub fn spawn(mut fop: FieldOfPlay) -> Self {
        let name = fop.name().to_string();
        let receiver = fop.input_receiver();
        let inputs = fop.inputs().clone();
        let ui_bus = fop.ui_bus().clone();
        let fop = Arc::new(Mutex::new(fop));
        let (shutdown, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(run_event_loop(
            name.clone(),
            Arc::clone(&fop),
            receiver,
            shutdown_rx,
        ));

        info!("platform {} started", name);

        Self {
            name,
            fop,
            inputs,
            ui_bus,
            shutdown,
            task,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue an input event for the platform.
    ///
    /// Returns immediately; the event loop applies it in arrival order.
    /// Returns `false` once the loop has stopped.
    pub fn dispatch(&self, origin: Originator, kind: FopEventKind) -> bool {
        self.inputs.send(FopEvent::new(origin, kind))
    }

    /// Input queue, for components that publish on their own.
    pub fn inputs(&self) -> &InputSender<FopEvent> {
        &self.inputs
    }

    /// Attach a display.
    pub fn subscribe_ui(&self) -> EventReceiver<UiEvent> {
        self.ui_bus.subscribe()
    }

    pub async fn snapshot(&self) -> FopSnapshot {
        self.fop.lock().await.snapshot()
    }

    /// Current roster copies, in lifting order.
    pub async fn lifting_order(&self) -> Vec<Athlete> {
        self.fop.lock().await.lifting_order().to_vec()
    }

    /// Exclusive access to the field of play.
    ///
    /// Events are not applied while the guard is held.
    pub async fn lock(&self) -> MutexGuard<'_, FieldOfPlay> {
        self.fop.lock().await
    }

    pub async fn switch_group(&self, group: Option<Group>, roster: Vec<Athlete>) {
        self.fop.lock().await.switch_group(group, roster);
    }

    pub async fn set_start_time_automatically(&self, automatic: bool) {
        self.fop.lock().await.set_start_time_automatically(automatic);
    }

    /// Stop the event loop once the queued events are applied and wait for
    /// it to finish.
    pub async fn shutdown(self) {
        // The loop may already be gone; a failed send is fine.
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            error!("platform {}: event loop ended abnormally: {}", self.name, e);
        }
        info!("platform {} stopped", self.name);
    }
}

async fn run_event_loop(
    name: String,
    fop: Arc<Mutex<FieldOfPlay>>,
    mut events: InputReceiver<FopEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        // Queued events are drained before a shutdown request is honoured.
        tokio::select! {
            biased;
            received = events.recv() => match received {
                Some(event) => {
                    let mut fop = fop.lock().await;
                    if let Err(e) = fop.handle_event(event) {
                        error!("platform {}: {}", name, e);
                    }
                }
                None => break,
            },
            _ = shutdown.changed() => {
                debug!("platform {}: event loop shutting down", name);
                break;
            }
        }
    }
}

/// All platforms of a competition, by name.
#[derive(Default)]
pub struct FieldOfPlayRegistry {
    platforms: BTreeMap<String, PlatformHandle>,
}

impl FieldOfPlayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start one field of play per configured platform, sharing
    /// `repository`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_config(config: &Config, repository: Arc<dyn AthleteRepository>) -> Result<Self> {
        config.validate()?;

        let mut registry = Self::new();
        for platform in &config.platforms {
            let fop = FieldOfPlay::from_config(platform, config, Arc::clone(&repository));
            registry.register(fop)?;
        }
        Ok(registry)
    }

    /// Start `fop` and add it under its own name.
    pub fn register(&mut self, fop: FieldOfPlay) -> Result<&PlatformHandle> {
        let name = fop.name().to_string();
        if self.platforms.contains_key(&name) {
            return Err(FopError::DuplicatePlatform(name));
        }

        let handle = PlatformHandle::spawn(fop);
        Ok(self.platforms.entry(name).or_insert(handle))
    }

    pub fn get(&self, name: &str) -> Result<&PlatformHandle> {
        self.platforms
            .get(name)
            .ok_or_else(|| FopError::UnknownPlatform(name.to_string()))
    }

    /// Platform names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.platforms.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }

    /// Stop every platform's event loop.
    pub async fn shutdown(self) {
        for (_, handle) in self.platforms {
            handle.shutdown().await;
        }
    }
}
