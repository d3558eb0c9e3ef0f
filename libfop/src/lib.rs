//! Field-of-play runtime for Olympic weightlifting
//!
//! This library drives one or more competition platforms: it keeps the
//! lifting order, runs the attempt clock, applies the two-minute rule and
//! broadcasts every change to the displays attached to a platform.

pub mod bus;
pub mod config;
pub mod error;
pub mod events;
pub mod fop;
pub mod logging;
pub mod order;
pub mod registry;
pub mod repository;
pub mod timer;
pub mod types;

// Re-export commonly used types
pub use bus::{EventBus, EventReceiver, InputReceiver, InputSender};
pub use config::Config;
pub use error::{FopError, Result};
pub use events::{FopEvent, FopEventKind, Originator, UiEvent, UiEventKind};
pub use fop::{Disposition, FieldOfPlay, FopSnapshot, FopState};
pub use registry::{FieldOfPlayRegistry, PlatformHandle};
pub use types::{Athlete, AthleteId, Group};
