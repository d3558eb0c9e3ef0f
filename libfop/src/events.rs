//! Field-of-play input events and UI output events
//!
//! Inputs ([`FopEvent`]) come from the people running the platform:
//! announcer, timekeeper, referees, the marshal recording weight changes.
//! Outputs ([`UiEvent`]) go to every attached display. Both carry an
//! [`Originator`] so a display can skip the echo of its own action.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fop::FopState;
use crate::types::{Athlete, AthleteId};

/// Opaque token naming the source of an event.
///
/// UI events inherit the originator of the input that caused them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Originator(Uuid);

impl Originator {
    /// Events raised by the runtime itself (timer expiry, group switches).
    pub const SYSTEM: Originator = Originator(Uuid::nil());

    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn is_system(&self) -> bool {
        *self == Self::SYSTEM
    }
}

impl Default for Originator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Originator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_system() {
            write!(f, "system")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// An input event addressed to one field of play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FopEvent {
    pub origin: Originator,
    #[serde(flatten)]
    pub kind: FopEventKind,
}

impl FopEvent {
    pub fn new(origin: Originator, kind: FopEventKind) -> Self {
        Self { origin, kind }
    }

    pub fn system(kind: FopEventKind) -> Self {
        Self::new(Originator::SYSTEM, kind)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FopEventKind {
    /// The announcer has called the current athlete to the bar.
    AthleteAnnounced,

    TimeStartedManually,

    TimeStoppedManually,

    /// The attempt clock ran out.
    TimeOver,

    /// Timekeeper override of the remaining time.
    ForceTime { millis: u64 },

    /// An athlete declared a new weight for their next attempt.
    WeightChange { athlete: AthleteId, weight: u32 },

    /// Two referees agree; shown before the third confirms.
    DownSignal,

    RefereeDecision {
        success: bool,
        ref1: Option<bool>,
        ref2: Option<bool>,
        ref3: Option<bool>,
    },

    DecisionReset,

    /// Break or incident; honoured in any state.
    IntermissionStarted { break_millis: Option<u64> },

    IntermissionDone,
}

impl FopEventKind {
    /// Short snake_case name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AthleteAnnounced => "athlete_announced",
            Self::TimeStartedManually => "time_started_manually",
            Self::TimeStoppedManually => "time_stopped_manually",
            Self::TimeOver => "time_over",
            Self::ForceTime { .. } => "force_time",
            Self::WeightChange { .. } => "weight_change",
            Self::DownSignal => "down_signal",
            Self::RefereeDecision { .. } => "referee_decision",
            Self::DecisionReset => "decision_reset",
            Self::IntermissionStarted { .. } => "intermission_started",
            Self::IntermissionDone => "intermission_done",
        }
    }
}

/// Advisory cues shown to the officials; they never halt the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Advisory {
    /// The timekeeper started the clock before the athlete was announced.
    PrematureTimeStart,
    /// The athlete was announced; the timekeeper must start the clock.
    StartTimeReminder,
    /// The clock is waiting for the announcer to call the athlete.
    AnnounceReminder,
}

/// An output event published to every display of one field of play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiEvent {
    pub origin: Originator,
    pub platform: String,
    #[serde(flatten)]
    pub kind: UiEventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiEventKind {
    LiftingOrderUpdated {
        current: Option<Athlete>,
        next: Option<Athlete>,
        previous: Option<Athlete>,
        lifting_order: Vec<AthleteId>,
        display_order: Vec<AthleteId>,
        time_allowed: u64,
        /// Order refreshed without touching the clock or the attempt board.
        quiet: bool,
    },

    StartTime { remaining: u64 },

    StopTime { remaining: u64 },

    SetTime { remaining: u64 },

    DownSignal,

    RefereeDecision {
        athlete: AthleteId,
        decision: bool,
        ref1: Option<bool>,
        ref2: Option<bool>,
        ref3: Option<bool>,
    },

    DecisionReset,

    BreakStarted { remaining: u64 },

    BreakDone,

    Advisory { advisory: Advisory },

    AdvisoriesCleared,

    /// Recording the decision failed; the officials must resolve it.
    DecisionFailed { athlete: AthleteId, reason: String },

    /// Emitted after every applied transition.
    StateChanged { from: FopState, to: FopState },
}

impl UiEventKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LiftingOrderUpdated { .. } => "lifting_order_updated",
            Self::StartTime { .. } => "start_time",
            Self::StopTime { .. } => "stop_time",
            Self::SetTime { .. } => "set_time",
            Self::DownSignal => "down_signal",
            Self::RefereeDecision { .. } => "referee_decision",
            Self::DecisionReset => "decision_reset",
            Self::BreakStarted { .. } => "break_started",
            Self::BreakDone => "break_done",
            Self::Advisory { .. } => "advisory",
            Self::AdvisoriesCleared => "advisories_cleared",
            Self::DecisionFailed { .. } => "decision_failed",
            Self::StateChanged { .. } => "state_changed",
        }
    }
}

/// Majority outcome of three referee votes.
///
/// Absent votes do not count; with no votes at all the caller's fallback
/// is used.
pub fn majority(ref1: Option<bool>, ref2: Option<bool>, ref3: Option<bool>, fallback: bool) -> bool {
    let votes = [ref1, ref2, ref3];
    let good = votes.iter().filter(|v| **v == Some(true)).count();
    let bad = votes.iter().filter(|v| **v == Some(false)).count();
    if good + bad == 0 {
        fallback
    } else {
        good > bad
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_originator() {
        assert!(Originator::SYSTEM.is_system());
        assert!(!Originator::new().is_system());
        assert_eq!(Originator::SYSTEM.to_string(), "system");
        assert_ne!(Originator::new(), Originator::new());
    }

    #[test]
    fn test_majority() {
        assert!(majority(Some(true), Some(true), Some(false), false));
        assert!(!majority(Some(true), Some(false), Some(false), true));
        assert!(majority(Some(true), None, None, false));
        assert!(majority(None, None, None, true));
        assert!(!majority(None, None, None, false));
    }

    #[test]
    fn test_fop_event_serialization() {
        let origin = Originator::new();
        let event = FopEvent::new(origin, FopEventKind::ForceTime { millis: 30_000 });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"force_time\""));
        assert!(json.contains("30000"));

        let back: FopEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_ui_event_serialization_uses_snake_case_tag() {
        let event = UiEvent {
            origin: Originator::SYSTEM,
            platform: "A".to_string(),
            kind: UiEventKind::Advisory {
                advisory: Advisory::PrematureTimeStart,
            },
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"advisory\""));
        assert!(json.contains("premature_time_start"));
    }

    #[test]
    fn test_event_names_match_serde_tags() {
        let kind = UiEventKind::BreakStarted { remaining: 1 };
        let json = serde_json::to_value(UiEvent {
            origin: Originator::SYSTEM,
            platform: "A".to_string(),
            kind: kind.clone(),
        })
        .unwrap();
        assert_eq!(json["type"], kind.name());

        let kind = FopEventKind::IntermissionStarted { break_millis: None };
        let json = serde_json::to_value(FopEvent::system(kind.clone())).unwrap();
        assert_eq!(json["type"], kind.name());
    }
}
