//! Field-of-play state machine
//!
//! One [`FieldOfPlay`] exists per competition platform. It owns the lifting
//! order, the current and previous athlete, clock ownership and the attempt
//! timer, and it is the only component allowed to change them.
//!
//! # Flow of one attempt
//!
//! ```text
//! Intermission ──IntermissionDone──▶ CurrentAthleteDisplayed
//!        │                                   │ AthleteAnnounced
//!        │                 ┌─────────────────┴──────────────────┐
//!        │       (manual start)                        (automatic start)
//!        │   AnnouncerWaitingForTimekeeper                      │
//!        │                 │ TimeStartedManually                │
//!        │                 └──────────────▶ TimeRunning ◀───────┘
//!        │                                    │ DownSignal
//!        │                              DownSignalVisible
//!        │                                    │ RefereeDecision
//!        │                              DecisionVisible
//!        │                                    │ DecisionReset
//!        └───────────────────────────▶ CurrentAthleteDisplayed ...
//! ```
//!
//! `IntermissionStarted` is honoured from every state. Any event the
//! current state does not expect is logged and ignored.
//!
//! Every path that changes who is up or how much time they have goes
//! through [`FieldOfPlay::recompute_lifting_order`], which seeds the timer
//! before announcing the new order, so displays never see an order paired
//! with a stale clock.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::bus::{input_queue, EventBus, InputReceiver, InputSender};
use crate::config::{Config, PlatformConfig, TimingConfig, DEFAULT_BUS_CAPACITY};
use crate::error::Result;
use crate::events::{
    majority, Advisory, FopEvent, FopEventKind, Originator, UiEvent, UiEventKind,
};
use crate::order::{LiftingOrderProvider, StandardLiftingOrder};
use crate::repository::AthleteRepository;
use crate::timer::CountdownTimer;
use crate::types::{Athlete, AthleteId, Group};

/// States of the field-of-play machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FopState {
    Intermission,
    CurrentAthleteDisplayed,
    AnnouncerWaitingForTimekeeper,
    TimekeeperWaitingForAnnouncer,
    TimeRunning,
    TimeStopped,
    DownSignalVisible,
    DecisionVisible,
}

impl FopState {
    pub const ALL: [FopState; 8] = [
        FopState::Intermission,
        FopState::CurrentAthleteDisplayed,
        FopState::AnnouncerWaitingForTimekeeper,
        FopState::TimekeeperWaitingForAnnouncer,
        FopState::TimeRunning,
        FopState::TimeStopped,
        FopState::DownSignalVisible,
        FopState::DecisionVisible,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Intermission => "INTERMISSION",
            Self::CurrentAthleteDisplayed => "CURRENT_ATHLETE_DISPLAYED",
            Self::AnnouncerWaitingForTimekeeper => "ANNOUNCER_WAITING_FOR_TIMEKEEPER",
            Self::TimekeeperWaitingForAnnouncer => "TIMEKEEPER_WAITING_FOR_ANNOUNCER",
            Self::TimeRunning => "TIME_RUNNING",
            Self::TimeStopped => "TIME_STOPPED",
            Self::DownSignalVisible => "DOWN_SIGNAL_VISIBLE",
            Self::DecisionVisible => "DECISION_VISIBLE",
        }
    }
}

impl std::fmt::Display for FopState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What `handle_event` did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The event was part of the transition table (`from` may equal `to`).
    Applied { from: FopState, to: FopState },
    /// The event was not expected in the current state; nothing changed.
    Ignored,
}

/// Read-only view of a field of play, for displays and tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FopSnapshot {
    pub name: String,
    pub state: FopState,
    pub group: Option<String>,
    pub current_athlete: Option<AthleteId>,
    pub previous_athlete: Option<AthleteId>,
    pub clock_owner: Option<AthleteId>,
    pub lifting_order: Vec<AthleteId>,
    pub display_order: Vec<AthleteId>,
    pub time_allowed: u64,
    pub time_remaining: u64,
    pub timer_running: bool,
    pub start_time_automatically: bool,
    pub referee_decisions_enabled: bool,
}

pub struct FieldOfPlay {
    name: String,
    group: Option<Group>,
    roster: Vec<Athlete>,
    lifting_order: Vec<Athlete>,
    display_order: Vec<Athlete>,
    current_athlete: Option<Athlete>,
    previous_athlete: Option<Athlete>,
    clock_owner: Option<AthleteId>,
    state: FopState,
    start_time_automatically: bool,
    referee_decisions_enabled: bool,
    /// Athlete whose attempt is on the decision board, for reversals.
    decided: Option<AthleteId>,
    /// Athlete whose allowance is loaded on the timer.
    timed: Option<AthleteId>,
    /// Time the clock owner had left when the timer was handed to someone
    /// else.
    owner_remaining: u64,
    time_allowed: u64,
    timing: TimingConfig,
    timer: CountdownTimer,
    order_provider: Arc<dyn LiftingOrderProvider>,
    repository: Arc<dyn AthleteRepository>,
    ui_bus: EventBus<UiEvent>,
    inputs: InputSender<FopEvent>,
    input_receiver: Option<InputReceiver<FopEvent>>,
}

impl FieldOfPlay {
    /// Create a field of play with default timing and the standard order.
    pub fn new(name: impl Into<String>, repository: Arc<dyn AthleteRepository>) -> Self {
        Self::with_bus_capacity(name, repository, DEFAULT_BUS_CAPACITY)
    }

    /// Create the field of play described by one `[[platforms]]` entry.
    pub fn from_config(
        platform: &PlatformConfig,
        config: &Config,
        repository: Arc<dyn AthleteRepository>,
    ) -> Self {
        Self::with_bus_capacity(platform.name.clone(), repository, config.bus.capacity)
            .with_timing(config.timing)
            .with_start_time_automatically(platform.start_time_automatically)
    }

    fn with_bus_capacity(
        name: impl Into<String>,
        repository: Arc<dyn AthleteRepository>,
        capacity: usize,
    ) -> Self {
        let name = name.into();
        let ui_bus = EventBus::new(capacity);
        let (inputs, input_receiver) = input_queue();
        let timing = TimingConfig::default();
        Self {
            timer: CountdownTimer::new(name.clone(), ui_bus.clone(), inputs.clone()),
            name,
            group: None,
            roster: Vec::new(),
            lifting_order: Vec::new(),
            display_order: Vec::new(),
            current_athlete: None,
            previous_athlete: None,
            clock_owner: None,
            state: FopState::Intermission,
            start_time_automatically: false,
            referee_decisions_enabled: false,
            decided: None,
            timed: None,
            owner_remaining: 0,
            time_allowed: timing.attempt_millis,
            timing,
            order_provider: Arc::new(StandardLiftingOrder),
            repository,
            ui_bus,
            inputs,
            input_receiver: Some(input_receiver),
        }
    }

    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self.time_allowed = timing.attempt_millis;
        self
    }

    pub fn with_start_time_automatically(mut self, automatic: bool) -> Self {
        self.start_time_automatically = automatic;
        self
    }

    pub fn with_order_provider(mut self, provider: Arc<dyn LiftingOrderProvider>) -> Self {
        self.order_provider = provider;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> FopState {
        self.state
    }

    pub fn group(&self) -> Option<&Group> {
        self.group.as_ref()
    }

    pub fn roster(&self) -> &[Athlete] {
        &self.roster
    }

    pub fn lifting_order(&self) -> &[Athlete] {
        &self.lifting_order
    }

    pub fn display_order(&self) -> &[Athlete] {
        &self.display_order
    }

    pub fn current_athlete(&self) -> Option<&Athlete> {
        self.current_athlete.as_ref()
    }

    pub fn previous_athlete(&self) -> Option<&Athlete> {
        self.previous_athlete.as_ref()
    }

    pub fn clock_owner(&self) -> Option<AthleteId> {
        self.clock_owner
    }

    /// Allowance computed by the last lifting-order recompute.
    pub fn time_allowed(&self) -> u64 {
        self.time_allowed
    }

    pub fn timer(&self) -> &CountdownTimer {
        &self.timer
    }

    pub fn start_time_automatically(&self) -> bool {
        self.start_time_automatically
    }

    pub fn set_start_time_automatically(&mut self, automatic: bool) {
        self.start_time_automatically = automatic;
    }

    pub fn referee_decisions_enabled(&self) -> bool {
        self.referee_decisions_enabled
    }

    /// Output bus; displays subscribe here.
    pub fn ui_bus(&self) -> &EventBus<UiEvent> {
        &self.ui_bus
    }

    /// Input queue; officials' controls and the timer publish here.
    pub fn inputs(&self) -> &InputSender<FopEvent> {
        &self.inputs
    }

    /// Hand out the consuming end of the input queue.
    ///
    /// The first call returns the queue created with the field of play.
    /// Later calls open a fresh queue, reroute the timer to it and leave the
    /// previous consumer disconnected.
    pub fn input_receiver(&mut self) -> InputReceiver<FopEvent> {
        if let Some(receiver) = self.input_receiver.take() {
            return receiver;
        }
        let (inputs, receiver) = input_queue();
        self.timer.set_inputs(inputs.clone());
        self.inputs = inputs;
        receiver
    }

    pub fn snapshot(&self) -> FopSnapshot {
        FopSnapshot {
            name: self.name.clone(),
            state: self.state,
            group: self.group.as_ref().map(|g| g.name.clone()),
            current_athlete: self.current_athlete.as_ref().map(|a| a.id),
            previous_athlete: self.previous_athlete.as_ref().map(|a| a.id),
            clock_owner: self.clock_owner,
            lifting_order: self.lifting_order.iter().map(|a| a.id).collect(),
            display_order: self.display_order.iter().map(|a| a.id).collect(),
            time_allowed: self.time_allowed,
            time_remaining: self.timer.time_remaining(),
            timer_running: self.timer.is_running(),
            start_time_automatically: self.start_time_automatically,
            referee_decisions_enabled: self.referee_decisions_enabled,
        }
    }

    /// Replace the group being lifted.
    ///
    /// Keeps identity and subscribers; resets order, athletes and clock and
    /// re-enters `Intermission`.
    pub fn switch_group(&mut self, group: Option<Group>, roster: Vec<Athlete>) {
        info!(
            "platform {}: switching to group {}",
            self.name,
            group.as_ref().map(|g| g.name.as_str()).unwrap_or("<none>")
        );

        if self.timer.is_running() {
            self.timer.stop(Originator::SYSTEM);
        }
        self.group = group;
        self.roster = roster;
        self.previous_athlete = None;
        self.clock_owner = None;
        self.referee_decisions_enabled = false;
        self.decided = None;
        self.timed = None;
        self.owner_remaining = 0;
        self.set_state(FopState::Intermission, Originator::SYSTEM);
        self.recompute_lifting_order(Originator::SYSTEM);
    }

    /// Process one input event.
    ///
    /// Returns `Disposition::Ignored` for events the current state does not
    /// expect. The only error is a repository failure while recording a
    /// decision, in which case the machine stays where it was.
    pub fn handle_event(&mut self, event: FopEvent) -> Result<Disposition> {
        use FopEventKind as E;
        use FopState as S;

        let from = self.state;
        let origin = event.origin;
        let event_name = event.kind.name();
        debug!(platform = %self.name, state = %from, event = event_name, origin = %origin, "handling event");

        if let E::IntermissionStarted { break_millis } = event.kind {
            self.start_intermission(origin, break_millis);
            return Ok(self.applied(from));
        }

        let handled = match (from, event.kind) {
            (S::Intermission, E::IntermissionDone) => {
                self.emit(origin, UiEventKind::BreakDone);
                self.recompute_lifting_order(origin);
                self.set_state(S::CurrentAthleteDisplayed, origin);
                true
            }
            (S::Intermission | S::CurrentAthleteDisplayed, E::AthleteAnnounced) => {
                self.announce(origin)
            }
            (
                S::Intermission
                | S::CurrentAthleteDisplayed
                | S::AnnouncerWaitingForTimekeeper
                | S::TimekeeperWaitingForAnnouncer,
                E::WeightChange { athlete, weight },
            ) => {
                if self.change_weight(athlete, weight) {
                    self.recompute_lifting_order(origin);
                    true
                } else {
                    false
                }
            }
            (S::CurrentAthleteDisplayed, E::TimeStartedManually) => {
                self.emit_advisory(origin, Advisory::PrematureTimeStart);
                self.emit_advisory(origin, Advisory::AnnounceReminder);
                self.set_state(S::TimekeeperWaitingForAnnouncer, origin);
                true
            }
            (S::CurrentAthleteDisplayed, E::ForceTime { millis }) => {
                self.timer.set_time_remaining(millis, origin);
                true
            }
            (S::AnnouncerWaitingForTimekeeper, E::TimeStartedManually) => {
                self.emit(origin, UiEventKind::AdvisoriesCleared);
                self.timer.start(origin);
                self.transition_to_time_running(origin);
                true
            }
            (S::TimekeeperWaitingForAnnouncer, E::AthleteAnnounced) => {
                self.emit(origin, UiEventKind::AdvisoriesCleared);
                self.timer.start(origin);
                self.transition_to_time_running(origin);
                true
            }
            (S::TimekeeperWaitingForAnnouncer, E::TimeStartedManually) => {
                debug!(platform = %self.name, "timekeeper already waiting for the announcer");
                true
            }
            (S::TimeRunning, E::DownSignal) => {
                self.timer.stop(origin);
                self.emit(origin, UiEventKind::DownSignal);
                self.set_state(S::DownSignalVisible, origin);
                true
            }
            (S::TimeRunning, E::TimeStoppedManually) => {
                self.timer.stop(origin);
                self.set_state(S::TimeStopped, origin);
                true
            }
            (S::TimeRunning, E::TimeOver) => {
                self.timer.expire(origin);
                self.set_state(S::TimeStopped, origin);
                true
            }
            (S::TimeRunning, E::WeightChange { athlete, weight }) => {
                if !self.change_weight(athlete, weight) {
                    false
                } else if self.is_current(athlete) {
                    self.timer.stop(origin);
                    self.recompute_lifting_order(origin);
                    self.set_state(S::CurrentAthleteDisplayed, origin);
                    true
                } else {
                    self.recompute_quietly(origin);
                    true
                }
            }
            (S::TimeStopped, E::TimeStartedManually) => {
                self.timer.start(origin);
                self.transition_to_time_running(origin);
                true
            }
            (S::TimeStopped, E::WeightChange { athlete, weight }) => {
                if !self.change_weight(athlete, weight) {
                    false
                } else if self.is_current(athlete) {
                    self.recompute_lifting_order(origin);
                    self.set_state(S::CurrentAthleteDisplayed, origin);
                    true
                } else {
                    self.recompute_quietly(origin);
                    true
                }
            }
            (S::TimeStopped, E::ForceTime { millis }) => {
                self.timer.set_time_remaining(millis, origin);
                self.set_state(S::CurrentAthleteDisplayed, origin);
                true
            }
            (
                S::TimeStopped | S::DownSignalVisible,
                E::RefereeDecision {
                    success,
                    ref1,
                    ref2,
                    ref3,
                },
            ) if self.referee_decisions_enabled => {
                self.timer.stop(origin);
                self.decision(origin, success, ref1, ref2, ref3)?
            }
            (
                S::DecisionVisible,
                E::RefereeDecision {
                    success,
                    ref1,
                    ref2,
                    ref3,
                },
            ) if self.referee_decisions_enabled => self.decision(origin, success, ref1, ref2, ref3)?,
            (S::DownSignalVisible | S::DecisionVisible, E::WeightChange { athlete, weight }) => {
                if self.change_weight(athlete, weight) {
                    self.recompute_quietly(origin);
                    true
                } else {
                    false
                }
            }
            (S::DecisionVisible, E::DecisionReset) => {
                self.emit(origin, UiEventKind::DecisionReset);
                self.clock_owner = None;
                self.referee_decisions_enabled = false;
                self.decided = None;
                self.recompute_lifting_order(origin);
                self.set_state(S::CurrentAthleteDisplayed, origin);
                true
            }
            _ => false,
        };

        if handled {
            Ok(self.applied(from))
        } else {
            warn!(
                platform = %self.name,
                state = %from,
                event = event_name,
                origin = %origin,
                "unexpected event ignored"
            );
            Ok(Disposition::Ignored)
        }
    }

    /// Re-sort the roster, seed the timer with the new allowance and tell
    /// every display.
    pub fn recompute_lifting_order(&mut self, origin: Originator) {
        if self.clock_owner.is_some() && self.timed == self.clock_owner {
            self.owner_remaining = self.timer.time_remaining();
        }
        self.reorder();
        self.time_allowed = self.compute_time_allowed();
        self.timer.set_time_remaining(self.time_allowed, origin);
        self.timed = self.current_athlete.as_ref().map(|a| a.id);
        self.emit_lifting_order(origin, false);
    }

    /// Time allowed for the current athlete ("two-minute rule").
    ///
    /// An athlete called twice in a row, with nobody else's clock running
    /// in between, gets the consecutive allowance; an athlete who already
    /// owns the clock keeps whatever is left on it.
    pub fn compute_time_allowed(&self) -> u64 {
        let Some(current) = &self.current_athlete else {
            return self.timing.attempt_millis;
        };

        if self.clock_owner == Some(current.id) {
            if self.timed == Some(current.id) {
                self.timer.time_remaining()
            } else {
                self.owner_remaining
            }
        } else if self
            .previous_athlete
            .as_ref()
            .is_some_and(|previous| previous.same_as(current))
        {
            if self.clock_owner.is_some() {
                self.timing.attempt_millis
            } else {
                self.timing.consecutive_attempt_millis
            }
        } else {
            self.timing.attempt_millis
        }
    }

    /// Refresh orders without disturbing the clock or the attempt display.
    ///
    /// The athlete on the platform stays current even when the new order
    /// puts someone else first; the next loud recompute catches up.
    fn recompute_quietly(&mut self, origin: Originator) {
        self.sort_orders();
        if let Some(id) = self.current_athlete.as_ref().map(|a| a.id) {
            if let Some(fresh) = self.roster.iter().find(|a| a.id == id) {
                self.current_athlete = Some(fresh.clone());
            }
        }
        self.emit_lifting_order(origin, true);
    }

    fn reorder(&mut self) {
        self.sort_orders();
        self.current_athlete = self.lifting_order.first().cloned();
    }

    fn sort_orders(&mut self) {
        self.lifting_order = self.order_provider.sort(&self.roster);
        self.display_order = self.order_provider.display_order(&self.lifting_order);
    }

    fn announce(&mut self, origin: Originator) -> bool {
        match &self.current_athlete {
            Some(athlete) if !athlete.is_done() => {}
            _ => {
                warn!(platform = %self.name, "announcement with no athlete due");
                return false;
            }
        }

        if self.start_time_automatically {
            self.timer.start(origin);
            self.transition_to_time_running(origin);
        } else {
            self.emit_advisory(origin, Advisory::StartTimeReminder);
            self.set_state(FopState::AnnouncerWaitingForTimekeeper, origin);
        }
        true
    }

    fn transition_to_time_running(&mut self, origin: Originator) {
        self.clock_owner = self.current_athlete.as_ref().map(|a| a.id);
        self.referee_decisions_enabled = true;
        self.set_state(FopState::TimeRunning, origin);
    }

    /// Record the referees' decision against the current athlete.
    ///
    /// Nothing is committed and no decision is shown unless the repository
    /// stored the result.
    fn decision(
        &mut self,
        origin: Originator,
        success: bool,
        ref1: Option<bool>,
        ref2: Option<bool>,
        ref3: Option<bool>,
    ) -> Result<bool> {
        let Some(current) = self.current_athlete.clone() else {
            warn!(platform = %self.name, "decision with no current athlete");
            return Ok(false);
        };

        let decision = majority(ref1, ref2, ref3, success);
        let reversal = self.decided == Some(current.id);
        let stored = if reversal {
            self.repository.amend_last_lift(&current, decision)
        } else {
            self.repository.record_lift(&current, decision)
        };

        let updated = match stored {
            Ok(updated) => updated,
            Err(e) => {
                error!(
                    platform = %self.name,
                    athlete = %current.id,
                    repository = self.repository.name(),
                    "failed to record decision: {}",
                    e
                );
                self.emit(
                    origin,
                    UiEventKind::DecisionFailed {
                        athlete: current.id,
                        reason: e.to_string(),
                    },
                );
                return Err(e.into());
            }
        };

        info!(
            "platform {}: {} {} for {}",
            self.name,
            if reversal { "decision reversed to" } else { "decision" },
            if decision { "good lift" } else { "no lift" },
            current.name
        );
        match self.repository.next_requested_weight(&updated) {
            Ok(0) => debug!(platform = %self.name, athlete = %updated.id, "no attempt left"),
            Ok(kg) => debug!(platform = %self.name, athlete = %updated.id, "next attempt at {} kg", kg),
            Err(e) => warn!(
                platform = %self.name,
                athlete = %updated.id,
                "stored record has no next weight: {}",
                e
            ),
        }

        self.replace_athlete(&updated);
        self.previous_athlete = Some(updated.clone());
        self.current_athlete = Some(updated);
        self.clock_owner = None;
        self.decided = Some(current.id);

        self.emit(
            origin,
            UiEventKind::RefereeDecision {
                athlete: current.id,
                decision,
                ref1,
                ref2,
                ref3,
            },
        );
        self.set_state(FopState::DecisionVisible, origin);
        Ok(true)
    }

    fn start_intermission(&mut self, origin: Originator, break_millis: Option<u64>) {
        if self.timer.is_running() {
            self.timer.stop(origin);
        }
        self.clock_owner = None;
        self.referee_decisions_enabled = false;
        self.decided = None;
        self.emit(
            origin,
            UiEventKind::BreakStarted {
                remaining: break_millis.unwrap_or(self.timing.default_break_millis),
            },
        );
        self.set_state(FopState::Intermission, origin);
    }

    fn is_current(&self, athlete: AthleteId) -> bool {
        self.current_athlete
            .as_ref()
            .is_some_and(|current| current.id == athlete)
    }

    /// Apply a declared weight to the roster copy of `athlete`.
    ///
    /// Only the next attempt's requested weight changes; judged attempts
    /// are never touched.
    fn change_weight(&mut self, athlete: AthleteId, weight: u32) -> bool {
        let Some(slot) = self.roster.iter_mut().find(|a| a.id == athlete) else {
            warn!(
                platform = %self.name,
                athlete = %athlete,
                "weight change for an athlete outside the current group"
            );
            return false;
        };
        if !slot.change_weight(weight) {
            warn!(
                platform = %self.name,
                athlete = %athlete,
                "weight change for an athlete with no attempt left"
            );
            return false;
        }
        info!("platform {}: {} declares {} kg", self.name, slot.name, weight);
        true
    }

    fn replace_athlete(&mut self, athlete: &Athlete) -> bool {
        match self.roster.iter_mut().find(|a| a.same_as(athlete)) {
            Some(slot) => {
                *slot = athlete.clone();
                true
            }
            None => false,
        }
    }

    fn set_state(&mut self, to: FopState, origin: Originator) {
        let from = self.state;
        if from == to {
            return;
        }
        info!("platform {}: {} -> {}", self.name, from, to);
        self.state = to;
        self.emit(origin, UiEventKind::StateChanged { from, to });
    }

    fn applied(&self, from: FopState) -> Disposition {
        Disposition::Applied {
            from,
            to: self.state,
        }
    }

    fn emit_lifting_order(&self, origin: Originator, quiet: bool) {
        self.emit(
            origin,
            UiEventKind::LiftingOrderUpdated {
                current: self.current_athlete.clone(),
                next: self.next_athlete(),
                previous: self.previous_athlete.clone(),
                lifting_order: self.lifting_order.iter().map(|a| a.id).collect(),
                display_order: self.display_order.iter().map(|a| a.id).collect(),
                time_allowed: self.time_allowed,
                quiet,
            },
        );
    }

    /// First athlete in the lifting order other than the current one.
    fn next_athlete(&self) -> Option<Athlete> {
        self.lifting_order
            .iter()
            .find(|a| !self.is_current(a.id))
            .cloned()
    }

    fn emit_advisory(&self, origin: Originator, advisory: Advisory) {
        self.emit(origin, UiEventKind::Advisory { advisory });
    }

    fn emit(&self, origin: Originator, kind: UiEventKind) {
        self.ui_bus.emit(UiEvent {
            origin,
            platform: self.name.clone(),
            kind,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::mock::MockAthleteRepository;
    use tokio::sync::broadcast::error::TryRecvError;

    fn platform(roster: Vec<Athlete>) -> FieldOfPlay {
        let mut fop = FieldOfPlay::new("A", Arc::new(MockAthleteRepository::new()));
        fop.switch_group(Some(Group::new("M1")), roster);
        fop
    }

    fn event(kind: FopEventKind) -> FopEvent {
        FopEvent::new(Originator::new(), kind)
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_state_is_intermission() {
        let fop = FieldOfPlay::new("A", Arc::new(MockAthleteRepository::new()));
        assert_eq!(fop.state(), FopState::Intermission);
        assert!(fop.current_athlete().is_none());
        assert_eq!(fop.time_allowed(), 60_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_switch_group_recomputes_order() {
        let light = Athlete::new("Light", 2).with_openers(70, 90);
        let heavy = Athlete::new("Heavy", 1).with_openers(90, 110);
        let fop = platform(vec![heavy.clone(), light.clone()]);

        assert_eq!(fop.state(), FopState::Intermission);
        assert_eq!(fop.current_athlete().unwrap().id, light.id);
        assert_eq!(fop.snapshot().lifting_order, vec![light.id, heavy.id]);
        assert_eq!(fop.timer().time_remaining(), 60_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_start_before_announcement() {
        let athlete = Athlete::new("Ana", 1).with_openers(80, 100);
        let mut fop = platform(vec![athlete]);
        fop.handle_event(event(FopEventKind::IntermissionDone)).unwrap();
        let mut ui = fop.ui_bus().subscribe();

        fop.handle_event(event(FopEventKind::TimeStartedManually)).unwrap();
        assert_eq!(fop.state(), FopState::TimekeeperWaitingForAnnouncer);
        assert!(!fop.timer().is_running());

        let kinds: Vec<UiEventKind> = std::iter::from_fn(|| ui.try_recv().ok()).map(|e| e.kind).collect();
        assert!(kinds.contains(&UiEventKind::Advisory {
            advisory: Advisory::PrematureTimeStart
        }));
        assert!(kinds.contains(&UiEventKind::Advisory {
            advisory: Advisory::AnnounceReminder
        }));

        fop.handle_event(event(FopEventKind::AthleteAnnounced)).unwrap();
        assert_eq!(fop.state(), FopState::TimeRunning);
        assert!(fop.timer().is_running());
        assert!(fop.referee_decisions_enabled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_announcement_waits_for_timekeeper() {
        let athlete = Athlete::new("Ana", 1).with_openers(80, 100);
        let mut fop = platform(vec![athlete.clone()]);
        fop.handle_event(event(FopEventKind::IntermissionDone)).unwrap();

        fop.handle_event(event(FopEventKind::AthleteAnnounced)).unwrap();
        assert_eq!(fop.state(), FopState::AnnouncerWaitingForTimekeeper);
        assert_eq!(fop.clock_owner(), None);

        fop.handle_event(event(FopEventKind::TimeStartedManually)).unwrap();
        assert_eq!(fop.state(), FopState::TimeRunning);
        assert_eq!(fop.clock_owner(), Some(athlete.id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_announcement_with_empty_group_is_ignored() {
        let mut fop = platform(vec![]);
        fop.handle_event(event(FopEventKind::IntermissionDone)).unwrap();

        let outcome = fop.handle_event(event(FopEventKind::AthleteAnnounced)).unwrap();
        assert_eq!(outcome, Disposition::Ignored);
        assert_eq!(fop.state(), FopState::CurrentAthleteDisplayed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_time_over_stops_clock() {
        let athlete = Athlete::new("Ana", 1).with_openers(80, 100);
        let mut fop = platform(vec![athlete]).with_start_time_automatically(true);
        fop.handle_event(event(FopEventKind::IntermissionDone)).unwrap();
        fop.handle_event(event(FopEventKind::AthleteAnnounced)).unwrap();

        fop.handle_event(FopEvent::system(FopEventKind::TimeOver)).unwrap();

        assert_eq!(fop.state(), FopState::TimeStopped);
        assert_eq!(fop.timer().time_remaining(), 0);
        assert!(!fop.timer().is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_time_when_stopped_returns_to_display() {
        let athlete = Athlete::new("Ana", 1).with_openers(80, 100);
        let mut fop = platform(vec![athlete]).with_start_time_automatically(true);
        fop.handle_event(event(FopEventKind::IntermissionDone)).unwrap();
        fop.handle_event(event(FopEventKind::AthleteAnnounced)).unwrap();
        fop.handle_event(event(FopEventKind::TimeStoppedManually)).unwrap();

        fop.handle_event(event(FopEventKind::ForceTime { millis: 45_000 })).unwrap();

        assert_eq!(fop.state(), FopState::CurrentAthleteDisplayed);
        assert_eq!(fop.timer().time_remaining(), 45_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_intermission_from_running_clock() {
        let athlete = Athlete::new("Ana", 1).with_openers(80, 100);
        let mut fop = platform(vec![athlete]).with_start_time_automatically(true);
        fop.handle_event(event(FopEventKind::IntermissionDone)).unwrap();
        fop.handle_event(event(FopEventKind::AthleteAnnounced)).unwrap();
        let mut ui = fop.ui_bus().subscribe();

        fop.handle_event(event(FopEventKind::IntermissionStarted {
            break_millis: Some(300_000),
        }))
        .unwrap();

        assert_eq!(fop.state(), FopState::Intermission);
        assert_eq!(fop.clock_owner(), None);
        assert!(!fop.timer().is_running());
        assert!(!fop.referee_decisions_enabled());

        let kinds: Vec<UiEventKind> = std::iter::from_fn(|| ui.try_recv().ok()).map(|e| e.kind).collect();
        assert!(kinds.contains(&UiEventKind::BreakStarted { remaining: 300_000 }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ui_events_carry_originator() {
        let athlete = Athlete::new("Ana", 1).with_openers(80, 100);
        let mut fop = platform(vec![athlete]);
        let mut ui = fop.ui_bus().subscribe();
        let origin = Originator::new();

        fop.handle_event(FopEvent::new(origin, FopEventKind::IntermissionDone))
            .unwrap();

        let mut seen = 0;
        loop {
            match ui.try_recv() {
                Ok(event) => {
                    assert_eq!(event.origin, origin);
                    assert_eq!(event.platform, "A");
                    seen += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(e) => panic!("unexpected receive error: {e}"),
            }
        }
        assert!(seen >= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_decision_asks_repository_for_next_weight() {
        let mock = MockAthleteRepository::new();
        let athlete = Athlete::new("Ana", 1).with_openers(80, 100);
        let mut fop = FieldOfPlay::new("A", Arc::new(mock.clone())).with_start_time_automatically(true);
        fop.switch_group(None, vec![athlete]);
        fop.handle_event(event(FopEventKind::IntermissionDone)).unwrap();
        fop.handle_event(event(FopEventKind::AthleteAnnounced)).unwrap();
        fop.handle_event(event(FopEventKind::DownSignal)).unwrap();

        fop.handle_event(event(FopEventKind::RefereeDecision {
            success: true,
            ref1: None,
            ref2: None,
            ref3: None,
        }))
        .unwrap();

        assert_eq!(mock.record_call_count(), 1);
        assert_eq!(mock.next_weight_call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_input_receiver_takes_over_timer() {
        let athlete = Athlete::new("Ana", 1).with_openers(80, 100);
        let mut fop = platform(vec![athlete]).with_start_time_automatically(true);
        let mut first = fop.input_receiver();
        let mut second = fop.input_receiver();
        fop.handle_event(event(FopEventKind::IntermissionDone)).unwrap();
        fop.handle_event(event(FopEventKind::ForceTime { millis: 1_000 })).unwrap();

        fop.handle_event(event(FopEventKind::AthleteAnnounced)).unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2_000)).await;

        assert_eq!(second.try_recv().unwrap().kind, FopEventKind::TimeOver);
        assert!(first.try_recv().is_err());
    }
}
