//! Core types for the field-of-play runtime
//!
//! Only the slice of the athlete model the runtime needs lives here:
//! identity, the declared/actual weights per attempt and the counters
//! derived from them. Registration data, categories and scoring belong to
//! the surrounding application.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of attempts per lift.
pub const ATTEMPTS_PER_LIFT: usize = 3;

/// Stable identity of an athlete; equality of athletes is equality of ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AthleteId(Uuid);

impl AthleteId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AthleteId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AthleteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two competition lifts, in the order they are contested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lift {
    Snatch,
    CleanJerk,
}

impl std::fmt::Display for Lift {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Snatch => write!(f, "snatch"),
            Self::CleanJerk => write!(f, "clean & jerk"),
        }
    }
}

/// Outcome of a judged attempt, carrying the weight on the bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "weight", rename_all = "snake_case")]
pub enum AttemptResult {
    Good(u32),
    NoLift(u32),
}

impl AttemptResult {
    pub fn weight(&self) -> u32 {
        match self {
            Self::Good(w) | Self::NoLift(w) => *w,
        }
    }

    pub fn is_good(&self) -> bool {
        matches!(self, Self::Good(_))
    }
}

/// One attempt slot: the latest requested weight and, once judged, the result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub requested: Option<u32>,
    pub result: Option<AttemptResult>,
}

/// An athlete as seen by the field of play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Athlete {
    pub id: AthleteId,
    pub name: String,
    pub team: Option<String>,
    pub lot_number: u32,
    pub category: Option<String>,
    pub body_weight: Option<f32>,
    pub snatch: [Attempt; ATTEMPTS_PER_LIFT],
    pub clean_jerk: [Attempt; ATTEMPTS_PER_LIFT],
}

impl Athlete {
    pub fn new(name: impl Into<String>, lot_number: u32) -> Self {
        Self {
            id: AthleteId::new(),
            name: name.into(),
            team: None,
            lot_number,
            category: None,
            body_weight: None,
            snatch: [Attempt::default(); ATTEMPTS_PER_LIFT],
            clean_jerk: [Attempt::default(); ATTEMPTS_PER_LIFT],
        }
    }

    /// Builder-style helper setting the first declared weight of each lift.
    pub fn with_openers(mut self, snatch: u32, clean_jerk: u32) -> Self {
        self.snatch[0].requested = Some(snatch);
        self.clean_jerk[0].requested = Some(clean_jerk);
        self
    }

    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Identity comparison; other fields may differ between copies.
    pub fn same_as(&self, other: &Athlete) -> bool {
        self.id == other.id
    }

    /// Number of judged attempts across both lifts (0..=6).
    pub fn attempts_done(&self) -> usize {
        self.attempts().filter(|a| a.result.is_some()).count()
    }

    pub fn is_done(&self) -> bool {
        self.attempts_done() == 2 * ATTEMPTS_PER_LIFT
    }

    /// The lift the next attempt belongs to, `None` once all six are judged.
    pub fn current_lift(&self) -> Option<Lift> {
        match self.attempts_done() {
            n if n < ATTEMPTS_PER_LIFT => Some(Lift::Snatch),
            n if n < 2 * ATTEMPTS_PER_LIFT => Some(Lift::CleanJerk),
            _ => None,
        }
    }

    /// Weight requested for the next unjudged attempt.
    ///
    /// An undeclared attempt inherits the previous attempt's weight within
    /// the same lift; returns 0 when nothing is declared or all attempts are
    /// done.
    pub fn next_requested_weight(&self) -> u32 {
        let Some(index) = self.next_attempt_index() else {
            return 0;
        };
        let lift = self.lift_slots(index);
        let within = index % ATTEMPTS_PER_LIFT;
        lift[..=within]
            .iter()
            .rev()
            .find_map(|a| a.requested)
            .unwrap_or(0)
    }

    /// Change the requested weight of the next attempt.
    pub fn change_weight(&mut self, weight: u32) -> bool {
        match self.next_attempt_index() {
            Some(index) => {
                self.slot_mut(index).requested = Some(weight);
                true
            }
            None => false,
        }
    }

    /// Judge the next attempt at its requested weight.
    ///
    /// Returns the index (0..6) of the attempt that was recorded, or `None`
    /// when no attempt is left.
    pub fn record_lift(&mut self, success: bool) -> Option<usize> {
        let index = self.next_attempt_index()?;
        let weight = self.next_requested_weight();
        let slot = self.slot_mut(index);
        slot.requested = Some(weight);
        slot.result = Some(if success {
            AttemptResult::Good(weight)
        } else {
            AttemptResult::NoLift(weight)
        });
        Some(index)
    }

    /// Re-judge the most recently judged attempt (referee reversal).
    pub fn amend_last_lift(&mut self, success: bool) -> Option<usize> {
        let index = self.attempts_done().checked_sub(1)?;
        let slot = self.slot_mut(index);
        let weight = slot.result?.weight();
        slot.result = Some(if success {
            AttemptResult::Good(weight)
        } else {
            AttemptResult::NoLift(weight)
        });
        Some(index)
    }

    /// Best good lift for the given lift type, if any.
    pub fn best(&self, lift: Lift) -> Option<u32> {
        let slots = match lift {
            Lift::Snatch => &self.snatch,
            Lift::CleanJerk => &self.clean_jerk,
        };
        slots
            .iter()
            .filter_map(|a| a.result)
            .filter(AttemptResult::is_good)
            .map(|r| r.weight())
            .max()
    }

    fn attempts(&self) -> impl Iterator<Item = &Attempt> {
        self.snatch.iter().chain(self.clean_jerk.iter())
    }

    fn next_attempt_index(&self) -> Option<usize> {
        let done = self.attempts_done();
        (done < 2 * ATTEMPTS_PER_LIFT).then_some(done)
    }

    fn lift_slots(&self, index: usize) -> &[Attempt; ATTEMPTS_PER_LIFT] {
        if index < ATTEMPTS_PER_LIFT {
            &self.snatch
        } else {
            &self.clean_jerk
        }
    }

    fn slot_mut(&mut self, index: usize) -> &mut Attempt {
        if index < ATTEMPTS_PER_LIFT {
            &mut self.snatch[index]
        } else {
            &mut self.clean_jerk[index - ATTEMPTS_PER_LIFT]
        }
    }
}

/// A session of athletes lifting together on a platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub description: Option<String>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}
