//! Lifting-order providers
//!
//! The field of play does not own the competition rules for ordering; it
//! asks a [`LiftingOrderProvider`] every time a weight changes or an
//! attempt is recorded. Providers must be deterministic and cheap: they run
//! synchronously inside the state machine.

use std::cmp::Ordering;

use crate::types::Athlete;

/// Source of the lifting order and the spectator display order.
pub trait LiftingOrderProvider: Send + Sync {
    /// Order the roster so the athlete due next comes first.
    fn sort(&self, roster: &[Athlete]) -> Vec<Athlete>;

    /// Derive the order shown on spectator boards from the lifting order.
    fn display_order(&self, ordered: &[Athlete]) -> Vec<Athlete>;

    /// Provider name, for logs.
    fn name(&self) -> &str {
        "custom"
    }
}

/// Ordering by the usual competition rules.
///
/// Athletes with attempts left come before finished athletes, then:
/// lighter requested weight first, snatch before clean & jerk, fewer
/// attempts done first, lower lot number first.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardLiftingOrder;

impl StandardLiftingOrder {
    pub fn new() -> Self {
        Self
    }

    fn compare(a: &Athlete, b: &Athlete) -> Ordering {
        a.is_done()
            .cmp(&b.is_done())
            .then_with(|| a.next_requested_weight().cmp(&b.next_requested_weight()))
            .then_with(|| a.current_lift().cmp(&b.current_lift()))
            .then_with(|| a.attempts_done().cmp(&b.attempts_done()))
            .then_with(|| a.lot_number.cmp(&b.lot_number))
    }
}

impl LiftingOrderProvider for StandardLiftingOrder {
    fn sort(&self, roster: &[Athlete]) -> Vec<Athlete> {
        let mut ordered = roster.to_vec();
        ordered.sort_by(Self::compare);
        ordered
    }

    fn display_order(&self, ordered: &[Athlete]) -> Vec<Athlete> {
        let mut display = ordered.to_vec();
        display.sort_by(|a, b| {
            a.category
                .cmp(&b.category)
                .then_with(|| a.lot_number.cmp(&b.lot_number))
        });
        display
    }

    fn name(&self) -> &str {
        "standard"
    }
}
