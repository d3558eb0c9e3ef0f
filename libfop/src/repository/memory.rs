//! In-memory athlete repository

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::RepositoryError;
use crate::repository::{AthleteRepository, RepositoryResult};
use crate::types::{Athlete, AthleteId};

/// Keeps the latest copy of every athlete it has seen.
///
/// The copy passed to `record_lift` is authoritative: weight changes made
/// on the field of play are taken over before the attempt is judged.
#[derive(Debug, Default)]
pub struct InMemoryAthleteRepository {
    athletes: RwLock<HashMap<AthleteId, Athlete>>,
}

impl InMemoryAthleteRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_roster(roster: impl IntoIterator<Item = Athlete>) -> Self {
        let athletes = roster.into_iter().map(|a| (a.id, a)).collect();
        Self {
            athletes: RwLock::new(athletes),
        }
    }

    pub fn insert(&self, athlete: Athlete) -> RepositoryResult<()> {
        let mut athletes = self.athletes.write().map_err(|_| poisoned())?;
        athletes.insert(athlete.id, athlete);
        Ok(())
    }

    pub fn get(&self, id: &AthleteId) -> RepositoryResult<Option<Athlete>> {
        let athletes = self.athletes.read().map_err(|_| poisoned())?;
        Ok(athletes.get(id).cloned())
    }

    pub fn len(&self) -> usize {
        self.athletes.read().map(|a| a.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn store(&self, athlete: Athlete) -> RepositoryResult<Athlete> {
        let mut athletes = self.athletes.write().map_err(|_| poisoned())?;
        athletes.insert(athlete.id, athlete.clone());
        Ok(athlete)
    }
}

fn poisoned() -> RepositoryError {
    RepositoryError::Storage("athlete store lock poisoned".to_string())
}

impl AthleteRepository for InMemoryAthleteRepository {
    fn record_lift(&self, athlete: &Athlete, success: bool) -> RepositoryResult<Athlete> {
        let mut updated = athlete.clone();
        updated
            .record_lift(success)
            .ok_or(RepositoryError::NoAttemptLeft(athlete.id))?;
        self.store(updated)
    }

    fn amend_last_lift(&self, athlete: &Athlete, success: bool) -> RepositoryResult<Athlete> {
        let mut updated = athlete.clone();
        updated
            .amend_last_lift(success)
            .ok_or(RepositoryError::NothingToAmend(athlete.id))?;
        self.store(updated)
    }

    fn next_requested_weight(&self, athlete: &Athlete) -> RepositoryResult<u32> {
        let athletes = self.athletes.read().map_err(|_| poisoned())?;
        athletes
            .get(&athlete.id)
            .map(Athlete::next_requested_weight)
            .ok_or(RepositoryError::UnknownAthlete(athlete.id))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_lift_stores_result() {
        let athlete = Athlete::new("Ana", 1).with_openers(80, 100);
        let repository = InMemoryAthleteRepository::with_roster([athlete.clone()]);

        let judged = repository.record_lift(&athlete, true).unwrap();

        assert_eq!(judged.attempts_done(), 1);
        let stored = repository.get(&athlete.id).unwrap().unwrap();
        assert_eq!(stored, judged);
    }

    #[test]
    fn test_record_lift_takes_over_weight_changes() {
        let athlete = Athlete::new("Ana", 1).with_openers(80, 100);
        let repository = InMemoryAthleteRepository::with_roster([athlete.clone()]);

        let mut changed = athlete.clone();
        changed.change_weight(84);
        let judged = repository.record_lift(&changed, false).unwrap();

        assert_eq!(judged.snatch[0].requested, Some(84));
    }

    #[test]
    fn test_record_lift_when_done() {
        let mut athlete = Athlete::new("Ana", 1).with_openers(80, 100);
        for _ in 0..6 {
            athlete.record_lift(true);
        }
        let repository = InMemoryAthleteRepository::new();

        let err = repository.record_lift(&athlete, true).unwrap_err();
        assert_eq!(err, RepositoryError::NoAttemptLeft(athlete.id));
        assert!(repository.is_empty());
    }

    #[test]
    fn test_amend_last_lift() {
        let athlete = Athlete::new("Ana", 1).with_openers(80, 100);
        let repository = InMemoryAthleteRepository::new();

        let judged = repository.record_lift(&athlete, true).unwrap();
        let amended = repository.amend_last_lift(&judged, false).unwrap();

        assert_eq!(amended.attempts_done(), 1);
        assert!(!amended.snatch[0].result.unwrap().is_good());
    }

    #[test]
    fn test_amend_without_judged_attempt() {
        let athlete = Athlete::new("Ana", 1);
        let repository = InMemoryAthleteRepository::new();

        let err = repository.amend_last_lift(&athlete, true).unwrap_err();
        assert_eq!(err, RepositoryError::NothingToAmend(athlete.id));
    }

    #[test]
    fn test_next_requested_weight_unknown_athlete() {
        let repository = InMemoryAthleteRepository::new();
        let athlete = Athlete::new("Ana", 1);

        let err = repository.next_requested_weight(&athlete).unwrap_err();
        assert_eq!(err, RepositoryError::UnknownAthlete(athlete.id));
    }
}
