//! Mock repository implementation for testing
//!
//! This module provides a configurable repository that counts calls and can
//! be switched into a failing mode at any time, so tests can verify how the
//! field of play reacts when a decision cannot be stored.

use std::sync::{Arc, Mutex};

use crate::error::RepositoryError;
use crate::repository::{AthleteRepository, RepositoryResult};
use crate::types::{Athlete, AthleteId};

/// Configuration for mock repository behavior
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Error returned by every write while set
    pub failure: Arc<Mutex<Option<RepositoryError>>>,

    /// Number of times record_lift has been called
    pub record_call_count: Arc<Mutex<usize>>,

    /// Number of times amend_last_lift has been called
    pub amend_call_count: Arc<Mutex<usize>>,

    /// Number of times next_requested_weight has been called
    pub next_weight_call_count: Arc<Mutex<usize>>,

    /// Decisions that were stored (for verification)
    pub recorded: Arc<Mutex<Vec<(AthleteId, bool)>>>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            failure: Arc::new(Mutex::new(None)),
            record_call_count: Arc::new(Mutex::new(0)),
            amend_call_count: Arc::new(Mutex::new(0)),
            next_weight_call_count: Arc::new(Mutex::new(0)),
            recorded: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

/// Mock repository for testing
#[derive(Debug, Clone, Default)]
pub struct MockAthleteRepository {
    config: MockConfig,
}

impl MockAthleteRepository {
    /// Create a mock repository that always succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock repository whose writes fail with a storage error
    pub fn failing(message: &str) -> Self {
        let repository = Self::new();
        repository.fail_with(RepositoryError::Storage(message.to_string()));
        repository
    }

    /// Make every following write fail with `error`
    pub fn fail_with(&self, error: RepositoryError) {
        *self.config.failure.lock().unwrap() = Some(error);
    }

    /// Let writes succeed again
    pub fn recover(&self) {
        *self.config.failure.lock().unwrap() = None;
    }

    /// Get the number of times record_lift was called
    pub fn record_call_count(&self) -> usize {
        *self.config.record_call_count.lock().unwrap()
    }

    /// Get the number of times amend_last_lift was called
    pub fn amend_call_count(&self) -> usize {
        *self.config.amend_call_count.lock().unwrap()
    }

    /// Get the number of times next_requested_weight was called
    pub fn next_weight_call_count(&self) -> usize {
        *self.config.next_weight_call_count.lock().unwrap()
    }

    /// Get all decisions that were stored, in order
    pub fn recorded(&self) -> Vec<(AthleteId, bool)> {
        self.config.recorded.lock().unwrap().clone()
    }

    fn check_failure(&self) -> RepositoryResult<()> {
        match self.config.failure.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl AthleteRepository for MockAthleteRepository {
    fn record_lift(&self, athlete: &Athlete, success: bool) -> RepositoryResult<Athlete> {
        *self.config.record_call_count.lock().unwrap() += 1;
        self.check_failure()?;

        let mut updated = athlete.clone();
        updated
            .record_lift(success)
            .ok_or(RepositoryError::NoAttemptLeft(athlete.id))?;
        self.config.recorded.lock().unwrap().push((athlete.id, success));
        Ok(updated)
    }

    fn amend_last_lift(&self, athlete: &Athlete, success: bool) -> RepositoryResult<Athlete> {
        *self.config.amend_call_count.lock().unwrap() += 1;
        self.check_failure()?;

        let mut updated = athlete.clone();
        updated
            .amend_last_lift(success)
            .ok_or(RepositoryError::NothingToAmend(athlete.id))?;
        self.config.recorded.lock().unwrap().push((athlete.id, success));
        Ok(updated)
    }

    fn next_requested_weight(&self, athlete: &Athlete) -> RepositoryResult<u32> {
        *self.config.next_weight_call_count.lock().unwrap() += 1;
        Ok(athlete.next_requested_weight())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
