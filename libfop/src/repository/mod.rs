//! Athlete repository abstraction
//!
//! The field of play records referee decisions through an
//! [`AthleteRepository`]. Persistence itself lives outside the runtime; the
//! repository only has to be callable synchronously from inside a
//! transition.
//!
//! # Examples
//!
//! ```
//! use libfop::repository::{AthleteRepository, memory::InMemoryAthleteRepository};
//! use libfop::types::Athlete;
//!
//! let repository = InMemoryAthleteRepository::new();
//! let athlete = Athlete::new("Ana", 1).with_openers(80, 100);
//!
//! let judged = repository.record_lift(&athlete, true).unwrap();
//! assert_eq!(judged.attempts_done(), 1);
//! assert_eq!(repository.next_requested_weight(&judged).unwrap(), 80);
//! ```

use crate::error::RepositoryError;
use crate::types::Athlete;

pub mod memory;

// Mock repository is available for all builds (not just tests) to support integration tests
pub mod mock;

/// Result type for repository operations
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Storage for lift results.
///
/// A failure is final for the decision being recorded: the runtime does
/// not retry and reports it to the officials instead.
pub trait AthleteRepository: Send + Sync {
    /// Judge the athlete's next attempt and persist it.
    ///
    /// Returns the athlete as stored after the update.
    ///
    /// # Errors
    ///
    /// - `RepositoryError::NoAttemptLeft` if all six attempts are judged
    /// - `RepositoryError::Storage` if the result could not be stored
    fn record_lift(&self, athlete: &Athlete, success: bool) -> RepositoryResult<Athlete>;

    /// Re-judge the most recently judged attempt (referee reversal).
    ///
    /// # Errors
    ///
    /// - `RepositoryError::NothingToAmend` if no attempt was judged yet
    /// - `RepositoryError::Storage` if the result could not be stored
    fn amend_last_lift(&self, athlete: &Athlete, success: bool) -> RepositoryResult<Athlete>;

    /// Weight the athlete will lift next, according to the stored record.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::UnknownAthlete` if the athlete was never stored.
    fn next_requested_weight(&self, athlete: &Athlete) -> RepositoryResult<u32>;

    /// Repository name, for logs.
    fn name(&self) -> &str;
}
