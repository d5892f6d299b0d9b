//! Per-student save lifecycle.
//!
//! # Responsibility
//! - Track the save state of each student row as an explicit state machine.
//! - Clear `Saved` markers after a fixed window.
//!
//! # Invariants
//! - Keys are normalized emails; `Idle` is represented by absence.
//! - `succeed`/`fail` are only legal from `Saving`.
//! - `begin` is legal from every state; a second `begin` for the same
//!   student supersedes the first (last write wins).

use crate::model::roster::normalize_email;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Save state of one student row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveState {
    Idle,
    Saving,
    Saved { at_ms: i64 },
    Error { message: String },
}

impl SaveState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Saving => "saving",
            Self::Saved { .. } => "saved",
            Self::Error { .. } => "error",
        }
    }
}

/// Rejected lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStateError {
    InvalidTransition {
        email: String,
        from: &'static str,
        event: &'static str,
    },
}

impl Display for SaveStateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTransition { email, from, event } => {
                write!(f, "cannot apply `{event}` to {email} while {from}")
            }
        }
    }
}

impl Error for SaveStateError {}

/// State map for all students on one board.
#[derive(Debug, Clone)]
pub struct SaveTracker {
    states: HashMap<String, SaveState>,
    clear_after_ms: i64,
}

impl SaveTracker {
    pub fn new(clear_after_ms: i64) -> Self {
        Self {
            states: HashMap::new(),
            clear_after_ms: clear_after_ms.max(0),
        }
    }

    /// Current state, `Idle` when untracked.
    pub fn state(&self, email: &str) -> SaveState {
        self.states
            .get(&normalize_email(email))
            .cloned()
            .unwrap_or(SaveState::Idle)
    }

    /// Start of a persistence attempt.
    pub fn begin(&mut self, email: &str) {
        self.states.insert(normalize_email(email), SaveState::Saving);
    }

    /// Persistence confirmed at `now_ms`.
    pub fn succeed(&mut self, email: &str, now_ms: i64) -> Result<(), SaveStateError> {
        self.finish(email, "succeed", SaveState::Saved { at_ms: now_ms })
    }

    /// Persistence rejected.
    pub fn fail(&mut self, email: &str, message: impl Into<String>) -> Result<(), SaveStateError> {
        self.finish(
            email,
            "fail",
            SaveState::Error {
                message: message.into(),
            },
        )
    }

    /// Clears an `Error` marker after the caller has surfaced it.
    pub fn dismiss(&mut self, email: &str) -> Result<(), SaveStateError> {
        let key = normalize_email(email);
        let from = self.state(&key);
        if !matches!(from, SaveState::Error { .. }) {
            return Err(SaveStateError::InvalidTransition {
                email: key,
                from: from.label(),
                event: "dismiss",
            });
        }
        self.states.remove(&key);
        Ok(())
    }

    /// Returns `Saved` rows older than the clear window to `Idle`.
    ///
    /// Returns the cleared keys, sorted.
    pub fn tick(&mut self, now_ms: i64) -> Vec<String> {
        let clear_after_ms = self.clear_after_ms;
        let mut cleared: Vec<String> = self
            .states
            .iter()
            .filter_map(|(key, state)| match state {
                SaveState::Saved { at_ms } if now_ms.saturating_sub(*at_ms) >= clear_after_ms => {
                    Some(key.clone())
                }
                _ => None,
            })
            .collect();
        for key in &cleared {
            self.states.remove(key);
        }
        cleared.sort();
        cleared
    }

    /// Number of rows not in `Idle`.
    pub fn active_len(&self) -> usize {
        self.states.len()
    }

    fn finish(
        &mut self,
        email: &str,
        event: &'static str,
        next: SaveState,
    ) -> Result<(), SaveStateError> {
        let key = normalize_email(email);
        match self.states.get_mut(&key) {
            Some(state) if *state == SaveState::Saving => {
                *state = next;
                Ok(())
            }
            other => {
                let from = other.map_or("idle", |state| state.label());
                Err(SaveStateError::InvalidTransition {
                    email: key,
                    from,
                    event,
                })
            }
        }
    }
}
