//! Optimistic attendance board for one session.
//!
//! # Responsibility
//! - Hold the last confirmed raw attendance and the merged view shown to
//!   the owner.
//! - Apply status changes optimistically and roll back on store failure.
//!
//! # Invariants
//! - `confirmed` only ever contains data the store accepted.
//! - After a failed update, `records()` equals a fresh merge of
//!   `confirmed` against the roster.
//! - Failed updates are never retried here.

use crate::engine::{compute_stats, merge_attendance, set_status, AttendanceStats, EngineError, SortOrder};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, Session};
use crate::model::roster::{normalize_email, RosterEntry};
use crate::repo::session_repo::{SessionStore, StatusUpdate};
use crate::repo::RepoError;
use crate::service::identity::Caller;
use crate::service::save_state::{SaveState, SaveStateError, SaveTracker};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from board updates.
#[derive(Debug)]
pub enum BoardError {
    /// Caller does not own the classroom.
    NotOwner,
    /// Target student has no row on this board.
    Engine(EngineError),
    /// Store rejected the update; the board was rolled back.
    Persist(RepoError),
    /// Save lifecycle got out of sync.
    SaveState(SaveStateError),
}

impl Display for BoardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotOwner => write!(f, "only the classroom owner can change attendance"),
            Self::Engine(err) => write!(f, "{err}"),
            Self::Persist(err) => write!(f, "attendance update was not saved: {err}"),
            Self::SaveState(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BoardError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotOwner => None,
            Self::Engine(err) => Some(err),
            Self::Persist(err) => Some(err),
            Self::SaveState(err) => Some(err),
        }
    }
}

impl From<EngineError> for BoardError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<SaveStateError> for BoardError {
    fn from(value: SaveStateError) -> Self {
        Self::SaveState(value)
    }
}

/// Owner-facing attendance state for one session.
#[derive(Debug, Clone)]
pub struct AttendanceBoard {
    session_id: String,
    roster: Vec<RosterEntry>,
    teacher_email: String,
    order: SortOrder,
    confirmed: Vec<AttendanceRecord>,
    merged: Vec<AttendanceRecord>,
    saves: SaveTracker,
}

impl AttendanceBoard {
    /// Builds a board from a loaded session and roster.
    pub fn new(
        session: &Session,
        roster: Vec<RosterEntry>,
        teacher_email: impl Into<String>,
        order: SortOrder,
        saved_clear_after_ms: i64,
    ) -> Self {
        let teacher_email = teacher_email.into();
        let merged = merge_attendance(&session.attendance, &roster, &teacher_email, order);
        Self {
            session_id: session.id.clone(),
            roster,
            teacher_email,
            order,
            confirmed: session.attendance.clone(),
            merged,
            saves: SaveTracker::new(saved_clear_after_ms),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Current merged view, including unconfirmed optimistic changes.
    pub fn records(&self) -> &[AttendanceRecord] {
        &self.merged
    }

    /// Raw attendance the store has confirmed.
    pub fn confirmed(&self) -> &[AttendanceRecord] {
        &self.confirmed
    }

    pub fn stats(&self) -> AttendanceStats {
        compute_stats(&self.merged)
    }

    pub fn save_state(&self, email: &str) -> SaveState {
        self.saves.state(email)
    }

    /// Clears expired `Saved` markers; returns the cleared emails.
    pub fn tick(&mut self, now_ms: i64) -> Vec<String> {
        self.saves.tick(now_ms)
    }

    /// Clears a surfaced `Error` marker.
    pub fn dismiss_error(&mut self, email: &str) -> Result<(), BoardError> {
        self.saves.dismiss(email)?;
        Ok(())
    }

    /// Replaces confirmed data with a fresh copy from the store.
    pub fn refresh(&mut self, session: &Session, roster: Vec<RosterEntry>) {
        self.roster = roster;
        self.confirmed = session.attendance.clone();
        self.remerge();
    }

    /// Applies one status change optimistically, then persists it.
    ///
    /// # Errors
    /// - `NotOwner` before any state changes.
    /// - `Engine` when `email` has no row; nothing changes.
    /// - `Persist` when the store rejects; the view is rebuilt from
    ///   confirmed data and the row is marked `Error`.
    pub fn apply_status<S: SessionStore + ?Sized>(
        &mut self,
        store: &S,
        caller: &Caller,
        email: &str,
        status: AttendanceStatus,
        now_ms: i64,
    ) -> Result<AttendanceStats, BoardError> {
        if !caller.is_owner {
            warn!(
                "event=attendance_update module=board status=denied session_id={}",
                self.session_id
            );
            return Err(BoardError::NotOwner);
        }

        let optimistic = set_status(&self.merged, email, status, &caller.email, now_ms, self.order)?;
        let key = normalize_email(email);
        let update = optimistic
            .iter()
            .find(|record| record.key().as_deref() == Some(key.as_str()))
            .and_then(|record| StatusUpdate::from_record(&self.session_id, record))
            .ok_or_else(|| EngineError::StudentNotInView(email.to_string()))?;

        self.saves.begin(&key);
        self.merged = optimistic;

        match store.update_status(&update) {
            Ok(()) => {
                self.confirm(&update);
                self.saves.succeed(&key, now_ms)?;
                info!(
                    "event=attendance_update module=board status=ok session_id={} new_status={}",
                    self.session_id, update.status
                );
                Ok(self.stats())
            }
            Err(err) => {
                self.remerge();
                self.saves.fail(&key, err.to_string())?;
                warn!(
                    "event=attendance_update module=board status=rolled_back session_id={} error={}",
                    self.session_id, err
                );
                Err(BoardError::Persist(err))
            }
        }
    }

    fn confirm(&mut self, update: &StatusUpdate) {
        let key = normalize_email(&update.student_email);
        let record = AttendanceRecord {
            student_email: Some(update.student_email.clone()),
            student_name: update.student_name.clone(),
            status: update.status,
            marked_at: update.marked_at,
            marked_by: update.marked_by.clone(),
        };
        self.confirmed
            .retain(|existing| existing.key().as_deref() != Some(key.as_str()));
        self.confirmed.push(record);
    }

    fn remerge(&mut self) {
        self.merged = merge_attendance(&self.confirmed, &self.roster, &self.teacher_email, self.order);
    }
}
