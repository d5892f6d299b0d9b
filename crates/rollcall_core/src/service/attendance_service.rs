//! Attendance use-case service.
//!
//! # Responsibility
//! - Load classroom, roster and sessions through repository contracts.
//! - Build boards, resolve callers and compute cross-session summaries.
//!
//! # Invariants
//! - Owner detection goes through `OwnerSet`, built once per load.
//! - Summary denominators follow the caller's role: every attendance entry
//!   for owners, the caller's own marked sessions for students.

use crate::engine::{
    aggregate_for_student, aggregate_for_teacher, merge_attendance, AggregateStats,
    AttendanceStats, SortOrder,
};
use crate::model::attendance::{AttendanceStatus, Session};
use crate::model::classroom::{Classroom, OwnerSet};
use crate::repo::classroom_repo::{ClassroomRepository, RosterSource};
use crate::repo::session_repo::SessionStore;
use crate::repo::RepoError;
use crate::service::attendance_board::{AttendanceBoard, BoardError};
use crate::service::identity::Caller;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for attendance use-cases.
#[derive(Debug)]
pub enum ServiceError {
    ClassroomNotFound(String),
    SessionNotFound(String),
    /// Session exists but belongs to another classroom.
    SessionMismatch { session_id: String, classroom_id: String },
    Repo(RepoError),
    Board(BoardError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClassroomNotFound(id) => write!(f, "classroom not found: {id}"),
            Self::SessionNotFound(id) => write!(f, "session not found: {id}"),
            Self::SessionMismatch {
                session_id,
                classroom_id,
            } => write!(
                f,
                "session {session_id} does not belong to classroom {classroom_id}"
            ),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Board(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Board(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "classroom",
                id,
            } => Self::ClassroomNotFound(id),
            RepoError::NotFound {
                entity: "session",
                id,
            } => Self::SessionNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<BoardError> for ServiceError {
    fn from(value: BoardError) -> Self {
        Self::Board(value)
    }
}

/// Classroom plus its normalized owner set.
#[derive(Debug, Clone)]
pub struct ClassroomAccess {
    pub classroom: Classroom,
    pub owners: OwnerSet,
}

impl ClassroomAccess {
    pub fn caller(&self, email: &str) -> Caller {
        Caller::resolve(email, &self.owners)
    }

    /// Email excluded from merged views.
    pub fn teacher_email(&self) -> String {
        self.classroom.primary_teacher_email().unwrap_or_default()
    }
}

/// Use-case service over classroom and session stores.
pub struct AttendanceService<C, S>
where
    C: ClassroomRepository + RosterSource,
    S: SessionStore,
{
    classrooms: C,
    sessions: S,
    saved_clear_after_ms: i64,
}

impl<C, S> AttendanceService<C, S>
where
    C: ClassroomRepository + RosterSource,
    S: SessionStore,
{
    pub fn new(classrooms: C, sessions: S, saved_clear_after_ms: i64) -> Self {
        Self {
            classrooms,
            sessions,
            saved_clear_after_ms,
        }
    }

    /// Loads a classroom and computes its owner set.
    pub fn load_access(&self, classroom_id: &str) -> ServiceResult<ClassroomAccess> {
        let classroom = self
            .classrooms
            .get_classroom(classroom_id)?
            .ok_or_else(|| ServiceError::ClassroomNotFound(classroom_id.to_string()))?;
        let owners = OwnerSet::from_classroom(&classroom);
        Ok(ClassroomAccess { classroom, owners })
    }

    /// Loads one session and builds its owner board.
    pub fn open_board(
        &self,
        classroom_id: &str,
        session_id: &str,
        order: SortOrder,
    ) -> ServiceResult<AttendanceBoard> {
        let access = self.load_access(classroom_id)?;
        let session = self.load_session(classroom_id, session_id)?;
        let roster = self.classrooms.list_roster(classroom_id)?;
        Ok(AttendanceBoard::new(
            &session,
            roster,
            access.teacher_email(),
            order,
            self.saved_clear_after_ms,
        ))
    }

    /// Applies a status change through the board using the current time.
    pub fn mark(
        &self,
        board: &mut AttendanceBoard,
        caller: &Caller,
        student_email: &str,
        status: AttendanceStatus,
    ) -> ServiceResult<AttendanceStats> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        Ok(board.apply_status(&self.sessions, caller, student_email, status, now_ms)?)
    }

    /// Reloads confirmed data into `board` from the stores.
    pub fn refresh_board(
        &self,
        classroom_id: &str,
        board: &mut AttendanceBoard,
    ) -> ServiceResult<()> {
        let session = self.load_session(classroom_id, board.session_id())?;
        let roster = self.classrooms.list_roster(classroom_id)?;
        board.refresh(&session, roster);
        Ok(())
    }

    /// Cross-session summary for `caller_email`.
    pub fn classroom_summary(
        &self,
        classroom_id: &str,
        caller_email: &str,
    ) -> ServiceResult<AggregateStats> {
        let access = self.load_access(classroom_id)?;
        let caller = access.caller(caller_email);
        let sessions = self.sessions.list_sessions(classroom_id)?;
        if caller.is_owner {
            Ok(aggregate_for_teacher(&sessions))
        } else {
            Ok(aggregate_for_student(&sessions, &caller.email))
        }
    }

    /// All sessions of a classroom with attendance replaced by merged views.
    pub fn merged_sessions(
        &self,
        classroom_id: &str,
        order: SortOrder,
    ) -> ServiceResult<Vec<Session>> {
        let access = self.load_access(classroom_id)?;
        let roster = self.classrooms.list_roster(classroom_id)?;
        let teacher_email = access.teacher_email();
        let mut sessions = self.sessions.list_sessions(classroom_id)?;
        for session in &mut sessions {
            session.attendance =
                merge_attendance(&session.attendance, &roster, &teacher_email, order);
        }
        Ok(sessions)
    }

    fn load_session(&self, classroom_id: &str, session_id: &str) -> ServiceResult<Session> {
        let session = self
            .sessions
            .get_session(session_id)?
            .ok_or_else(|| ServiceError::SessionNotFound(session_id.to_string()))?;
        if session.classroom_id != classroom_id {
            return Err(ServiceError::SessionMismatch {
                session_id: session_id.to_string(),
                classroom_id: classroom_id.to_string(),
            });
        }
        Ok(session)
    }
}
