//! Core attendance logic for rollcall.
//! This crate is the single source of truth for roster, attendance and
//! reporting invariants.

pub mod config;
pub mod db;
pub mod engine;
pub mod logging;
pub mod model;
pub mod repo;
pub mod report;
pub mod service;
pub mod snapshot;

pub use config::{ConfigError, CoreConfig};
pub use engine::{
    aggregate_for_student, aggregate_for_teacher, attendance_percentage, compute_stats,
    merge_attendance, set_status, AggregateStats, AttendanceStats, EngineError, SortOrder,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::attendance::{AttendanceRecord, AttendanceStatus, Session};
pub use model::classroom::{Classroom, Member, OwnerSet, TeacherRef};
pub use model::material::{classify_material, Material, MaterialInput, MaterialKind};
pub use model::roster::RosterEntry;
pub use repo::classroom_repo::{ClassroomRepository, RosterSource, SqliteClassroomRepository};
pub use repo::material_repo::{MaterialRepository, SqliteMaterialRepository};
pub use repo::session_repo::{NewSession, SessionStore, SqliteSessionRepository, StatusUpdate};
pub use repo::{RepoError, RepoResult};
pub use report::{build_report, render_text, AttendanceReport, ReportError, ReportOptions};
pub use service::attendance_board::{AttendanceBoard, BoardError};
pub use service::attendance_service::{AttendanceService, ClassroomAccess, ServiceError};
pub use service::identity::Caller;
pub use service::save_state::{SaveState, SaveStateError, SaveTracker};
pub use snapshot::{import_snapshot, ClassroomSnapshot, SnapshotError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
