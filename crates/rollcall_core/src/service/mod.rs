//! Attendance use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls and engine functions into use-cases.
//! - Own the optimistic update lifecycle and per-student save state.
//!
//! # Invariants
//! - Mutating paths check `Caller::is_owner` before touching any state.
//! - Service layer stays storage-agnostic; it only sees repository traits.

pub mod attendance_board;
pub mod attendance_service;
pub mod identity;
pub mod save_state;
