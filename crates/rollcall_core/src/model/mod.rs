//! Domain model for classroom rosters, sessions and materials.
//!
//! # Responsibility
//! - Define canonical data structures shared by engine, repo and report code.
//! - Keep wire naming (`camelCase`) at the serde boundary only.
//!
//! # Invariants
//! - Email comparisons are case-insensitive everywhere; `normalize_email`
//!   is the only place that decides the key shape.
//! - Attendance status is a closed set.
//! - Name ordering goes through `collation::CollationKey`.

pub mod attendance;
pub mod classroom;
pub mod collation;
pub mod material;
pub mod roster;
