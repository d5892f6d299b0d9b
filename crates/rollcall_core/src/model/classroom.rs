//! Classroom membership and owner detection.
//!
//! # Responsibility
//! - Accept every membership shape the classroom backend emits.
//! - Collapse them into one normalized owner set at load time.
//!
//! # Invariants
//! - `OwnerSet` only contains non-empty, lower-cased emails.
//! - Authorization checks never inspect raw classroom shapes.

use crate::model::roster::normalize_email;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Teacher reference as sent by the backend: bare email or `{ email }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TeacherRef {
    Email(String),
    Object { email: String },
}

impl TeacherRef {
    pub fn email(&self) -> &str {
        match self {
            Self::Email(email) => email,
            Self::Object { email } => email,
        }
    }
}

/// Classroom membership row with a free-form role label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub email: String,
    #[serde(default)]
    pub role: String,
}

impl Member {
    /// Whether the role label grants ownership.
    pub fn is_owner_role(&self) -> bool {
        matches!(
            self.role.trim().to_ascii_lowercase().as_str(),
            "owner" | "teacher"
        )
    }
}

/// Classroom metadata as loaded from the classroom store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classroom {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub owner_email: Option<String>,
    #[serde(default)]
    pub teachers: Vec<TeacherRef>,
    #[serde(default)]
    pub members: Vec<Member>,
}

impl Classroom {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            owner_email: None,
            teachers: Vec::new(),
            members: Vec::new(),
        }
    }

    /// Primary teacher email: explicit owner first, then the first teacher
    /// reference, then the first owner-role member.
    pub fn primary_teacher_email(&self) -> Option<String> {
        self.owner_email
            .as_deref()
            .map(normalize_email)
            .filter(|email| !email.is_empty())
            .or_else(|| {
                self.teachers
                    .iter()
                    .map(|teacher| normalize_email(teacher.email()))
                    .find(|email| !email.is_empty())
            })
            .or_else(|| {
                self.members
                    .iter()
                    .filter(|member| member.is_owner_role())
                    .map(|member| normalize_email(&member.email))
                    .find(|email| !email.is_empty())
            })
    }
}

/// Normalized set of emails allowed to mutate classroom attendance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnerSet {
    emails: BTreeSet<String>,
}

impl OwnerSet {
    /// Builds the owner set from every membership shape on `classroom`.
    pub fn from_classroom(classroom: &Classroom) -> Self {
        let owner = classroom.owner_email.iter().map(String::as_str);
        let teachers = classroom.teachers.iter().map(TeacherRef::email);
        let members = classroom
            .members
            .iter()
            .filter(|member| member.is_owner_role())
            .map(|member| member.email.as_str());

        owner.chain(teachers).chain(members).collect()
    }

    /// Single authorization check used by every mutating path.
    pub fn is_owner(&self, email: &str) -> bool {
        let key = normalize_email(email);
        !key.is_empty() && self.emails.contains(&key)
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}

impl<'a> FromIterator<&'a str> for OwnerSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let emails = iter
            .into_iter()
            .map(normalize_email)
            .filter(|email| !email.is_empty())
            .collect();
        Self { emails }
    }
}
