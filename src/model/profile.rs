use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Coordinator,
}

/// A learner or coordinator profile.
///
/// `completed_lessons` is the canonical progress record. `progress`, `points`
/// and `level` are cached derivations and are rewritten together with it.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub progress: u8,
    pub points: u32,
    pub level: u32,
    pub badges: Vec<String>,
    pub completed_lessons: Vec<String>,
    pub last_access: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(id: &str, name: &str, email: &str, role: Role) -> Self {
        User {
            id: id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            avatar_url: None,
            role,
            is_active: true,
            progress: 0,
            points: 0,
            level: 1,
            badges: Vec::new(),
            completed_lessons: Vec::new(),
            last_access: None,
        }
    }

    pub fn has_completed(&self, lesson_id: &str) -> bool {
        self.completed_lessons.iter().any(|id| id == lesson_id)
    }

    pub fn is_coordinator(&self) -> bool {
        self.role == Role::Coordinator
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Coordinator => "coordinator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "coordinator" => Ok(Role::Coordinator),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}
