use serde::Serialize;
use strum_macros::{AsRefStr, Display};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Student = 1,
    Faculty = 2,
    Rector = 3,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Student),
            2 => Some(Role::Faculty),
            3 => Some(Role::Rector),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }
}

/// The authenticated party behind a service call.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Caller {
    pub id: u64,
    pub role: Role,
}

impl Caller {
    pub fn new(id: u64, role: Role) -> Self {
        Self { id, role }
    }
}
