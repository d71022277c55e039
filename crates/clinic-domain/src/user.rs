use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Owner,
    Staff,
    Patient,
}

/// Usuario autenticado que dispara un flujo (dueño, staff o paciente).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: String,
    pub email: String,
    pub role: UserRole,
}

impl UserAccount {
    pub fn new(id: impl Into<String>, email: impl Into<String>, role: UserRole) -> Self {
        Self { id: id.into(),
               email: email.into(),
               role }
    }
}
