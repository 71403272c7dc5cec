use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A device-local account record. There is no password or auth logic here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockUser {
    pub id: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub email_confirmed: bool,
    pub created_at: DateTime<Utc>,
}

impl MockUser {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            full_name: None,
            email_confirmed: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MockEmailKind {
    Activation,
    PasswordReset,
}

/// An activation or reset message that would have been sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockEmail {
    pub id: String,
    pub to: String,
    pub kind: MockEmailKind,
    pub token: String,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

impl MockEmail {
    pub fn new(to: impl Into<String>, kind: MockEmailKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            to: to.into(),
            kind,
            token: Uuid::new_v4().simple().to_string(),
            used: false,
            created_at: Utc::now(),
        }
    }
}
