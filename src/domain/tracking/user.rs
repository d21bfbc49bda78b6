use crate::domain::errors::ValidationError;
use crate::domain::tracking::position::UserId;
use chrono::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserEmail {
    pub email: String,
    pub is_primary: bool,
}

/// A user receiving alerts for their positions.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// Zero until the user has been stored
    pub id: UserId,
    pub name: String,
    pub emails: Vec<UserEmail>,
    /// Minimum time between two alerts on the same channel of the same position
    pub notification_cooldown: Duration,
}

impl User {
    pub fn new(name: impl Into<String>, primary_email: impl Into<String>, cooldown: Duration) -> Self {
        Self {
            id: 0,
            name: name.into(),
            emails: vec![UserEmail {
                email: primary_email.into(),
                is_primary: true,
            }],
            notification_cooldown: cooldown,
        }
    }

    pub fn with_secondary_email(mut self, email: impl Into<String>) -> Self {
        self.emails.push(UserEmail {
            email: email.into(),
            is_primary: false,
        });
        self
    }

    pub fn primary_email(&self) -> Option<&str> {
        self.emails
            .iter()
            .find(|e| e.is_primary)
            .map(|e| e.email.as_str())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let count = self.emails.iter().filter(|e| e.is_primary).count();
        if count != 1 {
            return Err(ValidationError::PrimaryEmail { count });
        }
        Ok(())
    }
}
