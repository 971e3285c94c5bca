use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Authorization tier of an externally managed user.
/// Declaration order is the privilege order.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumString,
    Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum UserRole {
    Operator,
    Supervisor,
    Admin,
}

/// The authenticated caller of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub role: UserRole,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, role: UserRole) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    /// Fail unless the caller holds at least `minimum`
    pub fn require(&self, minimum: UserRole) -> Result<()> {
        if self.role >= minimum {
            Ok(())
        } else {
            Err(AppError::Authorization(format!(
                "role '{}' is not allowed to perform this action (requires '{}')",
                self.role, minimum
            )))
        }
    }
}
