//! User model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A team member who may author pull requests and review them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Globally unique user id.
    #[serde(rename = "user_id")]
    pub id: String,

    /// Display name.
    pub username: String,

    /// Owning team (exactly one).
    pub team_name: String,

    /// Only active users are eligible for reviewer selection.
    pub is_active: bool,
}

/// A user as seen from inside its team (no team name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub is_active: bool,
}

impl From<&User> for TeamMember {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            username: user.username.clone(),
            is_active: user.is_active,
        }
    }
}

impl TeamMember {
    /// Attach this member to a team, producing a full user record.
    pub fn into_user(self, team_name: &str) -> User {
        User {
            id: self.user_id,
            username: self.username,
            team_name: team_name.to_string(),
            is_active: self.is_active,
        }
    }
}
