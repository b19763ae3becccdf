//! Team model.

use super::user::{TeamMember, User};
use serde::{Deserialize, Serialize};

/// A named team and its members.
///
/// The name is the primary key and never changes after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub team_name: String,
    pub members: Vec<TeamMember>,
}

impl Team {
    /// Build the team aggregate from its member rows.
    pub fn from_users(team_name: impl Into<String>, users: &[User]) -> Self {
        Self {
            team_name: team_name.into(),
            members: users.iter().map(TeamMember::from).collect(),
        }
    }
}

/// Active members of `users` whose id is not in `excluded`.
///
/// This is the eligibility rule for reviewer selection; order of `users`
/// is preserved.
pub fn active_members_except(users: &[User], excluded: &[&str]) -> Vec<User> {
    users
        .iter()
        .filter(|u| u.is_active && !excluded.contains(&u.id.as_str()))
        .cloned()
        .collect()
}
