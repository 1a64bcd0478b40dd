//! User model

use serde::{Deserialize, Serialize};

/// Student or instructor account, as seen by the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub group_ids: Vec<i64>,
}

impl User {
    /// Check if the user is a member of a group
    pub fn is_member_of(&self, group_id: i64) -> bool {
        self.group_ids.contains(&group_id)
    }
}
