//! Acting user for authorization checks.

use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// The user on whose behalf a game mutation runs.
///
/// Identity and the admin bit come from the caller's authentication layer;
/// the domain only compares them against the game's author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub user_id: UserId,
    pub is_admin: bool,
}

impl Actor {
    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: false,
        }
    }

    pub fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: true,
        }
    }
}
