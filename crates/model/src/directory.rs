use crate::id::{CategoryId, UserId};
use serde::{Deserialize, Serialize};

/// Directory user, owned by the external directory service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub role: String,
}

/// Named grouping of users, used for eligibility and option sourcing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub users: Vec<User>,
}

/// Summary returned by the category-to-user union preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPreview {
    pub total_users: u64,
    pub can_create_poll: bool,
}
