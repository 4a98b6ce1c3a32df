use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub avatar: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// A regular account; the repository assigns the id on insert.
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        User {
            id: 0,
            username: username.into(),
            password_hash: password_hash.into(),
            is_admin: false,
            verified: false,
            avatar: String::new(),
            created_at: Utc::now(),
        }
    }
}

/// What the client keeps about the logged-in user.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
    pub avatar: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        UserResponse {
            id: user.id,
            username: user.username.clone(),
            is_admin: user.is_admin,
            avatar: user.avatar.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct AdminUserView {
    pub id: i64,
    pub username: String,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
    pub avatar: String,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for AdminUserView {
    fn from(user: User) -> Self {
        AdminUserView {
            id: user.id,
            username: user.username,
            is_admin: user.is_admin,
            avatar: user.avatar,
            verified: user.verified,
            created_at: user.created_at,
        }
    }
}

/// Fields any authenticated user may see about another account.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub verified: bool,
    pub avatar: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        PublicUser {
            id: user.id,
            username: user.username,
            verified: user.verified,
            avatar: user.avatar,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
    pub iat: usize,
    pub exp: usize,
}
