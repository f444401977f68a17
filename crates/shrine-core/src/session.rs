use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::product::de;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Developer,
    /// Any role string the client does not know decodes as a plain user.
    #[default]
    #[serde(other)]
    User,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
            Role::Developer => write!(f, "developer"),
        }
    }
}

/// The signed-in user, as returned by the login endpoint and persisted
/// under the `userInfo` key.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SessionWire")]
pub struct Session {
    pub token: String,
    pub role: Role,
    #[serde(rename = "_id")]
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Login responses may carry `_id`, the `id` virtual, or both.
#[derive(Deserialize)]
struct SessionWire {
    token: String,
    #[serde(default)]
    role: Role,
    #[serde(rename = "_id", default)]
    mongo_id: Option<Value>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

impl From<SessionWire> for Session {
    fn from(wire: SessionWire) -> Self {
        Self {
            token: wire.token,
            role: wire.role,
            user_id: de::pick_id(wire.mongo_id.as_ref(), wire.id.as_ref()),
            name: wire.name,
            email: wire.email,
        }
    }
}

impl Session {
    /// A session only counts as signed in when it carries a token.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !self.token.trim().is_empty()
    }

    /// Admins and developers may open the admin console.
    #[must_use]
    pub fn can_access_admin(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Developer)
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("customer")
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[redacted]")
            .field("role", &self.role)
            .field("user_id", &self.user_id)
            .field("name", &self.name)
            .field("email", &self.email)
            .finish()
    }
}
