//! Authentication Models
//! Mission: Define identity and credential data structures

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub secret_hash: String, // bcrypt hash - never serialize
    pub created_at: String,
}

impl Identity {
    pub fn token(&self) -> IdentityToken {
        IdentityToken(self.id)
    }
}

/// Opaque identity token: the identity's own record identifier.
///
/// Every owned record is stamped with, and filtered by, this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityToken(Uuid);

impl IdentityToken {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Syntactic check only. Existence of the identity is never verified.
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Signup and login request body.
///
/// The secret may be sent as `secret` or `password`, but not both: a body carrying both keys
/// fails to deserialize.
#[derive(Debug, Default, Deserialize)]
pub struct CredentialsRequest {
    pub email: Option<String>,
    #[serde(alias = "password")]
    pub secret: Option<String>,
}

impl CredentialsRequest {
    /// Returns the trimmed email and the raw secret when both are present and non-blank.
    pub fn into_parts(self) -> Option<(String, String)> {
        let email = self.email?.trim().to_string();
        let secret = self.secret?;
        if email.is_empty() || secret.is_empty() {
            return None;
        }
        Some((email, secret))
    }
}

/// Signup and login response
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub success: bool,
    pub token: IdentityToken,
}

impl AuthResponse {
    pub fn for_identity(identity: &Identity) -> Self {
        Self {
            success: true,
            token: identity.token(),
        }
    }
}
