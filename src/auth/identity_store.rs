//! Identity Storage
//! Mission: Register and authenticate identities against SQLite with bcrypt-hashed secrets

use crate::auth::models::Identity;
use crate::db::{is_unique_violation, uuid_column, Database};
use anyhow::{Context, Result};
use bcrypt::{hash, verify};
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use std::fmt;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// bcrypt only reads this many bytes of a secret; longer secrets would collide on their prefix.
pub const MAX_SECRET_BYTES: usize = 72;

/// Identity storage on the shared database
pub struct IdentityStore {
    db: Database,
    bcrypt_cost: u32,
    // Verified against when the email is unknown so both failure paths cost the same.
    dummy_hash: String,
}

/// Registration failures
#[derive(Debug)]
pub enum IdentityError {
    EmailTaken,
    SecretTooLong,
    Internal(anyhow::Error),
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmailTaken => write!(f, "Email already in use"),
            Self::SecretTooLong => {
                write!(f, "Secret must be at most {} bytes", MAX_SECRET_BYTES)
            }
            Self::Internal(e) => write!(f, "Identity store error: {}", e),
        }
    }
}

impl std::error::Error for IdentityError {}

impl From<rusqlite::Error> for IdentityError {
    fn from(e: rusqlite::Error) -> Self {
        if is_unique_violation(&e) {
            Self::EmailTaken
        } else {
            Self::Internal(e.into())
        }
    }
}

impl From<anyhow::Error> for IdentityError {
    fn from(e: anyhow::Error) -> Self {
        Self::Internal(e)
    }
}

impl IdentityStore {
    /// Create an identity store on an already-initialized database
    pub fn new(db: Database, bcrypt_cost: u32) -> Result<Self> {
        let dummy_hash = hash(Uuid::new_v4().to_string(), bcrypt_cost)
            .context("Failed to prepare dummy hash")?;
        Ok(Self {
            db,
            bcrypt_cost,
            dummy_hash,
        })
    }

    /// Get identity by email (exact match)
    pub fn get_by_email(&self, email: &str) -> Result<Option<Identity>> {
        let conn = self.db.lock();
        let identity = conn
            .query_row(
                "SELECT id, email, secret_hash, created_at FROM identities WHERE email = ?1",
                params![email],
                identity_from_row,
            )
            .optional()
            .context("Failed to look up identity")?;
        Ok(identity)
    }

    /// Register a new identity. Fails with `EmailTaken` regardless of the secret supplied.
    pub fn register(&self, email: &str, secret: &str) -> Result<Identity, IdentityError> {
        if secret.len() > MAX_SECRET_BYTES {
            return Err(IdentityError::SecretTooLong);
        }

        if self.get_by_email(email)?.is_some() {
            warn!("Signup rejected, email already registered: {}", email);
            return Err(IdentityError::EmailTaken);
        }

        let secret_hash = hash(secret, self.bcrypt_cost).context("Failed to hash secret")?;
        let identity = Identity {
            id: Uuid::new_v4(),
            email: email.to_string(),
            secret_hash,
            created_at: Utc::now().to_rfc3339(),
        };

        // The UNIQUE index still catches a concurrent signup that raced past the lookup.
        self.db.lock().execute(
            "INSERT INTO identities (id, email, secret_hash, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                identity.id.to_string(),
                identity.email,
                identity.secret_hash,
                identity.created_at,
            ],
        )?;

        info!("✅ Registered identity: {} ({})", identity.email, identity.id);
        Ok(identity)
    }

    /// Verify email and secret. `None` on any mismatch.
    pub fn authenticate(&self, email: &str, secret: &str) -> Result<Option<Identity>> {
        if secret.len() > MAX_SECRET_BYTES {
            let _ = verify(secret, &self.dummy_hash);
            debug!("Authentication failed: secret longer than {} bytes", MAX_SECRET_BYTES);
            return Ok(None);
        }

        let Some(identity) = self.get_by_email(email)? else {
            let _ = verify(secret, &self.dummy_hash);
            debug!("Authentication failed: unknown email");
            return Ok(None);
        };

        let valid = verify(secret, &identity.secret_hash).context("Failed to verify secret")?;
        if !valid {
            debug!("Authentication failed: secret mismatch for {}", identity.id);
            return Ok(None);
        }

        Ok(Some(identity))
    }
}

fn identity_from_row(row: &Row<'_>) -> rusqlite::Result<Identity> {
    Ok(Identity {
        id: uuid_column(row, 0)?,
        email: row.get(1)?,
        secret_hash: row.get(2)?,
        created_at: row.get(3)?,
    })
}
