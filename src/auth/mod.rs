//! Authentication Module
//! Mission: Email/secret identities and the identity token every record is scoped by

pub mod api;
pub mod identity_store;
pub mod middleware;
pub mod models;

pub use api::{auth_router, AuthState};
pub use identity_store::IdentityStore;
pub use middleware::{require_identity, IDENTITY_HEADER};
pub use models::IdentityToken;
