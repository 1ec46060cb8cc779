//! Caller identity.
//!
//! Every store call is scoped to an owner. Who the owner is comes from an
//! [`Identity`] handed to each operation; there is no process-wide current
//! user.

use crate::db::Database;

/// ID of the authenticated user whose records are being operated on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnerId(String);

impl OwnerId {
    /// Wrap a non-empty owner ID.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.is_empty() {
            None
        } else {
            Some(Self(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Answers "who is the caller, if anyone".
pub trait Identity {
    fn current_owner_id(&self) -> Option<OwnerId>;
}

/// An identity decided up front (trusted embedding, tests).
#[derive(Debug, Clone, Default)]
pub struct FixedIdentity {
    owner: Option<OwnerId>,
}

impl FixedIdentity {
    pub fn signed_in(owner: OwnerId) -> Self {
        Self { owner: Some(owner) }
    }

    pub fn anonymous() -> Self {
        Self { owner: None }
    }
}

impl Identity for FixedIdentity {
    fn current_owner_id(&self) -> Option<OwnerId> {
        self.owner.clone()
    }
}

/// Opaque bearer token taken from an `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerCredential(String);

impl BearerCredential {
    /// Parse `Bearer <token>`. Anything else yields no credential.
    pub fn from_header(header: &str) -> Option<Self> {
        let token = header.trim().strip_prefix("Bearer ")?.trim();
        if token.is_empty() {
            None
        } else {
            Some(Self(token.to_string()))
        }
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

// Tokens stay out of logs.
impl std::fmt::Debug for BearerCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerCredential(..)")
    }
}

/// Resolves a bearer credential against the session table.
pub struct SessionIdentity<'a> {
    db: &'a Database,
    credential: Option<BearerCredential>,
}

impl<'a> SessionIdentity<'a> {
    pub fn new(db: &'a Database, credential: Option<BearerCredential>) -> Self {
        Self { db, credential }
    }

    /// Build from a raw `Authorization` header value.
    pub fn from_header(db: &'a Database, header: &str) -> Self {
        Self::new(db, BearerCredential::from_header(header))
    }
}

impl Identity for SessionIdentity<'_> {
    fn current_owner_id(&self) -> Option<OwnerId> {
        let credential = self.credential.as_ref()?;
        match self.db.resolve_session(credential.token()) {
            Ok(owner) => owner,
            Err(e) => {
                tracing::warn!(error = %e, "session lookup failed; treating caller as anonymous");
                None
            }
        }
    }
}
