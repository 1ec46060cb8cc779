//! Session database operations.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension};
use sha2::{Digest, Sha256};

use super::{Database, DbResult};
use crate::auth::OwnerId;

/// Sessions older than this no longer resolve.
pub const SESSION_MAX_AGE_DAYS: i64 = 30;

impl Database {
    /// Issue a new bearer token for an owner.
    ///
    /// The token is returned once; only its hash is stored.
    pub fn issue_session(&self, owner: &OwnerId) -> DbResult<String> {
        let token = uuid::Uuid::new_v4().simple().to_string();
        self.conn.execute(
            "INSERT INTO sessions (token_hash, owner_id, created_at) VALUES (?1, ?2, ?3)",
            [
                hash_token(&token),
                owner.as_str().to_string(),
                timestamp(Utc::now()),
            ],
        )?;
        Ok(token)
    }

    /// Look up the owner of a live token. Expired tokens resolve to nobody.
    pub fn resolve_session(&self, token: &str) -> DbResult<Option<OwnerId>> {
        let owner: Option<String> = self
            .conn
            .query_row(
                "SELECT owner_id FROM sessions WHERE token_hash = ?1 AND created_at >= ?2",
                params![hash_token(token), expiry_cutoff()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(owner.and_then(OwnerId::new))
    }

    /// Drop every expired token. Returns the number removed.
    pub fn purge_expired_sessions(&self) -> DbResult<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM sessions WHERE created_at < ?", [expiry_cutoff()])?)
    }

    /// Revoke a token. Returns false if it was unknown.
    pub fn revoke_session(&self, token: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM sessions WHERE token_hash = ?", [hash_token(token)])?;
        Ok(rows_affected > 0)
    }

    /// Revoke every token of an owner. Returns the number revoked.
    pub fn revoke_owner_sessions(&self, owner: &OwnerId) -> DbResult<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM sessions WHERE owner_id = ?", [owner.as_str()])?)
    }
}

fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

// Fixed-width UTC so that text comparison in SQL orders by time.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn expiry_cutoff() -> String {
    timestamp(Utc::now() - Duration::days(SESSION_MAX_AGE_DAYS))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner(id: &str) -> OwnerId {
        OwnerId::new(id).unwrap()
    }

    fn backdate(db: &Database, token: &str, days: i64) {
        db.conn()
            .execute(
                "UPDATE sessions SET created_at = ?1 WHERE token_hash = ?2",
                params![timestamp(Utc::now() - Duration::days(days)), hash_token(token)],
            )
            .unwrap();
    }

    #[test]
    fn test_issue_and_resolve() {
        let db = Database::open_in_memory().unwrap();
        let token = db.issue_session(&owner("uid-1")).unwrap();

        assert_eq!(db.resolve_session(&token).unwrap(), Some(owner("uid-1")));
        assert_eq!(db.resolve_session("unknown").unwrap(), None);
    }

    #[test]
    fn test_token_not_stored_in_clear() {
        let db = Database::open_in_memory().unwrap();
        let token = db.issue_session(&owner("uid-1")).unwrap();

        let stored: String = db
            .conn()
            .query_row("SELECT token_hash FROM sessions", [], |row| row.get(0))
            .unwrap();
        assert_ne!(stored, token);
        assert_eq!(stored.len(), 64);
    }

    #[test]
    fn test_revoke() {
        let db = Database::open_in_memory().unwrap();
        let token = db.issue_session(&owner("uid-1")).unwrap();

        assert!(db.revoke_session(&token).unwrap());
        assert!(!db.revoke_session(&token).unwrap());
        assert_eq!(db.resolve_session(&token).unwrap(), None);
    }

    #[test]
    fn test_revoke_owner_sessions() {
        let db = Database::open_in_memory().unwrap();
        let first = db.issue_session(&owner("uid-1")).unwrap();
        let second = db.issue_session(&owner("uid-1")).unwrap();
        let other = db.issue_session(&owner("uid-2")).unwrap();

        assert_eq!(db.revoke_owner_sessions(&owner("uid-1")).unwrap(), 2);
        assert_eq!(db.resolve_session(&first).unwrap(), None);
        assert_eq!(db.resolve_session(&second).unwrap(), None);
        assert_eq!(db.resolve_session(&other).unwrap(), Some(owner("uid-2")));
    }

    #[test]
    fn test_expired_session_does_not_resolve() {
        let db = Database::open_in_memory().unwrap();
        let stale = db.issue_session(&owner("uid-1")).unwrap();
        let recent = db.issue_session(&owner("uid-1")).unwrap();

        backdate(&db, &stale, SESSION_MAX_AGE_DAYS + 1);
        backdate(&db, &recent, SESSION_MAX_AGE_DAYS - 1);

        assert_eq!(db.resolve_session(&stale).unwrap(), None);
        assert_eq!(db.resolve_session(&recent).unwrap(), Some(owner("uid-1")));
    }

    #[test]
    fn test_purge_expired_sessions() {
        let db = Database::open_in_memory().unwrap();
        let stale = db.issue_session(&owner("uid-1")).unwrap();
        let fresh = db.issue_session(&owner("uid-2")).unwrap();
        backdate(&db, &stale, SESSION_MAX_AGE_DAYS * 2);

        assert_eq!(db.purge_expired_sessions().unwrap(), 1);
        assert!(!db.revoke_session(&stale).unwrap());
        assert_eq!(db.resolve_session(&fresh).unwrap(), Some(owner("uid-2")));
    }
}
