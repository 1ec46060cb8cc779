//! SQLite schema definition.

/// Complete database schema for patient-records.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Patients (one private collection per owner)
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    status TEXT NOT NULL CHECK (status IN ('inquiry', 'onboarding', 'active', 'churned')),
    name TEXT NOT NULL CHECK (name <> ''),
    dob TEXT NOT NULL,                           -- YYYY-MM-DD
    addresses TEXT NOT NULL,                     -- JSON array of Address, never empty
    notes TEXT NOT NULL DEFAULT '',
    extra TEXT,                                  -- JSON array of ExtraField, NULL when none
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_patients_owner ON patients(owner_id);
CREATE INDEX IF NOT EXISTS idx_patients_owner_status ON patients(owner_id, status);

-- ============================================================================
-- Sessions (bearer tokens; only the SHA-256 of a token is stored)
-- ============================================================================

CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL CHECK (owner_id <> ''),
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))  -- fixed-width UTC
);

CREATE INDEX IF NOT EXISTS idx_sessions_owner ON sessions(owner_id);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_is_reentrant() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_status_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let insert = |status: &str| {
            conn.execute(
                "INSERT INTO patients (id, owner_id, status, name, dob, addresses, created_at, updated_at)
                 VALUES (?1, 'owner', ?2, 'Jane', '2000-01-01', '[]', 'now', 'now')",
                [status, status],
            )
        };

        assert!(insert("archived").is_err());
        assert!(insert("active").is_ok());
    }

    #[test]
    fn test_empty_name_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let result = conn.execute(
            "INSERT INTO patients (id, owner_id, status, name, dob, addresses, created_at, updated_at)
             VALUES ('p1', 'owner', 'active', '', '2000-01-01', '[]', 'now', 'now')",
            [],
        );
        assert!(result.is_err());
    }
}
