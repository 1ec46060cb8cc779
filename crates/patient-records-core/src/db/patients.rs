//! Patient database operations.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::auth::OwnerId;
use crate::models::{Address, ExtraField, PatientRecord, PatientStatus, DOB_FORMAT};
use crate::store::PatientStore;

impl PatientStore for Database {
    fn create_patient(&self, owner: &OwnerId, record: &PatientRecord) -> DbResult<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();
        let (addresses_json, extra_json) = encode_lists(record)?;

        self.conn.execute(
            r#"
            INSERT INTO patients (
                id, owner_id, status, name, dob, addresses, notes, extra,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                id,
                owner.as_str(),
                record.status.as_str(),
                record.name,
                record.dob.format(DOB_FORMAT).to_string(),
                addresses_json,
                record.notes,
                extra_json,
                now,
                now,
            ],
        )?;
        Ok(id)
    }

    fn update_patient(
        &self,
        owner: &OwnerId,
        id: &str,
        record: &PatientRecord,
    ) -> DbResult<bool> {
        let (addresses_json, extra_json) = encode_lists(record)?;

        // Full overwrite: a record without extra fields clears them.
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patients SET
                status = ?3,
                name = ?4,
                dob = ?5,
                addresses = ?6,
                notes = ?7,
                extra = ?8,
                updated_at = ?9
            WHERE id = ?1 AND owner_id = ?2
            "#,
            params![
                id,
                owner.as_str(),
                record.status.as_str(),
                record.name,
                record.dob.format(DOB_FORMAT).to_string(),
                addresses_json,
                record.notes,
                extra_json,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    fn delete_patient(&self, owner: &OwnerId, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "DELETE FROM patients WHERE id = ? AND owner_id = ?",
            [id, owner.as_str()],
        )?;
        Ok(rows_affected > 0)
    }

    fn get_patient(&self, owner: &OwnerId, id: &str) -> DbResult<Option<PatientRecord>> {
        self.conn
            .query_row(
                r#"
                SELECT id, status, name, dob, addresses, notes, extra,
                       created_at, updated_at
                FROM patients
                WHERE id = ? AND owner_id = ?
                "#,
                [id, owner.as_str()],
                PatientRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    fn list_patients(&self, owner: &OwnerId) -> DbResult<Vec<PatientRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, status, name, dob, addresses, notes, extra,
                   created_at, updated_at
            FROM patients
            WHERE owner_id = ?
            ORDER BY rowid
            "#,
        )?;

        let rows = stmt.query_map([owner.as_str()], PatientRow::from_row)?;

        let mut patients = Vec::new();
        for row in rows {
            patients.push(row?.try_into()?);
        }
        Ok(patients)
    }
}

fn encode_lists(record: &PatientRecord) -> DbResult<(String, Option<String>)> {
    let addresses = serde_json::to_string(&record.addresses)?;
    let extra = match &record.extra {
        Some(fields) if !fields.is_empty() => Some(serde_json::to_string(fields)?),
        _ => None,
    };
    Ok((addresses, extra))
}

/// Intermediate row struct for database mapping.
struct PatientRow {
    id: String,
    status: String,
    name: String,
    dob: String,
    addresses: String,
    notes: String,
    extra: Option<String>,
    created_at: String,
    updated_at: String,
}

impl PatientRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            status: row.get(1)?,
            name: row.get(2)?,
            dob: row.get(3)?,
            addresses: row.get(4)?,
            notes: row.get(5)?,
            extra: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }
}

impl TryFrom<PatientRow> for PatientRecord {
    type Error = DbError;

    fn try_from(row: PatientRow) -> Result<Self, Self::Error> {
        let status = PatientStatus::parse(&row.status)
            .ok_or_else(|| DbError::Constraint(format!("Unknown patient status: {}", row.status)))?;
        let dob = NaiveDate::parse_from_str(&row.dob, DOB_FORMAT)
            .map_err(|e| DbError::Constraint(format!("Bad dob for {}: {}", row.id, e)))?;
        let addresses: Vec<Address> = serde_json::from_str(&row.addresses)?;
        let extra: Option<Vec<ExtraField>> = row
            .extra
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?
            .filter(|fields: &Vec<ExtraField>| !fields.is_empty());

        Ok(PatientRecord {
            id: Some(row.id),
            status,
            name: row.name,
            dob,
            addresses,
            notes: row.notes,
            extra,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        })
    }
}
