//! Patient model
//!
//! The person whose readings are stored. Shown in report headers.

use chrono::{Datelike, NaiveDate};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientInfo {
    pub name: String,
    pub birthdate: NaiveDate,
    pub updated_at: String,
}

impl PatientInfo {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            name: row.get("name")?,
            birthdate: row.get("birthdate")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Get patient info (single row table)
    pub fn get(conn: &Connection) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM patient_info WHERE id = 1")?;

        match stmt.query_row([], Self::from_row) {
            Ok(info) => Ok(Some(info)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set or replace patient info
    pub fn set(conn: &Connection, name: &str, birthdate: NaiveDate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO patient_info (id, name, birthdate)
            VALUES (1, ?1, ?2)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                birthdate = excluded.birthdate,
                updated_at = datetime('now')
            "#,
            params![name, birthdate],
        )?;

        Self::get(conn)?.ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Completed years of age on `date`
    pub fn age_on(&self, date: NaiveDate) -> i32 {
        let mut age = date.year() - self.birthdate.year();
        if (date.month(), date.day()) < (self.birthdate.month(), self.birthdate.day()) {
            age -= 1;
        }
        age
    }

    /// `Name (YYYY-MM-DD)` as used in report headers
    pub fn header(&self) -> String {
        format!("{} ({})", self.name, self.birthdate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    #[test]
    fn test_set_and_replace() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(PatientInfo::get(&conn).unwrap(), None);

        let born = NaiveDate::from_ymd_opt(1961, 10, 22).unwrap();
        let info = PatientInfo::set(&conn, "Erika Mustermann", born).unwrap();
        assert_eq!(info.birthdate, born);

        let info = PatientInfo::set(&conn, "Erika Gabler", born).unwrap();
        assert_eq!(info.name, "Erika Gabler");
        assert_eq!(info.header(), "Erika Gabler (1961-10-22)");
    }

    #[test]
    fn test_age_on() {
        let info = PatientInfo {
            name: "x".into(),
            birthdate: NaiveDate::from_ymd_opt(1961, 10, 22).unwrap(),
            updated_at: String::new(),
        };
        assert_eq!(info.age_on(NaiveDate::from_ymd_opt(2022, 10, 21).unwrap()), 60);
        assert_eq!(info.age_on(NaiveDate::from_ymd_opt(2022, 10, 22).unwrap()), 61);
    }
}
