//! Patient Tools
//!
//! The person the readings belong to, printed in report headers.

use serde::Serialize;

use super::parse_date;
use crate::db::Database;
use crate::models::PatientInfo;
use crate::zone::Zone;

#[derive(Debug, Serialize)]
pub struct PatientResponse {
    pub name: String,
    pub birthdate: String,
    pub age: i32,
    pub updated_at: String,
}

impl PatientResponse {
    fn new(info: PatientInfo, zone: &Zone) -> Self {
        Self {
            age: info.age_on(zone.today()),
            birthdate: info.birthdate.to_string(),
            name: info.name,
            updated_at: info.updated_at,
        }
    }
}

/// Set or replace the patient shown in reports
pub fn set_patient_info(db: &Database, zone: &Zone, name: &str, birthdate: &str) -> Result<PatientResponse, String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Patient name must not be empty".to_string());
    }
    let birthdate = parse_date(birthdate)?;

    let info = db
        .with_conn(|conn| PatientInfo::set(conn, name, birthdate))
        .map_err(|e| e.to_string())?;
    Ok(PatientResponse::new(info, zone))
}

pub fn get_patient_info(db: &Database, zone: &Zone) -> Result<Option<PatientResponse>, String> {
    let info = db.with_conn(PatientInfo::get).map_err(|e| e.to_string())?;
    Ok(info.map(|info| PatientResponse::new(info, zone)))
}
