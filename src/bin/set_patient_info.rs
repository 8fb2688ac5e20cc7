//! Utility to set patient info in the database
//!
//! Usage: `set_patient_info <name> <YYYY-MM-DD>`

use chrono::NaiveDate;

use bpstats::config::Settings;
use bpstats::db::Database;
use bpstats::models::PatientInfo;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let [name, birthdate] = args.as_slice() else {
        eprintln!("Usage: set_patient_info <name> <birthdate YYYY-MM-DD>");
        std::process::exit(2);
    };
    let birthdate = NaiveDate::parse_from_str(birthdate, "%Y-%m-%d")?;

    let settings = Settings::from_env()?;
    println!("Database path: {}", settings.database_path.display());

    let database = Database::open(&settings.database_path)?;
    let patient = database.with_conn(|conn| PatientInfo::set(conn, name.trim(), birthdate))?;

    println!("Patient info set:");
    println!("  Name: {}", patient.name);
    println!("  Born: {}", patient.birthdate);
    println!("  Updated: {}", patient.updated_at);

    Ok(())
}
