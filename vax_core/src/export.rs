//! CSV export of appointments.

use crate::{Appointment, Result};
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    id: u64,
    vaccine: &'a str,
    date: String,
    patient: &'a str,
    caregiver: &'a str,
}

impl<'a> From<&'a Appointment> for CsvRow<'a> {
    fn from(appt: &'a Appointment) -> Self {
        CsvRow {
            id: appt.id,
            vaccine: &appt.vaccine,
            date: appt.date.format("%Y-%m-%d").to_string(),
            patient: &appt.patient,
            caregiver: &appt.caregiver,
        }
    }
}

/// Write appointments to a CSV file, replacing any existing file.
///
/// The header is always written, even for an empty list. The file is
/// fsynced before returning. Returns the number of rows written.
pub fn write_appointments_csv(appointments: &[Appointment], path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(&file);
    writer.write_record(["id", "vaccine", "date", "patient", "caregiver"])?;
    for appt in appointments {
        writer.serialize(CsvRow::from(appt))?;
    }
    writer.flush()?;
    drop(writer);
    file.sync_all()?;

    tracing::info!("Exported {} appointments to {:?}", appointments.len(), path);
    Ok(appointments.len())
}
