//! Appointment ledger and the booking transaction.
//!
//! A booking consumes one slot and one dose and records one appointment.
//! The three writes share a single store transaction, so they either all
//! land or none do.
//!
//! Checks run in a fixed order:
//! 1. Vaccine exists, else `UnknownVaccine`
//! 2. A slot is open on the date, else `NoAvailability`
//! 3. A dose is left, else `InsufficientStock`

use crate::config::SlotOrder;
use crate::store::{Database, Store};
use crate::{Appointment, Error, PrincipalKind, Result};
use chrono::NaiveDate;

impl Database {
    /// Apply a booking to this database. Callers must run it inside a
    /// transaction so a failure discards any partial change.
    pub fn book(
        &mut self,
        patient: &str,
        date: NaiveDate,
        vaccine: &str,
        order: SlotOrder,
    ) -> Result<Appointment> {
        if !self.vaccines.contains_key(vaccine) {
            return Err(Error::UnknownVaccine(vaccine.to_string()));
        }

        let caregiver = self
            .select_slot(date, order)
            .ok_or(Error::NoAvailability { date })?;

        self.decrease_doses(vaccine, 1)?;

        if !self.consume_slot(&caregiver, date) {
            return Err(Error::Storage(format!(
                "selected slot for {caregiver:?} on {date} vanished"
            )));
        }

        self.next_appointment_id += 1;
        let appointment = Appointment {
            id: self.next_appointment_id,
            vaccine: vaccine.to_string(),
            date,
            patient: patient.to_string(),
            caregiver,
        };
        self.appointments.push(appointment.clone());
        Ok(appointment)
    }

    /// Appointments involving a principal, by ascending id
    pub fn appointments_for(&self, kind: PrincipalKind, username: &str) -> Vec<Appointment> {
        let mut found: Vec<_> = self
            .appointments
            .iter()
            .filter(|appt| appt.involves(kind, username))
            .cloned()
            .collect();
        found.sort_by_key(|appt| appt.id);
        found
    }
}

/// Book a vaccination for `patient` on `date`
pub fn book<S: Store>(
    store: &S,
    patient: &str,
    date: NaiveDate,
    vaccine: &str,
    order: SlotOrder,
) -> Result<Appointment> {
    match store.transaction(|db| db.book(patient, date, vaccine, order)) {
        Ok(appointment) => {
            tracing::info!(
                "Booked appointment {} for {:?} with {:?} on {} ({})",
                appointment.id,
                appointment.patient,
                appointment.caregiver,
                appointment.date,
                appointment.vaccine
            );
            Ok(appointment)
        }
        Err(e) => {
            tracing::warn!("Booking for {:?} on {} rejected: {}", patient, date, e);
            Err(e)
        }
    }
}

/// Every appointment for a principal, ordered by id
pub fn list_for_principal<S: Store>(
    store: &S,
    kind: PrincipalKind,
    username: &str,
) -> Result<Vec<Appointment>> {
    store.read(|db| db.appointments_for(kind, username))
}

/// The whole ledger, ordered by id
pub fn list_all<S: Store>(store: &S) -> Result<Vec<Appointment>> {
    store.read(|db| {
        let mut all = db.appointments.clone();
        all.sort_by_key(|appt| appt.id);
        all
    })
}
