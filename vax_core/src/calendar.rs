//! Availability calendar: single-use caregiver slots per date.

use crate::config::SlotOrder;
use crate::store::{Database, Store};
use crate::{AvailabilitySlot, DaySchedule, Error, Result};
use chrono::NaiveDate;

impl Database {
    /// Caregivers with an open slot on `date`, in upload order
    pub fn open_caregivers(&self, date: NaiveDate) -> Vec<String> {
        self.availabilities
            .iter()
            .filter(|slot| slot.date == date)
            .map(|slot| slot.caregiver.clone())
            .collect()
    }

    /// Pick the caregiver who serves a booking on `date`
    pub fn select_slot(&self, date: NaiveDate, order: SlotOrder) -> Option<String> {
        let mut open = self
            .availabilities
            .iter()
            .filter(|slot| slot.date == date)
            .map(|slot| slot.caregiver.as_str());
        let chosen = match order {
            SlotOrder::UploadOrder => open.next(),
            SlotOrder::CaregiverName => open.min(),
        };
        chosen.map(str::to_string)
    }

    /// Remove the matching slot; false if there was none
    pub fn consume_slot(&mut self, caregiver: &str, date: NaiveDate) -> bool {
        match self
            .availabilities
            .iter()
            .position(|slot| slot.date == date && slot.caregiver == caregiver)
        {
            Some(idx) => {
                self.availabilities.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Whether the caregiver already has a slot or an appointment that day
    fn caregiver_scheduled(&self, caregiver: &str, date: NaiveDate) -> bool {
        self.availabilities
            .iter()
            .any(|slot| slot.date == date && slot.caregiver == caregiver)
            || self
                .appointments
                .iter()
                .any(|appt| appt.date == date && appt.caregiver == caregiver)
    }
}

/// Open a slot for a caregiver on a date.
///
/// Rejected with `SlotTaken` if the caregiver is already open or booked
/// that day, so a date never holds two slots for one caregiver.
pub fn upload<S: Store>(store: &S, caregiver: &str, date: NaiveDate) -> Result<AvailabilitySlot> {
    let slot = store.transaction(|db| {
        if db.caregiver_scheduled(caregiver, date) {
            return Err(Error::SlotTaken {
                caregiver: caregiver.to_string(),
                date,
            });
        }
        let slot = AvailabilitySlot {
            date,
            caregiver: caregiver.to_string(),
        };
        db.availabilities.push(slot.clone());
        Ok(slot)
    })?;
    tracing::info!("Caregiver {:?} opened a slot on {}", caregiver, date);
    Ok(slot)
}

/// Open caregivers on a date together with the current vaccine roster
pub fn list_available<S: Store>(store: &S, date: NaiveDate) -> Result<DaySchedule> {
    let schedule = store.read(|db| DaySchedule {
        date,
        caregivers: db.open_caregivers(date),
        vaccines: db.vaccine_roster(),
    })?;
    tracing::debug!(
        "{} caregivers open on {}",
        schedule.caregivers.len(),
        date
    );
    Ok(schedule)
}

/// Consume a specific caregiver's slot as a standalone transaction
pub fn consume<S: Store>(store: &S, caregiver: &str, date: NaiveDate) -> Result<bool> {
    store.transaction(|db| Ok(db.consume_slot(caregiver, date)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_upload_and_list() {
        let store = MemoryStore::new();
        upload(&store, "zoe", day(5)).unwrap();
        upload(&store, "adam", day(5)).unwrap();
        upload(&store, "adam", day(6)).unwrap();
        crate::inventory::add_doses(&store, "Moderna", 4).unwrap();

        let schedule = list_available(&store, day(5)).unwrap();
        assert_eq!(schedule.caregivers, vec!["zoe", "adam"]);
        assert_eq!(schedule.vaccines.len(), 1);
        assert_eq!(schedule.vaccines[0].available_doses, 4);

        assert!(list_available(&store, day(7)).unwrap().caregivers.is_empty());
    }

    #[test]
    fn test_duplicate_upload_rejected() {
        let store = MemoryStore::new();
        upload(&store, "zoe", day(5)).unwrap();
        let err = upload(&store, "zoe", day(5)).unwrap_err();
        assert!(matches!(err, Error::SlotTaken { .. }));
        assert_eq!(list_available(&store, day(5)).unwrap().caregivers.len(), 1);
    }

    #[test]
    fn test_select_slot_orders() {
        let store = MemoryStore::new();
        upload(&store, "zoe", day(5)).unwrap();
        upload(&store, "adam", day(5)).unwrap();

        let (first, lexical) = store
            .read(|db| {
                (
                    db.select_slot(day(5), SlotOrder::UploadOrder),
                    db.select_slot(day(5), SlotOrder::CaregiverName),
                )
            })
            .unwrap();
        assert_eq!(first.as_deref(), Some("zoe"));
        assert_eq!(lexical.as_deref(), Some("adam"));
    }

    #[test]
    fn test_consume_is_single_use() {
        let store = MemoryStore::new();
        upload(&store, "zoe", day(5)).unwrap();

        assert!(consume(&store, "zoe", day(5)).unwrap());
        assert!(!consume(&store, "zoe", day(5)).unwrap());
        assert!(!consume(&store, "adam", day(5)).unwrap());

        // Once consumed the slot may be reopened
        upload(&store, "zoe", day(5)).unwrap();
    }
}
