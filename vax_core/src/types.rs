//! Core domain types for the vaccine scheduler.
//!
//! This module defines the records the reservation engine protects:
//! - Principals and their stored credentials
//! - Vaccine stock
//! - Availability slots
//! - Appointments

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length in bytes of a credential salt
pub const SALT_LEN: usize = 16;

/// Length in bytes of a derived password hash
pub const HASH_LEN: usize = 32;

// ============================================================================
// Principals
// ============================================================================

/// The two disjoint account namespaces
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
    Patient,
    Caregiver,
}

impl fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrincipalKind::Patient => write!(f, "patient"),
            PrincipalKind::Caregiver => write!(f, "caregiver"),
        }
    }
}

/// A stored account record. Immutable once created.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credential {
    pub kind: PrincipalKind,
    pub username: String,
    pub salt: [u8; SALT_LEN],
    pub hash: [u8; HASH_LEN],
}

// ============================================================================
// Inventory, Calendar and Ledger records
// ============================================================================

/// Remaining administrable doses of a named vaccine
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VaccineStock {
    pub name: String,
    pub available_doses: u32,
}

/// One caregiver's single-use booking opportunity on a date
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvailabilitySlot {
    pub date: NaiveDate,
    pub caregiver: String,
}

/// A consummated booking
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Appointment {
    pub id: u64,
    pub vaccine: String,
    pub date: NaiveDate,
    pub patient: String,
    pub caregiver: String,
}

impl Appointment {
    /// Whether the given principal is a party to this appointment
    pub fn involves(&self, kind: PrincipalKind, username: &str) -> bool {
        match kind {
            PrincipalKind::Patient => self.patient == username,
            PrincipalKind::Caregiver => self.caregiver == username,
        }
    }
}

/// Result of a schedule search: who is free on a date, and what is in stock
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DaySchedule {
    pub date: NaiveDate,
    pub caregivers: Vec<String>,
    pub vaccines: Vec<VaccineStock>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn appointment() -> Appointment {
        Appointment {
            id: 1,
            vaccine: "Moderna".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            patient: "alice".into(),
            caregiver: "bob".into(),
        }
    }

    #[test]
    fn test_involves_matches_by_kind() {
        let appt = appointment();
        assert!(appt.involves(PrincipalKind::Patient, "alice"));
        assert!(appt.involves(PrincipalKind::Caregiver, "bob"));
        // Same name in the other namespace is a different principal
        assert!(!appt.involves(PrincipalKind::Caregiver, "alice"));
        assert!(!appt.involves(PrincipalKind::Patient, "bob"));
    }

    #[test]
    fn test_date_serializes_as_iso() {
        let json = serde_json::to_string(&appointment()).unwrap();
        assert!(json.contains("\"2024-01-05\""));
    }
}
