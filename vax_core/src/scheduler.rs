//! The operations a front end calls.
//!
//! `Scheduler` owns the store and the credential hasher but no login state.
//! Each caller passes its own `Session`, and the scheduler applies the role
//! gates:
//! - uploading availability and adding doses need a caregiver
//! - reserving needs a patient
//! - listing appointments needs either

use crate::config::{Config, SlotOrder};
use crate::password::CredentialHasher;
use crate::session::Session;
use crate::store::{FileStore, Store};
use crate::{
    calendar, credentials, export, input, inventory, ledger, Appointment, AvailabilitySlot,
    Credential, DaySchedule, Error, PrincipalKind, Result, VaccineStock,
};
use chrono::NaiveDate;
use std::path::Path;

pub struct Scheduler<S: Store> {
    store: S,
    hasher: CredentialHasher,
    slot_order: SlotOrder,
}

impl Scheduler<FileStore> {
    /// Open the file-backed scheduler in `data_dir`
    pub fn open(data_dir: &Path, config: &Config) -> Result<Self> {
        let store = FileStore::open(data_dir, &config.store)?;
        Self::new(store, config)
    }
}

impl<S: Store> Scheduler<S> {
    pub fn new(store: S, config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            hasher: CredentialHasher::new(&config.security)?,
            slot_order: config.booking.slot_order,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create a patient or caregiver account. Does not log in.
    pub fn create_account(
        &self,
        kind: PrincipalKind,
        username: &str,
        password: &str,
    ) -> Result<Credential> {
        credentials::create(&self.store, &self.hasher, kind, username, password)
    }

    /// Authenticate and, on success, move the session into a logged-in state
    pub fn login(
        &self,
        session: &mut Session,
        kind: PrincipalKind,
        username: &str,
        password: &str,
    ) -> Result<Credential> {
        if session.is_logged_in() {
            return Err(Error::AlreadyLoggedIn);
        }
        let credential =
            credentials::authenticate(&self.store, &self.hasher, kind, username, password)?
                .ok_or(Error::InvalidCredentials)?;
        session.login(&credential)?;
        tracing::info!("{} {:?} logged in", kind, credential.username);
        Ok(credential)
    }

    pub fn logout(&self, session: &mut Session) {
        if let Some((kind, name)) = session.principal() {
            tracing::info!("{} {:?} logged out", kind, name);
        }
        session.logout();
    }

    /// Open a slot for the logged-in caregiver
    pub fn upload_availability(
        &self,
        session: &Session,
        date: NaiveDate,
    ) -> Result<AvailabilitySlot> {
        let caregiver = session.require(PrincipalKind::Caregiver)?;
        calendar::upload(&self.store, caregiver, date)
    }

    /// Restock a vaccine; caregivers only
    pub fn add_doses(&self, session: &Session, vaccine: &str, count: u32) -> Result<VaccineStock> {
        session.require(PrincipalKind::Caregiver)?;
        inventory::add_doses(&self.store, vaccine, count)
    }

    /// Who is free on a date, plus the vaccine roster. No login needed.
    pub fn search_schedule(&self, date: NaiveDate) -> Result<DaySchedule> {
        calendar::list_available(&self.store, date)
    }

    /// Book the logged-in patient on a date
    pub fn reserve(&self, session: &Session, date: NaiveDate, vaccine: &str) -> Result<Appointment> {
        let patient = session.require(PrincipalKind::Patient)?;
        let vaccine = input::parse_name(vaccine, "vaccine name")?;
        ledger::book(&self.store, patient, date, vaccine, self.slot_order)
    }

    /// Appointments of the logged-in principal, by id
    pub fn show_appointments(&self, session: &Session) -> Result<Vec<Appointment>> {
        let (kind, username) = session.require_any()?;
        ledger::list_for_principal(&self.store, kind, username)
    }

    /// Write the logged-in principal's appointments to CSV
    pub fn export_appointments(&self, session: &Session, path: &Path) -> Result<usize> {
        let appointments = self.show_appointments(session)?;
        export::write_appointments_csv(&appointments, path)
    }

    /// Write the entire ledger to CSV
    pub fn export_ledger(&self, path: &Path) -> Result<usize> {
        let appointments = ledger::list_all(&self.store)?;
        export::write_appointments_csv(&appointments, path)
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    let mut config = Config::default();
    config.security.memory_kib = 64;
    config.security.iterations = 1;
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const PASSWORD: &str = "Abc123!@";

    fn jan(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn scheduler() -> Scheduler<MemoryStore> {
        let scheduler = Scheduler::new(MemoryStore::new(), &test_config()).unwrap();
        scheduler
            .create_account(PrincipalKind::Caregiver, "bob", PASSWORD)
            .unwrap();
        scheduler
            .create_account(PrincipalKind::Patient, "alice", PASSWORD)
            .unwrap();
        scheduler
    }

    fn logged_in(scheduler: &Scheduler<MemoryStore>, kind: PrincipalKind, name: &str) -> Session {
        let mut session = Session::new();
        scheduler.login(&mut session, kind, name, PASSWORD).unwrap();
        session
    }

    #[test]
    fn test_failed_login_leaves_session_empty() {
        let scheduler = scheduler();
        let mut session = Session::new();

        let err = scheduler
            .login(&mut session, PrincipalKind::Patient, "alice", "Abc123!#")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidCredentials));
        assert_eq!(session, Session::None);

        // Right password, wrong namespace
        let err = scheduler
            .login(&mut session, PrincipalKind::Caregiver, "alice", PASSWORD)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidCredentials));
    }

    #[test]
    fn test_second_login_rejected() {
        let scheduler = scheduler();
        let mut session = logged_in(&scheduler, PrincipalKind::Patient, "alice");
        let err = scheduler
            .login(&mut session, PrincipalKind::Caregiver, "bob", PASSWORD)
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyLoggedIn));
        assert_eq!(session, Session::Patient("alice".into()));

        scheduler.logout(&mut session);
        scheduler
            .login(&mut session, PrincipalKind::Caregiver, "bob", PASSWORD)
            .unwrap();
    }

    #[test]
    fn test_role_gates() {
        let scheduler = scheduler();
        let nobody = Session::new();
        let patient = logged_in(&scheduler, PrincipalKind::Patient, "alice");
        let caregiver = logged_in(&scheduler, PrincipalKind::Caregiver, "bob");

        assert!(matches!(
            scheduler.upload_availability(&nobody, jan(5)),
            Err(Error::NotLoggedIn)
        ));
        assert!(matches!(
            scheduler.upload_availability(&patient, jan(5)),
            Err(Error::WrongRole { .. })
        ));
        assert!(matches!(
            scheduler.add_doses(&patient, "Moderna", 1),
            Err(Error::WrongRole { .. })
        ));
        assert!(matches!(
            scheduler.reserve(&caregiver, jan(5), "Moderna"),
            Err(Error::WrongRole { .. })
        ));
        assert!(matches!(
            scheduler.show_appointments(&nobody),
            Err(Error::NotLoggedIn)
        ));

        // Rejected calls changed nothing
        let db = scheduler.store().read(|db| db.clone()).unwrap();
        assert!(db.vaccines.is_empty());
        assert!(db.availabilities.is_empty());
    }

    #[test]
    fn test_end_to_end_last_dose() {
        let scheduler = scheduler();
        scheduler
            .create_account(PrincipalKind::Patient, "carl", PASSWORD)
            .unwrap();
        let caregiver = logged_in(&scheduler, PrincipalKind::Caregiver, "bob");
        scheduler.add_doses(&caregiver, "Moderna", 1).unwrap();
        scheduler.upload_availability(&caregiver, jan(5)).unwrap();

        let schedule = scheduler.search_schedule(jan(5)).unwrap();
        assert_eq!(schedule.caregivers, vec!["bob"]);

        let alice = logged_in(&scheduler, PrincipalKind::Patient, "alice");
        let appt = scheduler.reserve(&alice, jan(5), "Moderna").unwrap();
        assert_eq!(appt.caregiver, "bob");

        let schedule = scheduler.search_schedule(jan(5)).unwrap();
        assert!(schedule.caregivers.is_empty());
        assert_eq!(schedule.vaccines[0].available_doses, 0);

        // Slot is checked before stock, so the second patient sees NoAvailability
        let carl = logged_in(&scheduler, PrincipalKind::Patient, "carl");
        assert!(matches!(
            scheduler.reserve(&carl, jan(5), "Moderna"),
            Err(Error::NoAvailability { .. })
        ));

        assert_eq!(scheduler.show_appointments(&alice).unwrap(), vec![appt.clone()]);
        assert_eq!(scheduler.show_appointments(&caregiver).unwrap(), vec![appt]);
        assert!(scheduler.show_appointments(&carl).unwrap().is_empty());
    }

    #[test]
    fn test_export_needs_session() {
        let scheduler = scheduler();
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("mine.csv");

        assert!(matches!(
            scheduler.export_appointments(&Session::new(), &path),
            Err(Error::NotLoggedIn)
        ));
        assert!(!path.exists());

        let alice = logged_in(&scheduler, PrincipalKind::Patient, "alice");
        assert_eq!(scheduler.export_appointments(&alice, &path).unwrap(), 0);
        assert!(path.exists());
    }
}
