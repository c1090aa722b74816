#![forbid(unsafe_code)]

//! Reservation engine for vaccine appointment scheduling.
//!
//! This crate provides:
//! - Domain types (credentials, stock, slots, appointments)
//! - Credential store with salted Argon2id hashes
//! - Vaccine inventory and availability calendar
//! - The atomic booking transaction and appointment ledger
//! - Per-client sessions and the `Scheduler` facade
//! - Persistence (locked JSON document store, CSV export)

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod input;
pub mod password;
pub mod store;
pub mod credentials;
pub mod inventory;
pub mod calendar;
pub mod ledger;
pub mod session;
pub mod export;
pub mod scheduler;

// Re-export commonly used types
pub use error::{Error, PasswordError, Result, ValidationError};
pub use types::*;
pub use config::{Config, SlotOrder};
pub use store::{Database, FileStore, MemoryStore, Store};
pub use session::Session;
pub use scheduler::Scheduler;
pub use input::{parse_date, parse_dose_count};
