//! Vaccine inventory: named stock with a non-negative dose counter.

use crate::input::parse_name;
use crate::store::{Database, Store};
use crate::{Error, Result, VaccineStock};

impl Database {
    /// Look up stock by vaccine name
    pub fn vaccine(&self, name: &str) -> Option<VaccineStock> {
        self.vaccines.get(name).map(|&available_doses| VaccineStock {
            name: name.to_string(),
            available_doses,
        })
    }

    /// Full roster, ordered by name
    pub fn vaccine_roster(&self) -> Vec<VaccineStock> {
        self.vaccines
            .iter()
            .map(|(name, &available_doses)| VaccineStock {
                name: name.clone(),
                available_doses,
            })
            .collect()
    }

    /// Increase stock, creating the record for an unseen name
    pub fn add_doses(&mut self, name: &str, count: u32) -> Result<VaccineStock> {
        let doses = self.vaccines.entry(name.to_string()).or_insert(0);
        *doses = doses
            .checked_add(count)
            .ok_or_else(|| Error::Storage(format!("dose counter overflow for {name:?}")))?;
        Ok(VaccineStock {
            name: name.to_string(),
            available_doses: *doses,
        })
    }

    /// Decrease stock; fails rather than going below zero
    pub fn decrease_doses(&mut self, name: &str, count: u32) -> Result<VaccineStock> {
        let doses = self
            .vaccines
            .get_mut(name)
            .ok_or_else(|| Error::UnknownVaccine(name.to_string()))?;
        *doses = doses
            .checked_sub(count)
            .ok_or_else(|| Error::InsufficientStock {
                vaccine: name.to_string(),
            })?;
        Ok(VaccineStock {
            name: name.to_string(),
            available_doses: *doses,
        })
    }
}

/// Current stock for a vaccine, if any
pub fn get<S: Store>(store: &S, name: &str) -> Result<Option<VaccineStock>> {
    store.read(|db| db.vaccine(name))
}

/// Restock a vaccine, creating it on first use
pub fn add_doses<S: Store>(store: &S, name: &str, count: u32) -> Result<VaccineStock> {
    let name = parse_name(name, "vaccine name")?;
    let stock = store.transaction(|db| db.add_doses(name, count))?;
    tracing::info!(
        "Added {} doses of {:?}, now {}",
        count,
        stock.name,
        stock.available_doses
    );
    Ok(stock)
}

/// Consume doses as a standalone transaction.
///
/// Bookings do not call this; they decrement inside their own transaction.
pub fn decrease<S: Store>(store: &S, name: &str, count: u32) -> Result<VaccineStock> {
    let stock = store.transaction(|db| db.decrease_doses(name, count))?;
    tracing::info!(
        "Removed {} doses of {:?}, now {}",
        count,
        stock.name,
        stock.available_doses
    );
    Ok(stock)
}
