//! Per-client login state.
//!
//! A `Session` is an ordinary value owned by whoever serves one client.
//! Nothing here is global, so any number of sessions can coexist.

use crate::{Credential, Error, PrincipalKind, Result};

/// Who, if anyone, is logged in
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    None,
    Patient(String),
    Caregiver(String),
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a logged-in state; only allowed from `None`
    pub fn login(&mut self, credential: &Credential) -> Result<()> {
        if !matches!(self, Session::None) {
            return Err(Error::AlreadyLoggedIn);
        }
        *self = match credential.kind {
            PrincipalKind::Patient => Session::Patient(credential.username.clone()),
            PrincipalKind::Caregiver => Session::Caregiver(credential.username.clone()),
        };
        Ok(())
    }

    /// Return to `None`; always succeeds
    pub fn logout(&mut self) {
        *self = Session::None;
    }

    pub fn is_logged_in(&self) -> bool {
        !matches!(self, Session::None)
    }

    /// The logged-in principal, if any
    pub fn principal(&self) -> Option<(PrincipalKind, &str)> {
        match self {
            Session::None => None,
            Session::Patient(name) => Some((PrincipalKind::Patient, name.as_str())),
            Session::Caregiver(name) => Some((PrincipalKind::Caregiver, name.as_str())),
        }
    }

    /// Require any logged-in principal
    pub fn require_any(&self) -> Result<(PrincipalKind, &str)> {
        self.principal().ok_or(Error::NotLoggedIn)
    }

    /// Require a principal of a given kind, returning its username
    pub fn require(&self, required: PrincipalKind) -> Result<&str> {
        match self.principal() {
            None => Err(Error::NotLoggedIn),
            Some((kind, name)) if kind == required => Ok(name),
            Some(_) => Err(Error::WrongRole { required }),
        }
    }
}
