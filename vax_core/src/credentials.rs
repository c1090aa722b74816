//! Credential store: account creation and login verification.
//!
//! Patients and caregivers live in independent namespaces; the same username
//! may exist in both.

use crate::input::parse_name;
use crate::password::{check_strength, generate_salt, CredentialHasher};
use crate::store::Store;
use crate::types::SALT_LEN;
use crate::{Credential, Error, PrincipalKind, Result};

/// Salt used to spend one KDF run when the username is unknown
const DUMMY_SALT: [u8; SALT_LEN] = [0x5a; SALT_LEN];

/// True iff an account with this kind and username exists
pub fn exists<S: Store>(store: &S, kind: PrincipalKind, username: &str) -> Result<bool> {
    let username = username.trim();
    store.read(|db| db.accounts(kind).contains_key(username))
}

/// Create an account after checking the password policy.
///
/// The hash is derived before the transaction opens so the store lock is
/// not held across the KDF. Uniqueness is decided inside the transaction.
pub fn create<S: Store>(
    store: &S,
    hasher: &CredentialHasher,
    kind: PrincipalKind,
    username: &str,
    password: &str,
) -> Result<Credential> {
    let username = parse_name(username, "username")?;
    check_strength(password)?;

    let salt = generate_salt();
    let hash = hasher.derive(password, &salt)?;
    let credential = Credential {
        kind,
        username: username.to_string(),
        salt,
        hash,
    };

    let created = store.transaction(|db| {
        let accounts = db.accounts_mut(kind);
        if accounts.contains_key(username) {
            return Err(Error::DuplicateUsername {
                kind,
                username: username.to_string(),
            });
        }
        accounts.insert(username.to_string(), credential.clone());
        Ok(credential)
    })?;

    tracing::info!("Created {} account {:?}", kind, created.username);
    Ok(created)
}

/// Verify a login attempt.
///
/// Returns `None` both for an unknown username and a wrong password; both
/// paths run the KDF once. The username is trimmed as in `create`.
pub fn authenticate<S: Store>(
    store: &S,
    hasher: &CredentialHasher,
    kind: PrincipalKind,
    username: &str,
    password: &str,
) -> Result<Option<Credential>> {
    let username = username.trim();
    let stored = store.read(|db| db.accounts(kind).get(username).cloned())?;

    match stored {
        Some(credential) => {
            if hasher.verify(password, &credential.salt, &credential.hash)? {
                tracing::debug!("Authenticated {} {:?}", kind, username);
                Ok(Some(credential))
            } else {
                tracing::warn!("Wrong password for {} {:?}", kind, username);
                Ok(None)
            }
        }
        None => {
            let _ = hasher.derive(password, &DUMMY_SALT)?;
            tracing::warn!("Login attempt for unknown {} {:?}", kind, username);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PasswordError, ValidationError};
    use crate::password::test_hasher;
    use crate::store::MemoryStore;

    #[test]
    fn test_create_then_authenticate() {
        crate::logging::init_test();
        let store = MemoryStore::new();
        let hasher = test_hasher();

        let created =
            create(&store, &hasher, PrincipalKind::Patient, "alice", "Abc123!@").unwrap();
        assert_eq!(created.username, "alice");
        assert!(exists(&store, PrincipalKind::Patient, "alice").unwrap());

        let found =
            authenticate(&store, &hasher, PrincipalKind::Patient, "alice", "Abc123!@").unwrap();
        assert_eq!(found, Some(created));
    }

    #[test]
    fn test_wrong_password_and_unknown_user() {
        let store = MemoryStore::new();
        let hasher = test_hasher();
        create(&store, &hasher, PrincipalKind::Caregiver, "bob", "Abc123!@").unwrap();

        let wrong =
            authenticate(&store, &hasher, PrincipalKind::Caregiver, "bob", "Abc123!?").unwrap();
        assert!(wrong.is_none());

        let unknown =
            authenticate(&store, &hasher, PrincipalKind::Caregiver, "eve", "Abc123!@").unwrap();
        assert!(unknown.is_none());
    }

    #[test]
    fn test_namespaces_are_independent() {
        let store = MemoryStore::new();
        let hasher = test_hasher();
        create(&store, &hasher, PrincipalKind::Patient, "sam", "Abc123!@").unwrap();

        let dup = create(&store, &hasher, PrincipalKind::Patient, "sam", "Xyz789#?");
        assert!(matches!(
            dup,
            Err(Error::DuplicateUsername {
                kind: PrincipalKind::Patient,
                ..
            })
        ));

        // Same name as a caregiver is fine
        create(&store, &hasher, PrincipalKind::Caregiver, "sam", "Xyz789#?").unwrap();

        // And the patient login is not usable as the caregiver
        let cross =
            authenticate(&store, &hasher, PrincipalKind::Caregiver, "sam", "Abc123!@").unwrap();
        assert!(cross.is_none());
    }

    #[test]
    fn test_weak_password_rejected_before_storage() {
        let store = MemoryStore::new();
        let hasher = test_hasher();

        let err = create(&store, &hasher, PrincipalKind::Patient, "alice", "abc12345").unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::WeakPassword(PasswordError::MissingCase))
        ));
        assert!(!exists(&store, PrincipalKind::Patient, "alice").unwrap());
    }

    #[test]
    fn test_empty_username_rejected() {
        let store = MemoryStore::new();
        let hasher = test_hasher();
        let err = create(&store, &hasher, PrincipalKind::Patient, "  ", "Abc123!@").unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::EmptyName("username"))
        ));
    }

    #[test]
    fn test_padded_username_matches_stored_name() {
        let store = MemoryStore::new();
        let hasher = test_hasher();
        let created =
            create(&store, &hasher, PrincipalKind::Patient, " alice ", "Abc123!@").unwrap();
        assert_eq!(created.username, "alice");

        assert!(exists(&store, PrincipalKind::Patient, " alice ").unwrap());
        assert!(exists(&store, PrincipalKind::Patient, "alice").unwrap());

        let padded =
            authenticate(&store, &hasher, PrincipalKind::Patient, " alice ", "Abc123!@").unwrap();
        assert_eq!(padded, Some(created.clone()));

        let dup = create(&store, &hasher, PrincipalKind::Patient, "alice\t", "Abc123!@");
        assert!(matches!(dup, Err(Error::DuplicateUsername { .. })));
    }
}
