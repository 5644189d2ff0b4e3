//! API credential lifecycle
//!
//! A single user-supplied key, persisted under a fixed settings key. A
//! session-scoped override (from configuration or a "don't remember"
//! submission) takes precedence over the stored value.

use crate::db::{Database, DbError};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Settings key holding the stored credential
pub const CREDENTIAL_KEY: &str = "SUPER_LOTTO_API_KEY";

/// Minimum trimmed length accepted for a credential
pub const MIN_CREDENTIAL_LEN: usize = 10;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("API key is too short ({len} characters, need at least {min})")]
    TooShort { len: usize, min: usize },
    #[error(transparent)]
    Storage(#[from] DbError),
}

/// Where a credential came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSource {
    Stored,
    Override,
}

/// An API key that passed length validation
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    value: String,
    source: CredentialSource,
}

impl Credential {
    /// Trim and validate a candidate value
    pub fn parse(candidate: &str, source: CredentialSource) -> Result<Self, CredentialError> {
        let trimmed = candidate.trim();
        let len = trimmed.chars().count();
        if len < MIN_CREDENTIAL_LEN {
            return Err(CredentialError::TooShort {
                len,
                min: MIN_CREDENTIAL_LEN,
            });
        }
        Ok(Self {
            value: trimmed.to_string(),
            source,
        })
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }
}

// Never print the key itself
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("value", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Durable storage for the credential
pub trait CredentialStore: Send + Sync {
    /// Read the stored credential, if any. Only presence is checked.
    fn load(&self) -> Result<Option<Credential>, CredentialError>;

    /// Validate and persist a candidate. On `TooShort` the stored value is untouched.
    fn save(&self, candidate: &str) -> Result<Credential, CredentialError>;

    /// Remove any stored credential
    fn clear(&self) -> Result<(), CredentialError>;
}

/// Adapter to use Database as `CredentialStore`
#[derive(Clone)]
pub struct DatabaseCredentialStore {
    db: Database,
}

impl DatabaseCredentialStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl CredentialStore for DatabaseCredentialStore {
    fn load(&self) -> Result<Option<Credential>, CredentialError> {
        Ok(self.db.get_setting(CREDENTIAL_KEY)?.map(|value| Credential {
            value,
            source: CredentialSource::Stored,
        }))
    }

    fn save(&self, candidate: &str) -> Result<Credential, CredentialError> {
        let credential = Credential::parse(candidate, CredentialSource::Stored)?;
        self.db.set_setting(CREDENTIAL_KEY, credential.value())?;
        Ok(credential)
    }

    fn clear(&self) -> Result<(), CredentialError> {
        self.db.delete_setting(CREDENTIAL_KEY)?;
        Ok(())
    }
}

/// Resolves the credential to use for a fortune request
pub struct Credentials {
    store: Arc<dyn CredentialStore>,
    session_override: Mutex<Option<Credential>>,
}

impl Credentials {
    /// `initial_override` is typically a key from the environment. One that
    /// fails validation is ignored with a warning.
    pub fn new(store: Arc<dyn CredentialStore>, initial_override: Option<&str>) -> Self {
        let session_override = initial_override.and_then(|candidate| {
            Credential::parse(candidate, CredentialSource::Override)
                .inspect_err(|e| tracing::warn!(error = %e, "Ignoring configured API key"))
                .ok()
        });
        Self {
            store,
            session_override: Mutex::new(session_override),
        }
    }

    fn override_slot(&self) -> MutexGuard<'_, Option<Credential>> {
        self.session_override
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// The credential a request made right now would use
    pub fn current(&self) -> Option<Credential> {
        if let Some(credential) = self.override_slot().clone() {
            return Some(credential);
        }
        match self.store.load() {
            Ok(credential) => credential,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load stored API key");
                None
            }
        }
    }

    /// Accept a user-submitted credential.
    ///
    /// `remember` persists it; otherwise it only lives for this process.
    pub fn submit(&self, candidate: &str, remember: bool) -> Result<Credential, CredentialError> {
        if remember {
            let credential = self.store.save(candidate)?;
            // A remembered key replaces any one-off key
            self.override_slot().take();
            Ok(credential)
        } else {
            let credential = Credential::parse(candidate, CredentialSource::Override)?;
            *self.override_slot() = Some(credential.clone());
            Ok(credential)
        }
    }

    /// Drop a credential the remote service refused.
    ///
    /// Only clears it if it is still the current one, so a key submitted
    /// while the rejected request was in flight survives.
    pub fn reject(&self, used: &Credential) -> Result<(), CredentialError> {
        match used.source() {
            CredentialSource::Override => {
                let mut slot = self.override_slot();
                if slot.as_ref() == Some(used) {
                    *slot = None;
                }
            }
            CredentialSource::Stored => {
                if self.store.load()?.as_ref() == Some(used) {
                    self.store.clear()?;
                }
            }
        }
        Ok(())
    }

    /// Source of the current credential, without exposing its value
    pub fn current_source(&self) -> Option<CredentialSource> {
        self.current().map(|c| c.source())
    }
}
