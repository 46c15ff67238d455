//! Manufacturer identity registry.

use std::collections::HashMap;

use common::ManufacturerId;
use serde::{Deserialize, Serialize};

use super::{LedgerError, Manufacturer};

/// Maps actor identities to manufacturer profiles.
///
/// Registration happens once per identity; there is no update or
/// deregistration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityRegistry {
    manufacturers: HashMap<ManufacturerId, Manufacturer>,
}

impl IdentityRegistry {
    /// Returns true if `identity` has registered.
    pub fn is_registered(&self, identity: &ManufacturerId) -> bool {
        self.manufacturers.contains_key(identity)
    }

    /// Returns the profile registered for `identity`.
    pub fn get(&self, identity: &ManufacturerId) -> Option<&Manufacturer> {
        self.manufacturers.get(identity)
    }

    /// Returns the number of registered manufacturers.
    pub fn len(&self) -> usize {
        self.manufacturers.len()
    }

    /// Returns true if nobody has registered yet.
    pub fn is_empty(&self) -> bool {
        self.manufacturers.is_empty()
    }

    /// Fails with `AlreadyRegistered` if `identity` has a profile.
    pub fn ensure_unregistered(&self, identity: &ManufacturerId) -> Result<(), LedgerError> {
        if self.is_registered(identity) {
            return Err(LedgerError::AlreadyRegistered {
                identity: identity.clone(),
            });
        }
        Ok(())
    }

    /// Returns the profile for `identity` or fails with `NotRegistered`.
    pub fn require(&self, identity: &ManufacturerId) -> Result<&Manufacturer, LedgerError> {
        self.get(identity).ok_or_else(|| LedgerError::NotRegistered {
            identity: identity.clone(),
        })
    }

    pub(super) fn insert(&mut self, manufacturer: Manufacturer) {
        // First registration wins
        self.manufacturers
            .entry(manufacturer.identity.clone())
            .or_insert(manufacturer);
    }
}
