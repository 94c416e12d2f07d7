//! # Identity Resolution
//!
//! Maps the caller credential the host hands us to a registered
//! [`Organization`]. This is the only authentication the engine performs:
//! request signatures prove that the payload was produced by the
//! organization's signing key, and this module proves that the *caller* is
//! that organization.
//!
//! A credential is reduced to its fingerprint (hex SHA-256 of the raw
//! credential bytes). `addOrganization` records `fingerprint -> orgId` in an
//! [`OrgIdentity`] index entry, so resolution is a single keyed read rather
//! than a scan over every organization.

use tracing::debug;

use crate::crypto::sha256_hex;
use crate::error::{EngineError, EngineResult};
use crate::ledger::{Invocation, StateStore};
use crate::store::{EntityStore, OrgIdentity, Organization};

/// Fingerprint of a raw caller credential.
pub fn credential_fingerprint(credential: &[u8]) -> String {
    sha256_hex(credential)
}

/// The organization the invocation's caller belongs to.
///
/// Fails with `UNRESOLVED_IDENTITY` if the credential is empty or was never
/// registered.
pub fn current_org<S: StateStore + ?Sized>(
    store: &mut EntityStore<'_, S>,
    invocation: &Invocation,
) -> EngineResult<Organization> {
    if invocation.credential().is_empty() {
        return Err(EngineError::UnresolvedIdentity);
    }
    let fingerprint = credential_fingerprint(invocation.credential());
    let identity = store
        .find::<OrgIdentity>(&[&fingerprint])?
        .ok_or(EngineError::UnresolvedIdentity)?;
    let org = store
        .find::<Organization>(&[&identity.org_id])?
        .ok_or(EngineError::UnresolvedIdentity)?;
    debug!(org_id = %org.org_id, "caller identity resolved");
    Ok(org)
}

/// Resolve the caller and require it to be `claimed_org`.
pub fn authorize_org<S: StateStore + ?Sized>(
    store: &mut EntityStore<'_, S>,
    invocation: &Invocation,
    claimed_org: &str,
) -> EngineResult<Organization> {
    let org = current_org(store, invocation)?;
    if org.org_id != claimed_org {
        return Err(EngineError::Unauthorized(format!(
            "caller belongs to organization {:?}, request claims {claimed_org:?}",
            org.org_id
        )));
    }
    Ok(org)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Schema;
    use crate::error::ErrorKind;
    use crate::ledger::{LedgerTx, MemoryLedger};

    fn register(store: &mut EntityStore<'_, LedgerTx<'_, MemoryLedger>>, credential: &[u8], org_id: &str) {
        let fingerprint = credential_fingerprint(credential);
        store
            .put(&Organization {
                org_id: org_id.into(),
                public_key: "pk".into(),
                sign_public_key: "spk".into(),
                network_identity: fingerprint.clone(),
            })
            .unwrap();
        store
            .put(&OrgIdentity {
                network_identity: fingerprint,
                org_id: org_id.into(),
            })
            .unwrap();
    }

    #[test]
    fn test_registered_credential_resolves() {
        let ledger = MemoryLedger::new();
        let mut tx = LedgerTx::begin(&ledger);
        let schema = Schema::default();
        let mut store = EntityStore::new(&mut tx, &schema);
        register(&mut store, b"cert-org1", "org1");

        let org = current_org(&mut store, &Invocation::new(b"cert-org1".to_vec())).unwrap();
        assert_eq!(org.org_id, "org1");
    }

    #[test]
    fn test_unknown_or_empty_credential_unresolved() {
        let ledger = MemoryLedger::new();
        let mut tx = LedgerTx::begin(&ledger);
        let schema = Schema::default();
        let mut store = EntityStore::new(&mut tx, &schema);
        register(&mut store, b"cert-org1", "org1");

        for credential in [b"cert-other".to_vec(), Vec::new()] {
            let err = current_org(&mut store, &Invocation::new(credential)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::UnresolvedIdentity);
        }
    }

    #[test]
    fn test_claiming_another_org_is_unauthorized() {
        let ledger = MemoryLedger::new();
        let mut tx = LedgerTx::begin(&ledger);
        let schema = Schema::default();
        let mut store = EntityStore::new(&mut tx, &schema);
        register(&mut store, b"cert-org1", "org1");
        register(&mut store, b"cert-org2", "org2");

        let err = authorize_org(&mut store, &Invocation::new(b"cert-org1".to_vec()), "org2")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }
}
